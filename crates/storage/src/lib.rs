//! Storage layer for minidoc
//!
//! This crate implements the document table and its secondary indices:
//! - PostingSet: insertion-ordered id set for one composite key
//! - IndexKey / KeyedPostingMap: structural-equality keyed posting sets
//! - SecondaryIndex: exact-equality index over top-level fields
//! - DocumentStore: document table, index registry, candidate resolution
//!
//! All structures assume single-threaded mutation; callers serialize access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod key;
pub mod posting;
pub mod store;

pub use index::{IndexFields, SecondaryIndex};
pub use key::{IndexKey, KeyComponent, KeyedPostingMap};
pub use posting::PostingSet;
pub use store::{Candidates, DocumentStore, IndexDeclaration};
