//! Core types and traits for minidoc
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: closed enum of field values
//! - DocId / Document: schema-less documents addressed by a string id
//! - Selector / FieldPredicate: parsed partial-match selectors
//! - Traits: Matcher, Sorter, IdGenerator, Modifier capability seams
//! - Error: error type and Result alias

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod selector;
pub mod traits;
pub mod value;

pub use document::{DocId, Document, ID_FIELD};
pub use error::{Error, Result};
pub use selector::{Condition, FieldPredicate, Op, Selector};
pub use traits::{
    Comparator, DistanceMap, IdGenerator, MatchResult, Matcher, Modifier, Sorter,
};
pub use value::Value;
