//! minidoc - in-memory document store with secondary indexes and live queries
//!
//! Documents are schema-less maps addressed by a string `_id`. Exact-equality
//! indexes over top-level fields narrow the documents a selector has to
//! examine, and live queries keep their results current as documents are
//! inserted, updated and removed.
//!
//! # Quick Start
//!
//! ```
//! use minidoc::{Collection, FindOptions, Selector};
//! use serde_json::json;
//!
//! let mut people = Collection::new("people");
//! people.ensure_index(["name"])?;
//! people.insert_json(json!({"_id": "1", "name": "one"}))?;
//! people.insert_json(json!({"_id": "2", "name": "two"}))?;
//!
//! let found = people.find(Selector::from_json(json!({"name": "one"}))?, FindOptions::new())?;
//! assert_eq!(found.len(), 1);
//! # Ok::<(), minidoc::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `minidoc-core`: values, documents, selectors, capability traits, errors
//! - `minidoc-storage`: posting sets, secondary indexes, the document table
//! - `minidoc-engine`: queries, live queries, the [`Collection`] facade

pub use minidoc_core::{
    Comparator, Condition, DistanceMap, DocId, Document, Error, FieldPredicate, IdGenerator,
    MatchResult, Matcher, Modifier, Op, Result, Selector, Sorter, Value, ID_FIELD,
};
pub use minidoc_engine::*;
pub use minidoc_storage::{
    Candidates, DocumentStore, IndexDeclaration, IndexFields, IndexKey, KeyComponent,
    KeyedPostingMap, PostingSet, SecondaryIndex,
};
