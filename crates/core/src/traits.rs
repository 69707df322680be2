//! Capability traits consumed by the store and the live-query engine
//!
//! The core never interprets operator syntax or sort specifications on
//! its own. It talks to them through these seams:
//!
//! - [`Matcher`]: confirms whether a document satisfies a selector
//! - [`Sorter`]: orders documents, optionally by per-document distance
//! - [`IdGenerator`]: mints ids for documents inserted without one
//! - [`Modifier`]: rewrites a document during `update`

use crate::document::{DocId, Document};
use crate::error::Result;
use crate::selector::Selector;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-document sort keys reported by geo-style matchers
pub type DistanceMap = HashMap<DocId, f64>;

/// Outcome of matching one document
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MatchResult {
    /// Whether the document satisfies the selector
    pub matched: bool,
    /// Distance used as a sort key, when the selector carries one
    pub distance: Option<f64>,
}

impl MatchResult {
    /// A plain match without a distance
    pub fn hit() -> Self {
        MatchResult {
            matched: true,
            distance: None,
        }
    }

    /// A non-match
    pub fn miss() -> Self {
        MatchResult::default()
    }

    /// A match carrying a distance sort key
    pub fn at_distance(distance: f64) -> Self {
        MatchResult {
            matched: true,
            distance: Some(distance),
        }
    }

    /// Build from a boolean
    pub fn from_bool(matched: bool) -> Self {
        MatchResult {
            matched,
            distance: None,
        }
    }
}

/// Confirms candidate documents against a selector
pub trait Matcher: Send + Sync {
    /// Evaluate the selector against a document
    fn document_matches(&self, doc: &Document) -> MatchResult;

    /// The selector this matcher evaluates, used for index pruning
    fn selector(&self) -> &Selector;

    /// Id when the selector is a direct id lookup
    fn exact_id(&self) -> Option<DocId> {
        self.selector().exact_id()
    }

    /// Whether matching produces distances that ordered queries must record
    fn has_geo_query(&self) -> bool {
        false
    }
}

/// Boxed comparison function produced by a [`Sorter`]
pub type Comparator<'a> = Box<dyn Fn(&Document, &Document) -> Ordering + 'a>;

/// Produces comparators for ordered queries
pub trait Sorter: Send + Sync {
    /// Build a comparator; `distances` is present for geo-style queries
    fn comparator<'a>(&'a self, distances: Option<&'a DistanceMap>) -> Comparator<'a>;
}

/// Mints fresh, unique document ids
pub trait IdGenerator: Send {
    /// Produce the next id
    fn next_id(&mut self) -> DocId;
}

/// Rewrites a document in place during an update
pub trait Modifier {
    /// Apply the modification. Must leave `_id` untouched.
    fn apply(&self, doc: &mut Document) -> Result<()>;
}

impl<F> Modifier for F
where
    F: Fn(&mut Document) -> Result<()>,
{
    fn apply(&self, doc: &mut Document) -> Result<()> {
        self(doc)
    }
}
