//! Document table plus the secondary indices kept in lockstep with it
//!
//! Every mutation here updates the table and all indices before it returns,
//! so for every stored document `d` and every index `I`, `d._id` is filed in
//! `I` exactly once under the key derived from `d`.
//!
//! This layer knows nothing about live queries. The engine's collection
//! wraps it and notifies observers after each mutation.

use crate::index::{IndexFields, SecondaryIndex};
use minidoc_core::{DocId, Document, Error, Result, Selector};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome of resolving a selector against the indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates {
    /// No index applies; every document must be scanned
    All,
    /// Only these ids can possibly match (may be empty)
    Ids(Vec<DocId>),
}

/// Outcome of an index declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexDeclaration {
    /// A new index was created and back-filled
    Created(IndexFields),
    /// An index over the same fields already existed and was kept
    AlreadyExists(IndexFields),
}

impl IndexDeclaration {
    /// The declared index identity
    pub fn fields(&self) -> &IndexFields {
        match self {
            IndexDeclaration::Created(f) | IndexDeclaration::AlreadyExists(f) => f,
        }
    }
}

/// Authoritative document table with its secondary indices
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: BTreeMap<DocId, Document>,
    indexes: BTreeMap<IndexFields, SecondaryIndex>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Index declaration
    // ========================================================================

    /// Declare an index over top-level fields and back-fill it.
    ///
    /// Re-declaring the same field set, in any order, keeps the existing index.
    pub fn ensure_index<I, S>(&mut self, fields: I) -> Result<IndexDeclaration>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = IndexFields::new(fields)?;
        if self.indexes.contains_key(&fields) {
            warn!(target: "minidoc::index", index = %fields, "Index is already defined");
            return Ok(IndexDeclaration::AlreadyExists(fields));
        }

        let mut index = SecondaryIndex::new(fields.clone());
        for doc in self.documents.values() {
            index.add(doc);
        }
        debug!(
            target: "minidoc::index",
            index = %fields,
            documents = self.documents.len(),
            keys = index.len(),
            "Index created"
        );
        self.indexes.insert(fields.clone(), index);
        Ok(IndexDeclaration::Created(fields))
    }

    /// Drop an index. Returns false if no such index exists.
    pub fn drop_index(&mut self, fields: &IndexFields) -> bool {
        let dropped = self.indexes.remove(fields).is_some();
        if dropped {
            debug!(target: "minidoc::index", index = %fields, "Index dropped");
        }
        dropped
    }

    /// Declared index identities
    pub fn indexes(&self) -> impl Iterator<Item = &IndexFields> {
        self.indexes.keys()
    }

    /// Look up an index by identity
    pub fn index(&self, fields: &IndexFields) -> Option<&SecondaryIndex> {
        self.indexes.get(fields)
    }

    // ========================================================================
    // Document table
    // ========================================================================

    /// Store a document under its `_id` and file it in every index.
    ///
    /// The document must already carry a string `_id`. Fails without any
    /// state change on a missing, non-string or duplicate id.
    pub fn insert(&mut self, doc: Document) -> Result<DocId> {
        let id = doc
            .checked_id()?
            .ok_or_else(|| Error::InvalidId("document has no _id".to_string()))?;
        if self.documents.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        for index in self.indexes.values_mut() {
            index.add(&doc);
        }
        self.documents.insert(id.clone(), doc);
        Ok(id)
    }

    /// Remove a document from the table and from every index
    pub fn remove(&mut self, id: &DocId) -> Option<Document> {
        let doc = self.documents.remove(id)?;
        for index in self.indexes.values_mut() {
            index.remove(&doc);
        }
        Some(doc)
    }

    /// Replace a stored document, re-filing it where its indexed fields changed.
    ///
    /// Returns the previous version. The replacement must keep the same `_id`.
    pub fn replace(&mut self, id: &DocId, new_doc: Document) -> Result<Document> {
        if new_doc.id().as_ref() != Some(id) {
            return Err(Error::ImmutableId(id.clone()));
        }
        let Some(slot) = self.documents.get_mut(id) else {
            return Err(Error::InvalidOperation(format!(
                "cannot replace missing document '{}'",
                id
            )));
        };
        let old_doc = std::mem::replace(slot, new_doc);
        let new_doc = &self.documents[id];
        for index in self.indexes.values_mut() {
            index.maybe_update(new_doc, &old_doc);
        }
        Ok(old_doc)
    }

    /// Empty the table and every index. Returns the number of documents dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.documents.len();
        self.documents.clear();
        for index in self.indexes.values_mut() {
            index.clear();
        }
        count
    }

    /// Borrow a stored document
    pub fn get(&self, id: &DocId) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Whether an id is stored
    pub fn contains(&self, id: &DocId) -> bool {
        self.documents.contains_key(id)
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over every stored document in id order
    pub fn iter(&self) -> impl Iterator<Item = (&DocId, &Document)> {
        self.documents.iter()
    }

    // ========================================================================
    // Candidate resolution
    // ========================================================================

    /// Narrow the documents a selector could match.
    ///
    /// 1. An exact id lookup, or an `_id` clause naming ids, yields those ids.
    /// 2. Otherwise every covering index contributes its candidates and the
    ///    sets are intersected, keeping the first index's order. An empty
    ///    intersection stops early.
    /// 3. With no covering index the whole table must be scanned.
    pub fn candidates(&self, selector: &Selector) -> Candidates {
        if let Some(id) = selector.exact_id() {
            return Candidates::Ids(vec![id]);
        }
        if let Some(ids) = selector.specific_ids() {
            return Candidates::Ids(ids);
        }

        let mut matched: Option<Vec<DocId>> = None;
        for index in self.indexes.values() {
            if !index.is_selector_covered(selector) {
                continue;
            }
            let Some(ids) = index.matching_ids(selector) else {
                continue;
            };
            let narrowed = match matched {
                None => ids,
                Some(previous) => {
                    let keep: FxHashSet<&DocId> = ids.iter().collect();
                    previous.into_iter().filter(|id| keep.contains(id)).collect()
                }
            };
            if narrowed.is_empty() {
                return Candidates::Ids(narrowed);
            }
            matched = Some(narrowed);
        }
        matched.map_or(Candidates::All, Candidates::Ids)
    }

    /// Documents that could match a selector, in candidate order.
    ///
    /// Ids named by the candidates that are no longer stored are skipped.
    pub fn possibly_matching<'a>(
        &'a self,
        selector: &Selector,
    ) -> Box<dyn Iterator<Item = (&'a DocId, &'a Document)> + 'a> {
        match self.candidates(selector) {
            Candidates::All => Box::new(self.documents.iter()),
            Candidates::Ids(ids) => Box::new(
                ids.into_iter()
                    .filter_map(move |id| self.documents.get_key_value(&id)),
            ),
        }
    }
}
