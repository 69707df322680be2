//! Secondary indices over top-level document fields
//!
//! A [`SecondaryIndex`] maps the projection of a document onto its indexed
//! fields to the set of ids sharing that projection. It only answers exact
//! equality lookups; anything else falls back to a scan.
//!
//! Lookups are candidate sets. Callers must still confirm every id with the
//! full matcher.
//!
//! # Null and absent fields
//!
//! Stored keys keep an absent field (`Missing`) apart from an explicit null.
//! A selector asking for `field: null` means "null or absent", so the lookup
//! expands that component to both buckets.

use crate::key::{IndexKey, KeyComponent, KeyedPostingMap};
use minidoc_core::{DocId, Document, Error, FieldPredicate, Result, Selector, Value};
use rustc_hash::FxHashSet;
use std::fmt;
use tracing::warn;

/// Canonical field list identifying an index
///
/// Sorted and de-duplicated, so `["b", "a"]` and `["a", "b", "a"]` name the
/// same index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexFields(Vec<String>);

impl IndexFields {
    /// Canonicalize and validate a field list.
    ///
    /// Only non-empty top-level field names are accepted: no `.` path
    /// separators and no leading `$`.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(Error::UnsupportedIndexField(
                "an index needs at least one field".to_string(),
            ));
        }
        for field in &fields {
            if field.is_empty() {
                return Err(Error::UnsupportedIndexField(
                    "empty field name".to_string(),
                ));
            }
            if field.contains('.') {
                return Err(Error::UnsupportedIndexField(format!(
                    "'{}': path-qualified fields cannot be indexed",
                    field
                )));
            }
            if field.starts_with('$') {
                return Err(Error::UnsupportedIndexField(format!(
                    "'{}': operator names cannot be indexed",
                    field
                )));
            }
        }
        fields.sort();
        fields.dedup();
        Ok(IndexFields(fields))
    }

    /// Fields in canonical order
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for IndexFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("_"))
    }
}

/// Exact-equality index over one or more top-level fields
#[derive(Debug)]
pub struct SecondaryIndex {
    fields: IndexFields,
    postings: KeyedPostingMap,
}

impl SecondaryIndex {
    /// Create an empty index
    pub fn new(fields: IndexFields) -> Self {
        Self {
            fields,
            postings: KeyedPostingMap::new(),
        }
    }

    /// The index identity
    pub fn fields(&self) -> &IndexFields {
        &self.fields
    }

    /// Composite key of a document
    pub fn key_for(&self, doc: &Document) -> IndexKey {
        IndexKey::project(doc, self.fields.as_slice())
    }

    /// File a document under its key.
    ///
    /// Documents without an id are ignored. Returns whether a posting was added.
    pub fn add(&mut self, doc: &Document) -> bool {
        let Some(id) = doc.id() else {
            return false;
        };
        let key = self.key_for(doc);
        self.postings.insert(key, id)
    }

    /// Remove a document's posting.
    ///
    /// Returns false, and logs, when the document has no id or is not filed
    /// under the key its current fields produce. The caller carries on either
    /// way.
    pub fn remove(&mut self, doc: &Document) -> bool {
        let Some(id) = doc.id() else {
            return false;
        };
        let key = self.key_for(doc);
        if self.postings.remove(&key, &id) {
            return true;
        }
        warn!(
            target: "minidoc::index",
            index = %self.fields,
            id = %id,
            "Document to remove is not in index"
        );
        false
    }

    /// Re-file a document whose fields changed.
    ///
    /// Nothing happens when the key is unchanged. Otherwise the old posting
    /// is removed, and the new one is added only if that removal succeeded,
    /// so the index never gains a posting for a document it did not hold.
    pub fn maybe_update(&mut self, new_doc: &Document, old_doc: &Document) {
        let old_key = self.key_for(old_doc);
        let new_key = self.key_for(new_doc);
        if old_key == new_key {
            return;
        }
        if self.remove(old_doc) {
            self.add(new_doc);
        }
    }

    /// Whether the index can prune candidates for this selector.
    ///
    /// Every indexed field must be present and directly comparable
    /// (scalar, null, array or non-empty operator-free object).
    pub fn is_selector_covered(&self, selector: &Selector) -> bool {
        self.fields.as_slice().iter().all(|field| {
            selector
                .get(field)
                .map_or(false, FieldPredicate::is_directly_comparable)
        })
    }

    /// Candidate ids for a covered selector.
    ///
    /// Returns `None` when the selector is not covered. Ids come bucket by
    /// bucket in each bucket's insertion order; with null components the
    /// `Null` bucket is visited before the `Missing` one.
    pub fn matching_ids(&self, selector: &Selector) -> Option<Vec<DocId>> {
        let mut alternatives: Vec<Vec<KeyComponent>> = Vec::with_capacity(self.fields.0.len());
        for field in self.fields.as_slice() {
            let predicate = selector.get(field)?;
            if !predicate.is_directly_comparable() {
                return None;
            }
            match predicate {
                FieldPredicate::Exact(Value::Null) => {
                    alternatives.push(vec![KeyComponent::Null, KeyComponent::Missing]);
                }
                FieldPredicate::Exact(value) => {
                    alternatives.push(vec![KeyComponent::from_value(value)]);
                }
                _ => return None,
            }
        }

        let mut ids = Vec::new();
        let mut seen = FxHashSet::default();
        for key in cartesian_keys(&alternatives) {
            if let Some(set) = self.postings.get(&key) {
                for id in set.iter() {
                    if seen.insert(id) {
                        ids.push(id.clone());
                    }
                }
            }
        }
        Some(ids)
    }

    /// Whether the document is filed under its current key
    pub fn contains(&self, doc: &Document) -> bool {
        match doc.id() {
            Some(id) => self
                .postings
                .get(&self.key_for(doc))
                .map_or(false, |set| set.contains(&id)),
            None => false,
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Whether the index holds no postings
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Total number of postings across all keys
    pub fn posting_count(&self) -> usize {
        self.postings.iter().map(|(_, set)| set.len()).sum()
    }

    /// Drop every posting
    pub fn clear(&mut self) {
        self.postings.clear();
    }
}

/// Expand per-field alternatives into every composite key
fn cartesian_keys(alternatives: &[Vec<KeyComponent>]) -> Vec<IndexKey> {
    let mut keys: Vec<Vec<KeyComponent>> = vec![Vec::with_capacity(alternatives.len())];
    for options in alternatives {
        let mut next = Vec::with_capacity(keys.len() * options.len());
        for prefix in &keys {
            for option in options {
                let mut key = prefix.clone();
                key.push(option.clone());
                next.push(key);
            }
        }
        keys = next;
    }
    keys.into_iter().map(IndexKey::from_components).collect()
}
