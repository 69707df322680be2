//! Composite index keys and the map that files posting sets under them
//!
//! `Value` cannot be hashed directly (floats, unordered objects), so every
//! indexed field value is normalized into a [`KeyComponent`] first. Two
//! components are equal exactly when the source values are structurally
//! equal, with these normalizations:
//!
//! - `-0.0` and `0.0` share a component; every NaN shares one component
//! - object keys are sorted, so field order never splits a bucket
//! - an absent field is `Missing`, distinct from an explicit `Null`

use crate::posting::PostingSet;
use minidoc_core::{DocId, Document, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// Normalized, hashable form of one field value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyComponent {
    /// Field absent from the document
    Missing,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float by canonical bit pattern
    Float(u64),
    /// String
    String(String),
    /// Bytes
    Bytes(Vec<u8>),
    /// Array, element-wise
    Array(Vec<KeyComponent>),
    /// Object as key-sorted pairs
    Object(Vec<(String, KeyComponent)>),
}

impl KeyComponent {
    /// Normalize a field lookup result
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            None => KeyComponent::Missing,
            Some(v) => Self::from_value(v),
        }
    }

    /// Normalize a present value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeyComponent::Null,
            Value::Bool(b) => KeyComponent::Bool(*b),
            Value::Int(i) => KeyComponent::Int(*i),
            Value::Float(f) => KeyComponent::Float(canonical_float_bits(*f)),
            Value::String(s) => KeyComponent::String(s.clone()),
            Value::Bytes(b) => KeyComponent::Bytes(b.clone()),
            Value::Array(items) => {
                KeyComponent::Array(items.iter().map(Self::from_value).collect())
            }
            Value::Object(map) => {
                let mut pairs: Vec<(String, KeyComponent)> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect();
                pairs.sort_by(|a, b| a.0.cmp(&b.0));
                KeyComponent::Object(pairs)
            }
        }
    }
}

fn canonical_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        CANONICAL_NAN
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

/// Ordered tuple of components, one per indexed field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey(SmallVec<[KeyComponent; 4]>);

impl IndexKey {
    /// Project a document onto the given fields
    pub fn project(doc: &Document, fields: &[String]) -> Self {
        IndexKey(
            fields
                .iter()
                .map(|f| KeyComponent::from_field(doc.get(f)))
                .collect(),
        )
    }

    /// Build a key from components
    pub fn from_components(components: impl IntoIterator<Item = KeyComponent>) -> Self {
        IndexKey(components.into_iter().collect())
    }

    /// Components in field order
    pub fn components(&self) -> &[KeyComponent] {
        &self.0
    }
}

/// Posting sets keyed by structural key equality
#[derive(Debug, Default)]
pub struct KeyedPostingMap {
    buckets: FxHashMap<IndexKey, PostingSet>,
}

impl KeyedPostingMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Posting set under a key
    pub fn get(&self, key: &IndexKey) -> Option<&PostingSet> {
        self.buckets.get(key)
    }

    /// Whether a bucket exists for the key
    pub fn has(&self, key: &IndexKey) -> bool {
        self.buckets.contains_key(key)
    }

    /// File an id under a key, creating the bucket on first use
    pub fn insert(&mut self, key: IndexKey, id: DocId) -> bool {
        self.buckets.entry(key).or_default().add(id)
    }

    /// Remove an id from a key's bucket.
    ///
    /// Returns false if the bucket does not exist or does not hold the id.
    /// Empty buckets are dropped rather than left as tombstones.
    pub fn remove(&mut self, key: &IndexKey, id: &DocId) -> bool {
        let Some(set) = self.buckets.get_mut(key) else {
            return false;
        };
        let removed = set.remove(id);
        if set.is_empty() {
            self.buckets.remove(key);
        }
        removed
    }

    /// Iterate buckets in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &PostingSet)> {
        self.buckets.iter()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no key holds any id
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop every bucket
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
