//! Documents and document identifiers
//!
//! A document is a schema-less map from field name to [`Value`]. Its `_id`
//! is stored as an ordinary field; once a document has been inserted the
//! `_id` is always a string.

use crate::error::{Error, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the identifier field
pub const ID_FIELD: &str = "_id";

/// Unique, string-typed document identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    /// Wrap a string as an id
    pub fn new(id: impl Into<String>) -> Self {
        DocId(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        DocId(s.to_string())
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        DocId(s)
    }
}

/// A schema-less document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document carrying the given id
    pub fn with_id(id: impl Into<DocId>) -> Self {
        let mut doc = Self::new();
        doc.set_id(id.into());
        doc
    }

    /// Builder-style field setter
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build a document from a JSON object
    ///
    /// Fails with `InvalidId` if `_id` is present and not a string, and with
    /// `InvalidOperation` if the JSON is not an object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => {
                let doc = Document {
                    fields: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
                };
                doc.checked_id()?;
                Ok(doc)
            }
            other => Err(Error::InvalidOperation(format!(
                "document must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Convert to a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
                .collect(),
        )
    }

    /// The document's id, if `_id` is present and a string
    pub fn id(&self) -> Option<DocId> {
        match self.fields.get(ID_FIELD) {
            Some(Value::String(s)) => Some(DocId::new(s.clone())),
            _ => None,
        }
    }

    /// The document's id, rejecting a non-string `_id`
    pub fn checked_id(&self) -> Result<Option<DocId>> {
        match self.fields.get(ID_FIELD) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(DocId::new(s.clone()))),
            Some(other) => Err(Error::InvalidId(format!(
                "_id must be a string, got {}",
                other.type_name()
            ))),
        }
    }

    /// Set `_id`
    pub fn set_id(&mut self, id: DocId) {
        self.fields
            .insert(ID_FIELD.to_string(), Value::String(id.0));
    }

    /// Get a top-level field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether a top-level field is present (null counts as present)
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a top-level field, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a top-level field, returning the previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Iterate over fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of fields, `_id` included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}
