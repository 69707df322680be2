//! Field sort specifications
//!
//! A [`SortSpec`] lists `(field, direction)` pairs. [`FieldSorter`] turns it
//! into a comparator using [`Value::sort_cmp`]; an absent field sorts like
//! null. When the query reports per-document distances they are the
//! primary key, ascending, before any field.

use minidoc_core::{Comparator, DistanceMap, Document, Error, Result, Sorter, Value};
use std::cmp::Ordering;

/// Sort direction for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    keys: Vec<(String, Direction)>,
}

impl SortSpec {
    /// An empty spec (only distances, if any, order the results)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ascending key
    pub fn asc(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), Direction::Ascending));
        self
    }

    /// Append a descending key
    pub fn desc(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), Direction::Descending));
        self
    }

    /// Parse `{"field": 1, "other": -1}`. JSON object order is not kept by
    /// `serde_json` without `preserve_order`, so use an array of pairs
    /// (`[["field", 1], ["other", -1]]`) when key order matters.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let mut spec = SortSpec::new();
        match json {
            serde_json::Value::Object(map) => {
                for (field, dir) in map {
                    spec.keys.push((field, parse_direction(&dir)?));
                }
            }
            serde_json::Value::Array(pairs) => {
                for pair in pairs {
                    let items = pair.as_array().filter(|p| p.len() == 2).ok_or_else(|| {
                        Error::invalid_query("sort pairs must be [field, direction]")
                    })?;
                    let field = items[0]
                        .as_str()
                        .ok_or_else(|| Error::invalid_query("sort field must be a string"))?;
                    spec.keys.push((field.to_string(), parse_direction(&items[1])?));
                }
            }
            other => {
                return Err(Error::invalid_query(format!(
                    "sort spec must be an object or array, got {}",
                    other
                )))
            }
        }
        Ok(spec)
    }

    /// Keys in priority order
    pub fn keys(&self) -> &[(String, Direction)] {
        &self.keys
    }

    /// Whether the spec has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn parse_direction(json: &serde_json::Value) -> Result<Direction> {
    match json.as_i64() {
        Some(1) => Ok(Direction::Ascending),
        Some(-1) => Ok(Direction::Descending),
        _ => Err(Error::invalid_query(format!(
            "sort direction must be 1 or -1, got {}",
            json
        ))),
    }
}

/// Sorter over a [`SortSpec`]
#[derive(Debug, Clone, Default)]
pub struct FieldSorter {
    spec: SortSpec,
}

impl FieldSorter {
    /// Build a sorter
    pub fn new(spec: SortSpec) -> Self {
        Self { spec }
    }

    /// The underlying spec
    pub fn spec(&self) -> &SortSpec {
        &self.spec
    }

    fn compare_fields(&self, a: &Document, b: &Document) -> Ordering {
        for (field, direction) in &self.spec.keys {
            let left = a.get(field).unwrap_or(&Value::Null);
            let right = b.get(field).unwrap_or(&Value::Null);
            let ord = match direction {
                Direction::Ascending => left.sort_cmp(right),
                Direction::Descending => right.sort_cmp(left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn distance_of(distances: &DistanceMap, doc: &Document) -> f64 {
    doc.id()
        .and_then(|id| distances.get(&id).copied())
        .unwrap_or(f64::INFINITY)
}

impl Sorter for FieldSorter {
    fn comparator<'a>(&'a self, distances: Option<&'a DistanceMap>) -> Comparator<'a> {
        match distances {
            Some(distances) => Box::new(move |a: &Document, b: &Document| {
                distance_of(distances, a)
                    .total_cmp(&distance_of(distances, b))
                    .then_with(|| self.compare_fields(a, b))
            }),
            None => Box::new(move |a: &Document, b: &Document| self.compare_fields(a, b)),
        }
    }
}
