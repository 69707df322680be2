//! Selectors: conjunctions of per-field predicates
//!
//! A selector is parsed once into a closed set of predicate shapes so that
//! index coverage never has to sniff operator prefixes at lookup time:
//!
//! - `Exact(value)`: a scalar, null, array, or object without `$` keys
//! - `Operator(conditions)`: an object whose keys are all `$` operators
//! - `Unsupported(reason)`: an object mixing operator and plain keys

use crate::document::{DocId, ID_FIELD};
use crate::error::{Error, Result};
use crate::value::Value;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Comparison operator inside an operator object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// `$eq`
    Eq,
    /// `$ne`
    Ne,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$in`
    In,
    /// `$nin`
    Nin,
    /// `$exists`
    Exists,
    /// Any other `$`-prefixed operator, kept by name
    Other(String),
}

impl Op {
    /// Parse an operator key (with its `$` prefix)
    pub fn parse(key: &str) -> Op {
        match key {
            "$eq" => Op::Eq,
            "$ne" => Op::Ne,
            "$gt" => Op::Gt,
            "$gte" => Op::Gte,
            "$lt" => Op::Lt,
            "$lte" => Op::Lte,
            "$in" => Op::In,
            "$nin" => Op::Nin,
            "$exists" => Op::Exists,
            other => Op::Other(other.to_string()),
        }
    }
}

/// One `operator: argument` pair
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The operator
    pub op: Op,
    /// Its argument
    pub arg: Value,
}

/// What a selector demands of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPredicate {
    /// Field must equal this value (null also matches an absent field)
    Exact(Value),
    /// Field must satisfy every condition
    Operator(Vec<Condition>),
    /// Malformed predicate; never matches and never uses an index
    Unsupported(String),
}

impl FieldPredicate {
    /// Classify a raw selector value
    pub fn classify(value: Value) -> FieldPredicate {
        let Value::Object(map) = value else {
            return FieldPredicate::Exact(value);
        };
        let operators = map.keys().filter(|k| k.starts_with('$')).count();
        if operators == 0 {
            FieldPredicate::Exact(Value::Object(map))
        } else if operators == map.len() {
            // HashMap order is arbitrary; keep predicates deterministic
            let mut pairs: Vec<(String, Value)> = map.into_iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            FieldPredicate::Operator(
                pairs
                    .into_iter()
                    .map(|(k, arg)| Condition {
                        op: Op::parse(&k),
                        arg,
                    })
                    .collect(),
            )
        } else {
            FieldPredicate::Unsupported("operator and plain keys mixed in one object".to_string())
        }
    }

    /// Whether an index can look this predicate up by exact key.
    ///
    /// True for scalars, null, arrays and non-empty operator-free objects.
    pub fn is_directly_comparable(&self) -> bool {
        match self {
            FieldPredicate::Exact(Value::Object(map)) => !map.is_empty(),
            FieldPredicate::Exact(_) => true,
            FieldPredicate::Operator(_) | FieldPredicate::Unsupported(_) => false,
        }
    }
}

/// A conjunction of field predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    clauses: BTreeMap<String, FieldPredicate>,
}

impl Selector {
    /// The empty selector, matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Exact lookup by id
    pub fn id(id: impl Into<DocId>) -> Self {
        let id: DocId = id.into();
        Self::all().eq(ID_FIELD, id.as_str())
    }

    /// Add an exact-equality clause
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses
            .insert(field.into(), FieldPredicate::Exact(value.into()));
        self
    }

    /// Add a single-operator clause, merging with existing operators on the field
    pub fn op(mut self, field: impl Into<String>, op: Op, arg: impl Into<Value>) -> Self {
        let condition = Condition {
            op,
            arg: arg.into(),
        };
        match self.clauses.entry(field.into()) {
            std::collections::btree_map::Entry::Occupied(mut e) => match e.get_mut() {
                FieldPredicate::Operator(conditions) => conditions.push(condition),
                other => *other = FieldPredicate::Operator(vec![condition]),
            },
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(FieldPredicate::Operator(vec![condition]));
            }
        }
        self
    }

    /// Add an already classified predicate
    pub fn with(mut self, field: impl Into<String>, predicate: FieldPredicate) -> Self {
        self.clauses.insert(field.into(), predicate);
        self
    }

    /// Parse a JSON selector.
    ///
    /// A bare string is an id lookup. Objects map field names to predicates;
    /// top-level `$` keys (logical operators) are rejected.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::String(id) => Ok(Selector::id(id)),
            serde_json::Value::Object(map) => {
                let mut selector = Selector::all();
                for (field, value) in map {
                    if field.starts_with('$') {
                        return Err(Error::invalid_selector(format!(
                            "top-level operator '{}' is not supported",
                            field
                        )));
                    }
                    let predicate = FieldPredicate::classify(Value::from(value));
                    selector.clauses.insert(field, predicate);
                }
                Ok(selector)
            }
            other => Err(Error::invalid_selector(format!(
                "selector must be an object or an id string, got {}",
                other
            ))),
        }
    }

    /// Predicate for a field, if the selector constrains it
    pub fn get(&self, field: &str) -> Option<&FieldPredicate> {
        self.clauses.get(field)
    }

    /// Iterate over clauses in field-name order
    pub fn clauses(&self) -> impl Iterator<Item = (&String, &FieldPredicate)> {
        self.clauses.iter()
    }

    /// Whether the selector matches everything
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The id when the selector is nothing but `{_id: "<string>"}`
    pub fn exact_id(&self) -> Option<DocId> {
        if self.clauses.len() != 1 {
            return None;
        }
        match self.clauses.get(ID_FIELD) {
            Some(FieldPredicate::Exact(Value::String(id))) => Some(DocId::new(id.clone())),
            _ => None,
        }
    }

    /// Ids the selector pins down through its `_id` clause.
    ///
    /// Returns `Some` for `_id: "<string>"` and for `_id: {$in: [strings]}`,
    /// whatever the other clauses are. Callers still confirm each document.
    /// Repeated ids are reported once, at their first position.
    pub fn specific_ids(&self) -> Option<Vec<DocId>> {
        match self.clauses.get(ID_FIELD)? {
            FieldPredicate::Exact(Value::String(id)) => Some(vec![DocId::new(id.clone())]),
            FieldPredicate::Operator(conditions) if conditions.len() == 1 => {
                let condition = &conditions[0];
                match (&condition.op, &condition.arg) {
                    (Op::In, Value::Array(items)) => {
                        let mut seen = FxHashSet::default();
                        let mut ids = Vec::with_capacity(items.len());
                        for item in items {
                            let id = item.as_str()?;
                            if seen.insert(id) {
                                ids.push(DocId::from(id));
                            }
                        }
                        Some(ids)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
