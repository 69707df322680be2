//! Default selector matcher
//!
//! Evaluates the predicate shapes a [`Selector`] can hold against top-level
//! fields. Equality is `Value` equality; arrays are compared whole, not
//! element by element, which keeps the matcher consistent with what the
//! exact-equality indices file. `field: null` matches a null or absent
//! field.
//!
//! Callers needing richer semantics (geo, regex, array membership) plug in
//! their own [`Matcher`].

use minidoc_core::{
    Condition, Document, Error, FieldPredicate, MatchResult, Matcher, Op, Result, Selector, Value,
};
use std::cmp::Ordering;

/// Matcher for the operators a parsed [`Selector`] supports
#[derive(Debug, Clone)]
pub struct SelectorMatcher {
    selector: Selector,
}

impl SelectorMatcher {
    /// Validate a selector and build its matcher.
    ///
    /// Rejects malformed predicates, unknown operators, and `$in`/`$nin`
    /// arguments that are not arrays.
    pub fn new(selector: Selector) -> Result<Self> {
        for (field, predicate) in selector.clauses() {
            match predicate {
                FieldPredicate::Exact(_) => {}
                FieldPredicate::Unsupported(reason) => {
                    return Err(Error::invalid_selector(format!("{}: {}", field, reason)));
                }
                FieldPredicate::Operator(conditions) => {
                    for condition in conditions {
                        validate_condition(field, condition)?;
                    }
                }
            }
        }
        Ok(Self { selector })
    }

    /// Matcher accepting every document
    pub fn all() -> Self {
        Self {
            selector: Selector::all(),
        }
    }
}

fn validate_condition(field: &str, condition: &Condition) -> Result<()> {
    match (&condition.op, &condition.arg) {
        (Op::Other(name), _) => Err(Error::invalid_selector(format!(
            "{}: unsupported operator '{}'",
            field, name
        ))),
        (Op::In | Op::Nin, Value::Array(_)) => Ok(()),
        (Op::In | Op::Nin, _) => Err(Error::invalid_selector(format!(
            "{}: $in/$nin need an array",
            field
        ))),
        _ => Ok(()),
    }
}

impl Matcher for SelectorMatcher {
    fn document_matches(&self, doc: &Document) -> MatchResult {
        let matched = self
            .selector
            .clauses()
            .all(|(field, predicate)| predicate_matches(predicate, doc.get(field)));
        MatchResult::from_bool(matched)
    }

    fn selector(&self) -> &Selector {
        &self.selector
    }
}

fn predicate_matches(predicate: &FieldPredicate, field: Option<&Value>) -> bool {
    match predicate {
        FieldPredicate::Exact(expected) => equals(expected, field),
        FieldPredicate::Operator(conditions) => {
            conditions.iter().all(|c| condition_matches(c, field))
        }
        FieldPredicate::Unsupported(_) => false,
    }
}

/// Equality where a null expectation also accepts an absent field
fn equals(expected: &Value, field: Option<&Value>) -> bool {
    match field {
        None => expected.is_null(),
        Some(actual) => actual == expected,
    }
}

fn condition_matches(condition: &Condition, field: Option<&Value>) -> bool {
    let arg = &condition.arg;
    match &condition.op {
        Op::Eq => equals(arg, field),
        Op::Ne => !equals(arg, field),
        Op::Gt => compare(field, arg).map_or(false, |o| o == Ordering::Greater),
        Op::Gte => compare(field, arg).map_or(false, |o| o != Ordering::Less),
        Op::Lt => compare(field, arg).map_or(false, |o| o == Ordering::Less),
        Op::Lte => compare(field, arg).map_or(false, |o| o != Ordering::Greater),
        Op::In => in_list(arg, field),
        Op::Nin => !in_list(arg, field),
        Op::Exists => {
            let wanted = !matches!(arg, Value::Bool(false) | Value::Null);
            field.is_some() == wanted
        }
        Op::Other(_) => false,
    }
}

fn in_list(list: &Value, field: Option<&Value>) -> bool {
    list.as_array()
        .map_or(false, |items| items.iter().any(|item| equals(item, field)))
}

/// Range comparison only between values of the same kind
fn compare(field: Option<&Value>, arg: &Value) -> Option<Ordering> {
    let actual = field?;
    let comparable = (actual.is_number() && arg.is_number())
        || actual.type_name() == arg.type_name();
    if !comparable || actual.is_null() {
        return None;
    }
    Some(actual.sort_cmp(arg))
}
