//! Update specifications
//!
//! [`UpdateSpec`] is the default [`Modifier`]: either a whole replacement
//! document or a list of field operations (`$set`, `$unset`, `$inc`) on
//! top-level fields. Neither form may change `_id`.

use minidoc_core::{DocId, Document, Error, Modifier, Result, Value, ID_FIELD};

/// One field operation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Set a field to a value
    Set(String, Value),
    /// Remove a field
    Unset(String),
    /// Add a number to a numeric field (absent counts as zero)
    Inc(String, Value),
}

impl FieldUpdate {
    fn field(&self) -> &str {
        match self {
            FieldUpdate::Set(f, _) | FieldUpdate::Unset(f) | FieldUpdate::Inc(f, _) => f,
        }
    }
}

/// Default modifier
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSpec {
    /// Replace every field except `_id`
    Replace(Document),
    /// Apply operations in order
    Operations(Vec<FieldUpdate>),
}

impl UpdateSpec {
    /// Empty operation list
    pub fn operations() -> Self {
        UpdateSpec::Operations(Vec::new())
    }

    /// Append `$set`
    pub fn set(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(FieldUpdate::Set(field.into(), value.into()))
    }

    /// Append `$unset`
    pub fn unset(self, field: impl Into<String>) -> Self {
        self.push(FieldUpdate::Unset(field.into()))
    }

    /// Append `$inc`
    pub fn inc(self, field: impl Into<String>, by: impl Into<Value>) -> Self {
        self.push(FieldUpdate::Inc(field.into(), by.into()))
    }

    fn push(self, update: FieldUpdate) -> Self {
        match self {
            UpdateSpec::Operations(mut ops) => {
                ops.push(update);
                UpdateSpec::Operations(ops)
            }
            UpdateSpec::Replace(_) => UpdateSpec::Operations(vec![update]),
        }
    }

    /// Parse a modifier document.
    ///
    /// An object whose keys all start with `$` is an operation list; an
    /// object with no `$` keys is a replacement. Mixing the two, unknown
    /// operators, dotted fields, and non-numeric `$inc` amounts are
    /// rejected.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(Error::invalid_modifier("modifier must be an object"));
        };
        let operator_keys = map.keys().filter(|k| k.starts_with('$')).count();
        if operator_keys == 0 {
            let doc = Document::from_json(serde_json::Value::Object(map))?;
            return Ok(UpdateSpec::Replace(doc));
        }
        if operator_keys != map.len() {
            return Err(Error::invalid_modifier(
                "cannot mix update operators and replacement fields",
            ));
        }

        let mut ops = Vec::new();
        for (operator, args) in map {
            let serde_json::Value::Object(fields) = args else {
                return Err(Error::invalid_modifier(format!(
                    "{} needs an object of fields",
                    operator
                )));
            };
            for (field, arg) in fields {
                let value = Value::from(arg);
                let update = match operator.as_str() {
                    "$set" => FieldUpdate::Set(field, value),
                    "$unset" => FieldUpdate::Unset(field),
                    "$inc" => {
                        if !value.is_number() {
                            return Err(Error::invalid_modifier(format!(
                                "$inc amount for '{}' must be a number",
                                field
                            )));
                        }
                        FieldUpdate::Inc(field, value)
                    }
                    other => {
                        return Err(Error::invalid_modifier(format!(
                            "unsupported update operator '{}'",
                            other
                        )))
                    }
                };
                ops.push(update);
            }
        }
        Ok(UpdateSpec::Operations(ops))
    }
}

impl Modifier for UpdateSpec {
    fn apply(&self, doc: &mut Document) -> Result<()> {
        let id = doc.id();
        match self {
            UpdateSpec::Replace(replacement) => {
                if let (Some(new_id), Some(current)) = (replacement.id(), &id) {
                    if &new_id != current {
                        return Err(Error::ImmutableId(current.clone()));
                    }
                }
                let mut next = replacement.clone();
                if let Some(current) = id {
                    next.set_id(current);
                }
                *doc = next;
            }
            UpdateSpec::Operations(ops) => {
                for op in ops {
                    apply_field_update(doc, op, id.as_ref())?;
                }
            }
        }
        Ok(())
    }
}

fn apply_field_update(doc: &mut Document, op: &FieldUpdate, id: Option<&DocId>) -> Result<()> {
    let field = op.field();
    if field.contains('.') || field.is_empty() {
        return Err(Error::invalid_modifier(format!(
            "only top-level fields can be updated, got '{}'",
            field
        )));
    }
    if field == ID_FIELD {
        if let Some(id) = id {
            let keeps_id = matches!(op, FieldUpdate::Set(_, Value::String(s)) if s == id.as_str());
            if !keeps_id {
                return Err(Error::ImmutableId(id.clone()));
            }
        }
    }

    match op {
        FieldUpdate::Set(field, value) => {
            doc.set(field.clone(), value.clone());
        }
        FieldUpdate::Unset(field) => {
            doc.remove(field);
        }
        FieldUpdate::Inc(field, by) => {
            if !by.is_number() {
                return Err(Error::invalid_modifier(format!(
                    "$inc amount for '{}' must be a number",
                    field
                )));
            }
            let next = match doc.get(field) {
                None => by.clone(),
                Some(current) => add_numbers(current, by).ok_or_else(|| {
                    Error::invalid_modifier(format!(
                        "cannot $inc non-numeric field '{}' ({})",
                        field,
                        current.type_name()
                    ))
                })?,
            };
            doc.set(field.clone(), next);
        }
    }
    Ok(())
}

fn add_numbers(current: &Value, by: &Value) -> Option<Value> {
    match (current, by) {
        (Value::Int(a), Value::Int(b)) => Some(
            a.checked_add(*b)
                .map_or_else(|| Value::Float(*a as f64 + *b as f64), Value::Int),
        ),
        _ => Some(Value::Float(current.as_f64()? + by.as_f64()?)),
    }
}
