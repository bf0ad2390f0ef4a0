//! Record selectors and update patches.

use std::collections::BTreeMap;

use rune_types::{Fields, Record, RecordId, Value, ID_FIELD};

use crate::error::{StoreError, StoreResult};

/// Picks the record an update applies to.
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    /// Exact identifier.
    Id(RecordId),
    /// First record, in stored order, whose fields include all of these.
    Criteria(Fields),
}

impl Selector {
    /// Reject selectors that could never name a single record.
    pub fn validate(&self) -> StoreResult<()> {
        match self {
            Self::Criteria(criteria) if criteria.is_empty() => Err(StoreError::Validation(
                "selector needs an id or at least one criterion".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Id(id) => record.id_str() == Some(id.as_str()),
            Self::Criteria(criteria) => record.matches(criteria),
        }
    }
}

impl From<RecordId> for Selector {
    fn from(id: RecordId) -> Self {
        Self::Id(id)
    }
}

impl From<&RecordId> for Selector {
    fn from(id: &RecordId) -> Self {
        Self::Id(id.clone())
    }
}

impl From<Fields> for Selector {
    fn from(criteria: Fields) -> Self {
        Self::Criteria(criteria)
    }
}

/// What an update does to one field.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// Replace the field wholesale.
    Set(Value),
    /// Append values to the field's list. A missing or non-list field starts
    /// as an empty list.
    Push(Vec<Value>),
    /// Remove every occurrence of each value from the field's list. Does
    /// nothing if the field is not a list.
    Pull(Vec<Value>),
}

/// A set of field changes applied by [`Collection::update`](crate::Collection::update).
///
/// ```
/// use rune_store::Patch;
///
/// let patch = Patch::new()
///     .set("name", "y")
///     .push("tags", ["a", "b"])
///     .pull("tags", ["stale"]);
/// assert_eq!(patch.len(), 2);
/// ```
///
/// Each field carries one change; a later call for the same field replaces
/// the earlier one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    changes: BTreeMap<String, Change>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.change(field, Change::Set(value.into()))
    }

    pub fn push<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.change(field, Change::Push(values.into_iter().map(Into::into).collect()))
    }

    pub fn pull<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.change(field, Change::Pull(values.into_iter().map(Into::into).collect()))
    }

    pub fn change(mut self, field: impl Into<String>, change: Change) -> Self {
        self.changes.insert(field.into(), change);
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.changes.iter()
    }

    /// The identifier field is immutable.
    pub fn validate(&self) -> StoreResult<()> {
        if self.changes.contains_key(ID_FIELD) {
            return Err(StoreError::Validation(format!(
                "{ID_FIELD} cannot be changed by an update"
            )));
        }
        Ok(())
    }

    /// Apply every change to `record`.
    pub fn apply(&self, record: &mut Record) {
        for (field, change) in &self.changes {
            match change {
                Change::Set(value) => {
                    record.insert(field.clone(), value.clone());
                }
                Change::Push(values) => {
                    let slot = record
                        .fields_mut()
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !matches!(slot, Value::Array(_)) {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Some(items) = slot.as_array_mut() {
                        items.extend(values.iter().cloned());
                    }
                }
                Change::Pull(values) => {
                    if let Some(items) = record.get_mut(field).and_then(Value::as_array_mut) {
                        items.retain(|item| !values.contains(item));
                    }
                }
            }
        }
    }
}
