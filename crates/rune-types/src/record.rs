use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::reference::Reference;
use crate::value::{Fields, Value};

/// Field that carries a record's identifier.
pub const ID_FIELD: &str = "@rune.id";

/// A document stored in a collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Fields,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// The record's identifier, if it has been inserted.
    ///
    /// A value in the id field that does not parse as an identifier counts as
    /// no identifier.
    pub fn id(&self) -> Option<RecordId> {
        self.fields
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| RecordId::parse(s).ok())
    }

    /// Raw identifier string, without parsing.
    pub fn id_str(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn set_id(&mut self, id: &RecordId) {
        self.fields
            .insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Returns `true` if every field in `criteria` is present here with an
    /// equal value.
    ///
    /// A criterion given as a reference's string form matches the stored
    /// reference it spells.
    pub fn matches(&self, criteria: &Fields) -> bool {
        criteria.iter().all(|(key, expected)| {
            self.fields
                .get(key)
                .is_some_and(|actual| criterion_matches(actual, expected))
        })
    }

    /// Build a reference to this record, optionally into a nested field.
    ///
    /// Returns `None` if the record has no identifier yet.
    pub fn make_ref<I, S>(&self, path: I) -> Option<Reference>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id().map(|id| Reference::to_record(id).with_path(path))
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn criterion_matches(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Reference(stored), Value::String(text)) => {
            Reference::parse(text).is_ok_and(|parsed| &parsed == stored)
        }
        _ => actual == expected,
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Map(record.fields)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
