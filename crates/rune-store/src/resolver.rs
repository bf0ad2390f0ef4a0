//! Reference resolution.
//!
//! A reference field is replaced by what it points at: the whole target
//! record (itself resolved), or the value at a path inside it. Arrays are
//! resolved element by element; nested maps are left as stored.
//!
//! Three guards keep resolution finite:
//! - when a target is the record whose field led here (A -> B -> A), the
//!   stored form of that record is reused instead of resolving it again;
//! - past `max_reference_depth` hops a reference is left unresolved;
//! - each top-level record may follow at most `max_reference_expansions`
//!   references; the rest are left unresolved.

use std::collections::HashMap;

use rune_types::{Record, Reference, Value};
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::store::Store;

/// One resolution pass. Collections are read at most once per pass.
pub(crate) struct Resolver<'s> {
    store: &'s Store,
    max_depth: usize,
    max_expansions: usize,
    /// Expansions left for the record currently being resolved.
    budget: usize,
    /// Set when a limit left a reference unresolved during this record.
    truncated: bool,
    tables: HashMap<String, Vec<Record>>,
}

impl<'s> Resolver<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        let config = store.config();
        Self {
            store,
            max_depth: config.max_reference_depth,
            max_expansions: config.max_reference_expansions,
            budget: config.max_reference_expansions,
            truncated: false,
            tables: HashMap::new(),
        }
    }

    /// Seed the pass with records already in hand.
    pub(crate) fn with_table(mut self, collection: &str, records: Vec<Record>) -> Self {
        self.tables.insert(collection.to_string(), records);
        self
    }

    pub(crate) fn resolve(&mut self, record: Record) -> StoreResult<Record> {
        self.budget = self.max_expansions;
        self.truncated = false;
        let resolved = self.resolve_record(record, None, 0)?;
        if self.truncated {
            warn!(
                id = ?resolved.id_str(),
                max_depth = self.max_depth,
                max_expansions = self.max_expansions,
                "reference limits reached; some references left unresolved"
            );
        }
        Ok(resolved)
    }

    pub(crate) fn resolve_all(&mut self, records: Vec<Record>) -> StoreResult<Vec<Record>> {
        records.into_iter().map(|r| self.resolve(r)).collect()
    }

    pub(crate) fn find_ref(&mut self, reference: &Reference) -> StoreResult<Option<Value>> {
        let Some(target) = self.lookup(reference)? else {
            return Ok(None);
        };
        let resolved = Value::from(self.resolve(target)?);
        Ok(follow_path(resolved, &reference.path))
    }

    fn resolve_record(
        &mut self,
        record: Record,
        parent: Option<&Record>,
        depth: usize,
    ) -> StoreResult<Record> {
        let stored = record.clone();
        let mut fields = record.into_fields();
        for value in fields.values_mut() {
            let taken = std::mem::take(value);
            *value = self.resolve_value(taken, &stored, parent, depth)?;
        }
        Ok(Record::from_fields(fields))
    }

    fn resolve_value(
        &mut self,
        value: Value,
        current: &Record,
        parent: Option<&Record>,
        depth: usize,
    ) -> StoreResult<Value> {
        match value {
            Value::Reference(reference) => self.dereference(reference, current, parent, depth),
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.resolve_value(item, current, parent, depth))
                .collect::<StoreResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other),
        }
    }

    fn dereference(
        &mut self,
        reference: Reference,
        current: &Record,
        parent: Option<&Record>,
        depth: usize,
    ) -> StoreResult<Value> {
        if depth >= self.max_depth || self.budget == 0 {
            self.truncated = true;
            return Ok(Value::Reference(reference));
        }
        self.budget -= 1;

        let Some(target) = self.lookup(&reference)? else {
            warn!(reference = %reference, "dangling reference");
            return Ok(Value::Null);
        };

        // The path walks the resolved target, so it can pass through
        // references held by the target's own fields.
        let expanded = self.expand_record(target, current, parent, depth)?;
        Ok(follow_path(expanded, &reference.path).unwrap_or(Value::Null))
    }

    /// Resolve a target record reached from `current`.
    fn expand_record(
        &mut self,
        target: Record,
        current: &Record,
        parent: Option<&Record>,
        depth: usize,
    ) -> StoreResult<Value> {
        if let Some(parent) = parent {
            if parent.id_str().is_some() && parent.id_str() == target.id_str() {
                debug!(id = ?parent.id_str(), "back-reference; reusing stored record");
                return Ok(Value::from(parent.clone()));
            }
        }
        let resolved = self.resolve_record(target, Some(current), depth + 1)?;
        Ok(Value::from(resolved))
    }

    /// The stored target record, or `None` if its collection or id is gone.
    fn lookup(&mut self, reference: &Reference) -> StoreResult<Option<Record>> {
        if !self.tables.contains_key(&reference.collection) {
            let records = self.store.read_records(&reference.collection)?;
            self.tables.insert(reference.collection.clone(), records);
        }
        Ok(self.tables.get(&reference.collection).and_then(|records| {
            records
                .iter()
                .find(|r| r.id_str() == Some(reference.id.as_str()))
                .cloned()
        }))
    }
}

/// Walk `path` into `value`.
///
/// Stops early, returning the value reached, when a segment would step into
/// a scalar. Returns `None` when a container lacks the segment.
pub(crate) fn follow_path(value: Value, path: &[String]) -> Option<Value> {
    let mut current = value;
    for segment in path {
        if !current.is_container() {
            break;
        }
        current = current.child(segment)?.clone();
    }
    Some(current)
}
