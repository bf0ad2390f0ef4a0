use rune_types::{Fields, Value};
use tracing::debug;

use crate::catalog::Container;
use crate::error::StoreResult;
use crate::store::Store;

/// Handle to a named string-keyed table of values.
///
/// Values come back exactly as stored; references in a map are not resolved.
#[derive(Debug, Clone)]
pub struct KvMap<'s> {
    store: &'s Store,
    name: String,
}

impl<'s> KvMap<'s> {
    pub(crate) fn new(store: &'s Store, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> StoreResult<()> {
        let key = key.into();
        let mut table = self.load()?;
        table.insert(key.clone(), value.into());
        self.persist(&table)?;
        debug!(map = %self.name, key = %key, "map entry set");
        Ok(())
    }

    /// Stored value, including `Null`, `false`, `0` and empty strings.
    pub fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.load()?.remove(key))
    }

    /// Returns `false`, leaving the file untouched, if the key was absent.
    pub fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut table = self.load()?;
        if table.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(&table)?;
        debug!(map = %self.name, key, "map entry removed");
        Ok(true)
    }

    pub fn list(&self) -> StoreResult<Fields> {
        self.load()
    }

    /// Replace the whole table with `f(table)`. Persists the result if
    /// `mutate`.
    pub fn transform<F>(&self, f: F, mutate: bool) -> StoreResult<Fields>
    where
        F: FnOnce(Fields) -> Fields,
    {
        let table = f(self.load()?);
        if mutate {
            self.persist(&table)?;
        }
        Ok(table)
    }

    pub fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.load()?.contains_key(key))
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the backing file has been written.
    pub fn exists(&self) -> StoreResult<bool> {
        self.store.file_exists(Container::Map, &self.name)
    }

    fn load(&self) -> StoreResult<Fields> {
        self.store.read_table(&self.name)
    }

    fn persist(&self, table: &Fields) -> StoreResult<()> {
        self.store.write_table(&self.name, table)
    }
}
