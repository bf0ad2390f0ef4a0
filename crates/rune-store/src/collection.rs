use std::cmp::Ordering;

use rune_types::{Fields, Record, RecordId};
use tracing::debug;

use crate::catalog::Container;
use crate::error::StoreResult;
use crate::patch::{Patch, Selector};
use crate::resolver::Resolver;
use crate::store::Store;

/// Handle to a named, ordered sequence of records.
///
/// Reads that return records for display (`read`, `find`, `find_all`,
/// `list`) resolve references. Everything else works on records as stored.
#[derive(Debug, Clone)]
pub struct Collection<'s> {
    store: &'s Store,
    name: String,
}

impl<'s> Collection<'s> {
    pub(crate) fn new(store: &'s Store, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a record under a fresh identifier and return it as stored.
    ///
    /// Any identifier the record already carried is replaced.
    pub fn insert(&self, mut record: Record) -> StoreResult<Record> {
        let id = RecordId::generate(&self.name)?;
        record.set_id(&id);
        let mut records = self.load()?;
        records.push(record.clone());
        self.persist(&records)?;
        debug!(collection = %self.name, %id, "record inserted");
        Ok(record)
    }

    /// Record with this id, references resolved.
    pub fn read(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        let records = self.load()?;
        let Some(found) = position_of(&records, id).map(|i| records[i].clone()) else {
            return Ok(None);
        };
        self.resolver(records).resolve(found).map(Some)
    }

    /// Record with this id, as stored.
    pub fn read_raw(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        let records = self.load()?;
        Ok(position_of(&records, id).map(|i| records[i].clone()))
    }

    /// First record, in stored order, carrying every field in `criteria`.
    pub fn find(&self, criteria: &Fields) -> StoreResult<Option<Record>> {
        let records = self.load()?;
        let Some(found) = records.iter().find(|r| r.matches(criteria)).cloned() else {
            return Ok(None);
        };
        self.resolver(records).resolve(found).map(Some)
    }

    /// Every record carrying every field in `criteria`, in stored order.
    pub fn find_all(&self, criteria: &Fields) -> StoreResult<Vec<Record>> {
        let records = self.load()?;
        let matching: Vec<Record> = records
            .iter()
            .filter(|r| r.matches(criteria))
            .cloned()
            .collect();
        self.resolver(records).resolve_all(matching)
    }

    /// Apply `patch` to the selected record and return it as stored.
    ///
    /// `Ok(None)` if nothing matched; the file is left untouched.
    pub fn update(
        &self,
        selector: impl Into<Selector>,
        patch: &Patch,
    ) -> StoreResult<Option<Record>> {
        let selector = selector.into();
        selector.validate()?;
        patch.validate()?;

        let mut records = self.load()?;
        let Some(index) = records.iter().position(|r| selector.matches(r)) else {
            return Ok(None);
        };
        patch.apply(&mut records[index]);
        let updated = records[index].clone();
        self.persist(&records)?;
        debug!(collection = %self.name, changes = patch.len(), "record updated");
        Ok(Some(updated))
    }

    /// Delete the record with this id. Returns `false`, leaving the file
    /// untouched, if there is no such record.
    pub fn remove(&self, id: &RecordId) -> StoreResult<bool> {
        if !self.exists()? {
            return Ok(false);
        }
        let mut records = self.load()?;
        let Some(index) = position_of(&records, id) else {
            return Ok(false);
        };
        records.remove(index);
        self.persist(&records)?;
        debug!(collection = %self.name, %id, "record removed");
        Ok(true)
    }

    /// Every record, references resolved.
    pub fn list(&self) -> StoreResult<Vec<Record>> {
        let records = self.load()?;
        self.resolver(records.clone()).resolve_all(records)
    }

    /// Every record, as stored.
    pub fn list_raw(&self) -> StoreResult<Vec<Record>> {
        self.load()
    }

    /// Map every stored record through `f`. Persists the result if `mutate`.
    pub fn map<F>(&self, f: F, mutate: bool) -> StoreResult<Vec<Record>>
    where
        F: FnMut(Record) -> Record,
    {
        self.transform(|records| records.into_iter().map(f).collect(), mutate)
    }

    /// Keep stored records for which `f` holds. Persists the result if `mutate`.
    pub fn filter<F>(&self, mut f: F, mutate: bool) -> StoreResult<Vec<Record>>
    where
        F: FnMut(&Record) -> bool,
    {
        self.transform(
            |mut records| {
                records.retain(|r| f(r));
                records
            },
            mutate,
        )
    }

    /// Stable sort of the stored records. Persists the order if `mutate`.
    pub fn sort<F>(&self, compare: F, mutate: bool) -> StoreResult<Vec<Record>>
    where
        F: FnMut(&Record, &Record) -> Ordering,
    {
        self.transform(
            |mut records| {
                records.sort_by(compare);
                records
            },
            mutate,
        )
    }

    /// Replace the whole stored sequence with `f(records)`. Persists the
    /// result if `mutate`.
    pub fn transform<F>(&self, f: F, mutate: bool) -> StoreResult<Vec<Record>>
    where
        F: FnOnce(Vec<Record>) -> Vec<Record>,
    {
        let records = f(self.load()?);
        if mutate {
            self.persist(&records)?;
        }
        Ok(records)
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.load()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the backing file has been written.
    pub fn exists(&self) -> StoreResult<bool> {
        self.store.file_exists(Container::Collection, &self.name)
    }

    fn load(&self) -> StoreResult<Vec<Record>> {
        self.store.read_records(&self.name)
    }

    fn persist(&self, records: &[Record]) -> StoreResult<()> {
        self.store.write_records(&self.name, records)
    }

    fn resolver(&self, records: Vec<Record>) -> Resolver<'s> {
        Resolver::new(self.store).with_table(&self.name, records)
    }
}

fn position_of(records: &[Record], id: &RecordId) -> Option<usize> {
    records.iter().position(|r| r.id_str() == Some(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use rune_types::{Value, ID_FIELD};

    fn store() -> Store {
        Store::in_memory(StoreConfig::default().with_secret("s")).unwrap()
    }

    fn criteria(key: &str, value: impl Into<Value>) -> Fields {
        let mut fields = Fields::new();
        fields.insert(key.to_string(), value.into());
        fields
    }

    #[test]
    fn insert_then_list() {
        let store = store();
        let users = store.collection("users").unwrap();
        let inserted = users.insert(Record::new().with("name", "x")).unwrap();

        let id = inserted.id().unwrap();
        assert_eq!(id.collection(), "users");
        assert!(id.as_str().starts_with("zxjwx+"));

        let listed = users.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("name"), Some(&Value::from("x")));
        assert_eq!(listed[0].id(), Some(id));
    }

    #[test]
    fn insert_preserves_order_and_assigns_distinct_ids() {
        let store = store();
        let c = store.collection("items").unwrap();
        let a = c.insert(Record::new().with("n", 1)).unwrap();
        let b = c.insert(Record::new().with("n", 2)).unwrap();
        assert_ne!(a.id(), b.id());
        let ns: Vec<_> = c.list().unwrap().iter().map(|r| r.get("n").cloned()).collect();
        assert_eq!(ns, vec![Some(Value::from(1)), Some(Value::from(2))]);
    }

    #[test]
    fn insert_overrides_supplied_id() {
        let store = store();
        let c = store.collection("items").unwrap();
        let record = c
            .insert(Record::new().with(ID_FIELD, "zxjwx+forged"))
            .unwrap();
        assert_ne!(record.id_str(), Some("zxjwx+forged"));
        assert_eq!(record.id().unwrap().collection(), "items");
    }

    #[test]
    fn update_by_id_and_criteria() {
        let store = store();
        let users = store.collection("users").unwrap();
        let rec = users.insert(Record::new().with("name", "x")).unwrap();
        let id = rec.id().unwrap();

        let updated = users
            .update(&id, &Patch::new().set("name", "y"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("name"), Some(&Value::from("y")));
        assert_eq!(
            users.read(&id).unwrap().unwrap().get("name"),
            Some(&Value::from("y"))
        );

        let by_criteria = users
            .update(criteria("name", "y"), &Patch::new().set("age", 4))
            .unwrap()
            .unwrap();
        assert_eq!(by_criteria.id(), Some(id));
        assert_eq!(by_criteria.get("age"), Some(&Value::from(4)));
    }

    #[test]
    fn update_push_and_pull() {
        let store = store();
        let users = store.collection("users").unwrap();
        let id = users.insert(Record::new()).unwrap().id().unwrap();

        users
            .update(&id, &Patch::new().push("tags", ["a", "b"]))
            .unwrap();
        users.update(&id, &Patch::new().pull("tags", ["a"])).unwrap();
        let record = users.read(&id).unwrap().unwrap();
        assert_eq!(record.get("tags"), Some(&Value::from(vec!["b"])));
    }

    #[test]
    fn update_without_match_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreConfig::new(dir.path()).with_secret("s")).unwrap();
        let users = store.collection("users").unwrap();
        users.insert(Record::new().with("name", "x")).unwrap();
        let before = std::fs::read(dir.path().join("users.col")).unwrap();

        let result = users
            .update(criteria("name", "nobody"), &Patch::new().set("name", "z"))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(std::fs::read(dir.path().join("users.col")).unwrap(), before);
    }

    #[test]
    fn update_rejects_bad_input() {
        let store = store();
        let users = store.collection("users").unwrap();
        let id = users.insert(Record::new()).unwrap().id().unwrap();

        let err = users
            .update(Fields::new(), &Patch::new().set("a", 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = users
            .update(&id, &Patch::new().set(ID_FIELD, "other"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreConfig::new(dir.path()).with_secret("s")).unwrap();
        let users = store.collection("users").unwrap();
        let id = users.insert(Record::new().with("name", "x")).unwrap().id().unwrap();

        assert!(users.remove(&id).unwrap());
        let after_first = std::fs::read(dir.path().join("users.col")).unwrap();
        assert!(!users.remove(&id).unwrap());
        assert_eq!(std::fs::read(dir.path().join("users.col")).unwrap(), after_first);
        assert!(users.is_empty().unwrap());
    }

    #[test]
    fn remove_on_missing_file() {
        let store = store();
        let ghost = store.collection("ghost").unwrap();
        let id = RecordId::generate("ghost").unwrap();
        assert!(!ghost.remove(&id).unwrap());
        assert!(!ghost.exists().unwrap());
        assert!(store.collections().unwrap().is_empty());
    }

    #[test]
    fn missing_collection_reads_empty() {
        let store = store();
        let c = store.collection("nothing").unwrap();
        assert!(c.list().unwrap().is_empty());
        assert!(c.find(&criteria("a", 1)).unwrap().is_none());
        assert_eq!(c.len().unwrap(), 0);
        assert!(c.read(&RecordId::generate("nothing").unwrap()).unwrap().is_none());
    }

    #[test]
    fn find_and_find_all() {
        let store = store();
        let c = store.collection("pets").unwrap();
        c.insert(Record::new().with("kind", "cat").with("name", "a")).unwrap();
        c.insert(Record::new().with("kind", "dog").with("name", "b")).unwrap();
        c.insert(Record::new().with("kind", "cat").with("name", "c")).unwrap();

        let first = c.find(&criteria("kind", "cat")).unwrap().unwrap();
        assert_eq!(first.get("name"), Some(&Value::from("a")));
        assert_eq!(c.find_all(&criteria("kind", "cat")).unwrap().len(), 2);
        assert!(c.find(&criteria("kind", "fish")).unwrap().is_none());
    }

    #[test]
    fn find_by_reference_text() {
        let store = store();
        let users = store.collection("users").unwrap();
        let ana = users.insert(Record::new().with("name", "ana")).unwrap();
        let reference = ana.make_ref(Vec::<String>::new()).unwrap();
        let posts = store.collection("posts").unwrap();
        posts
            .insert(Record::new().with("author", reference.clone()).with("title", "t"))
            .unwrap();

        let found = posts
            .find(&criteria("author", reference.to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(found.get("title"), Some(&Value::from("t")));
    }

    #[test]
    fn list_raw_keeps_references() {
        let store = store();
        let users = store.collection("users").unwrap();
        let ana = users.insert(Record::new().with("name", "ana")).unwrap();
        let reference = ana.make_ref(["name"]).unwrap();
        let posts = store.collection("posts").unwrap();
        posts.insert(Record::new().with("by", reference.clone())).unwrap();

        assert_eq!(
            posts.list_raw().unwrap()[0].get("by"),
            Some(&Value::Reference(reference))
        );
    }

    #[test]
    fn functional_ops_persist_only_when_mutating() {
        let store = store();
        let c = store.collection("nums").unwrap();
        for n in [3, 1, 2] {
            c.insert(Record::new().with("n", n)).unwrap();
        }
        let n_of = |r: &Record| r.get("n").and_then(Value::as_i64).unwrap_or_default();

        let sorted = c.sort(|a, b| n_of(a).cmp(&n_of(b)), false).unwrap();
        assert_eq!(sorted.iter().map(n_of).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(c.list_raw().unwrap().iter().map(n_of).collect::<Vec<_>>(), vec![3, 1, 2]);

        let kept = c.filter(|r| n_of(r) > 1, true).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(c.len().unwrap(), 2);

        c.map(|r| r.with("seen", true), true).unwrap();
        assert!(c
            .list_raw()
            .unwrap()
            .iter()
            .all(|r| r.get("seen") == Some(&Value::from(true))));

        let reversed = c
            .transform(|mut rs| {
                rs.reverse();
                rs
            }, false)
            .unwrap();
        assert_eq!(reversed.iter().map(n_of).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(c.list_raw().unwrap().iter().map(n_of).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = Store::open(StoreConfig::new(dir.path()).with_secret("s")).unwrap();
            let c = store.collection("users").unwrap();
            c.insert(Record::new().with("name", "x")).unwrap().id().unwrap()
        };
        let store = Store::open(StoreConfig::new(dir.path()).with_secret("s")).unwrap();
        let record = store.collection("users").unwrap().read(&id).unwrap().unwrap();
        assert_eq!(record.get("name"), Some(&Value::from("x")));
    }
}
