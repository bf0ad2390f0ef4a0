use rune_crypto::{Envelope, SecretKey};
use rune_types::{validate_name, Fields, Record, Reference, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::StorageBackend;
use crate::catalog::{Catalog, Container, CATALOG_FILE};
use crate::codec::SealedCodec;
use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::disk::FsBackend;
use crate::error::StoreResult;
use crate::kv::KvMap;
use crate::memory::InMemoryBackend;
use crate::resolver::Resolver;

/// An open store: one directory, one key, one catalog.
///
/// Every file is rewritten whole on each mutation. Handles returned by
/// [`collection`](Self::collection) and [`map`](Self::map) borrow the store
/// and hold no data of their own.
pub struct Store {
    config: StoreConfig,
    codec: SealedCodec,
    backend: Box<dyn StorageBackend>,
}

impl Store {
    /// Open the store at `config.root` with a key derived from
    /// `config.secret`, or a random key if there is none.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let key = config.key();
        Self::open_with_key(config, key)
    }

    /// Open the store at `config.root` with an explicit key.
    pub fn open_with_key(config: StoreConfig, key: SecretKey) -> StoreResult<Self> {
        let backend = FsBackend::open(&config.root)?;
        Self::with_backend(config, key, Box::new(backend))
    }

    /// Store held entirely in memory.
    pub fn in_memory(config: StoreConfig) -> StoreResult<Self> {
        let key = config.key();
        Self::with_backend(config, key, Box::new(InMemoryBackend::new()))
    }

    /// Store over any backend. Materializes the catalog if it is missing.
    pub fn with_backend(
        config: StoreConfig,
        key: SecretKey,
        backend: Box<dyn StorageBackend>,
    ) -> StoreResult<Self> {
        let store = Self {
            codec: SealedCodec::new(Envelope::new(key)),
            config,
            backend,
        };
        let created = !store.backend.exists(CATALOG_FILE)?;
        if created {
            let catalog = Catalog::with_metadata(store.config.initial_metadata());
            store.save(CATALOG_FILE, &catalog)?;
            debug!(name = %store.config.name, "catalog created");
        }
        info!(
            root = %store.config.root.display(),
            name = %store.config.name,
            created,
            "store opened"
        );
        Ok(store)
    }

    /// The key every file is sealed with. Persist it if it was random.
    pub fn key(&self) -> &SecretKey {
        self.codec.envelope().key()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Handle to a collection. Nothing touches disk until the first write.
    pub fn collection(&self, name: &str) -> StoreResult<Collection<'_>> {
        validate_name(name)?;
        Ok(Collection::new(self, name))
    }

    /// Handle to a key-value map. Nothing touches disk until the first write.
    pub fn map(&self, name: &str) -> StoreResult<KvMap<'_>> {
        validate_name(name)?;
        Ok(KvMap::new(self, name))
    }

    pub fn catalog(&self) -> StoreResult<Catalog> {
        match self.backend.read(CATALOG_FILE)? {
            Some(sealed) => self.codec.decode(CATALOG_FILE, &sealed),
            None => Ok(Catalog::with_metadata(self.config.initial_metadata())),
        }
    }

    /// Names of every collection written at least once, sorted.
    pub fn collections(&self) -> StoreResult<Vec<String>> {
        Ok(self.catalog()?.collections.into_iter().collect())
    }

    /// Names of every map written at least once, sorted.
    pub fn maps(&self) -> StoreResult<Vec<String>> {
        Ok(self.catalog()?.maps.into_iter().collect())
    }

    /// Delete a collection's file and catalog entry.
    ///
    /// Returns `true` if either existed.
    pub fn drop_collection(&self, name: &str) -> StoreResult<bool> {
        self.drop_container(Container::Collection, name)
    }

    /// Delete a map's file and catalog entry.
    ///
    /// Returns `true` if either existed.
    pub fn drop_map(&self, name: &str) -> StoreResult<bool> {
        self.drop_container(Container::Map, name)
    }

    fn drop_container(&self, kind: Container, name: &str) -> StoreResult<bool> {
        validate_name(name)?;
        let file = kind.file_name(name);
        let removed = self.backend.remove(&file)?;
        let mut catalog = self.catalog()?;
        let unregistered = catalog.unregister(kind, name);
        if unregistered {
            self.save(CATALOG_FILE, &catalog)?;
        }
        debug!(%kind, name, removed, unregistered, "container dropped");
        Ok(removed || unregistered)
    }

    // -- metadata --

    pub fn metadata(&self) -> StoreResult<Fields> {
        Ok(self.catalog()?.metadata)
    }

    pub fn metadata_value(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.catalog()?.metadata.remove(key))
    }

    /// Merge `values` into the metadata, overwriting existing keys.
    pub fn set_metadata(&self, values: Fields) -> StoreResult<()> {
        self.update_catalog(|catalog| {
            catalog.metadata.extend(values);
            true
        })
    }

    pub fn set_metadata_value(&self, key: impl Into<String>, value: impl Into<Value>) -> StoreResult<()> {
        let (key, value) = (key.into(), value.into());
        self.update_catalog(|catalog| {
            catalog.metadata.insert(key, value);
            true
        })
    }

    /// Returns `true` if the key was present.
    pub fn remove_metadata_value(&self, key: &str) -> StoreResult<bool> {
        let mut removed = false;
        self.update_catalog(|catalog| {
            removed = catalog.metadata.remove(key).is_some();
            removed
        })?;
        Ok(removed)
    }

    /// Restore the metadata the store was configured with.
    pub fn reset_metadata(&self) -> StoreResult<()> {
        let initial = self.config.initial_metadata();
        self.update_catalog(|catalog| {
            catalog.metadata = initial;
            true
        })
    }

    /// Look up what a reference points at, resolving references in the
    /// target. `None` if the collection, record, or a path segment is missing.
    pub fn find_ref(&self, reference: &Reference) -> StoreResult<Option<Value>> {
        Resolver::new(self).find_ref(reference)
    }

    // -- file plumbing shared by the handles --

    pub(crate) fn read_records(&self, collection: &str) -> StoreResult<Vec<Record>> {
        self.load(&Container::Collection.file_name(collection))
    }

    pub(crate) fn write_records(&self, collection: &str, records: &[Record]) -> StoreResult<()> {
        self.save(&Container::Collection.file_name(collection), records)?;
        self.register(Container::Collection, collection)
    }

    pub(crate) fn read_table(&self, map: &str) -> StoreResult<Fields> {
        self.load(&Container::Map.file_name(map))
    }

    pub(crate) fn write_table(&self, map: &str, table: &Fields) -> StoreResult<()> {
        self.save(&Container::Map.file_name(map), table)?;
        self.register(Container::Map, map)
    }

    pub(crate) fn file_exists(&self, kind: Container, name: &str) -> StoreResult<bool> {
        self.backend.exists(&kind.file_name(name))
    }

    fn register(&self, kind: Container, name: &str) -> StoreResult<()> {
        let mut catalog = self.catalog()?;
        if catalog.register(kind, name) {
            self.save(CATALOG_FILE, &catalog)?;
            debug!(%kind, name, "registered in catalog");
        }
        Ok(())
    }

    /// Read-modify-write of the catalog. `f` returns whether to persist.
    fn update_catalog<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Catalog) -> bool,
    {
        let mut catalog = self.catalog()?;
        if f(&mut catalog) {
            self.save(CATALOG_FILE, &catalog)?;
        }
        Ok(())
    }

    /// A missing file reads as the empty value.
    fn load<T: DeserializeOwned + Default>(&self, file: &str) -> StoreResult<T> {
        match self.backend.read(file)? {
            Some(sealed) => self.codec.decode(file, &sealed),
            None => Ok(T::default()),
        }
    }

    fn save<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> StoreResult<()> {
        let sealed = self.codec.encode(value)?;
        self.backend.write(file, &sealed)?;
        debug!(file, bytes = sealed.len(), "file written");
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use rune_types::TypeError;

    fn disk_store(dir: &tempfile::TempDir) -> Store {
        Store::open(StoreConfig::new(dir.path()).with_secret("s")).unwrap()
    }

    #[test]
    fn open_creates_directory_and_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("db");
        let store = Store::open(StoreConfig::new(&root).with_secret("s")).unwrap();
        assert!(root.join(CATALOG_FILE).is_file());

        let catalog = store.catalog().unwrap();
        assert!(catalog.collections.is_empty());
        assert!(catalog.maps.is_empty());
        assert_eq!(catalog.metadata.get("name"), Some(&Value::from("db")));
    }

    #[test]
    fn reopen_keeps_catalog() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = disk_store(&dir);
            store.set_metadata_value("version", 3).unwrap();
        }
        let store = disk_store(&dir);
        assert_eq!(store.metadata_value("version").unwrap(), Some(Value::from(3)));
    }

    #[test]
    fn catalog_registers_on_first_write() {
        let store = Store::in_memory(StoreConfig::default().with_secret("s")).unwrap();
        store.collection("users").unwrap();
        store.map("settings").unwrap();
        assert!(store.collections().unwrap().is_empty());
        assert!(store.maps().unwrap().is_empty());

        store.collection("users").unwrap().insert(Record::new()).unwrap();
        store.map("settings").unwrap().set("theme", "dark").unwrap();
        assert_eq!(store.collections().unwrap(), vec!["users"]);
        assert_eq!(store.maps().unwrap(), vec!["settings"]);
    }

    #[test]
    fn invalid_names_rejected() {
        let store = Store::in_memory(StoreConfig::default()).unwrap();
        for name in ["", "a.b", "a+b", "../x", "with space"] {
            assert!(matches!(
                store.collection(name),
                Err(StoreError::Type(TypeError::InvalidName { .. }))
            ));
            assert!(store.map(name).is_err());
        }
    }

    #[test]
    fn secrets_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(StoreConfig::new(dir.path()).with_secret("a")).unwrap();
            store.collection("users").unwrap().insert(Record::new().with("n", 1)).unwrap();
        }
        let other = Store::open(StoreConfig::new(dir.path()).with_secret("b"));
        match other {
            // The catalog already exists, so opening succeeds without reading it.
            Ok(store) => match store.collection("users").unwrap().list() {
                Err(StoreError::Decrypt { .. }) => {}
                Ok(records) => assert!(records.iter().all(|r| r.get("n") != Some(&Value::from(1)))),
                Err(other) => panic!("unexpected error: {other}"),
            },
            Err(err) => panic!("open failed: {err}"),
        }
    }

    #[test]
    fn explicit_key_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let key = {
            let store = Store::open(StoreConfig::new(dir.path())).unwrap();
            store.map("m").unwrap().set("k", "v").unwrap();
            store.key().clone()
        };
        let store = Store::open_with_key(StoreConfig::new(dir.path()), key).unwrap();
        assert_eq!(store.map("m").unwrap().get("k").unwrap(), Some(Value::from("v")));
    }

    #[test]
    fn metadata_operations() {
        let store = Store::in_memory(
            StoreConfig::default()
                .with_name("shop")
                .with_metadata("version", 1),
        )
        .unwrap();
        assert_eq!(store.metadata_value("name").unwrap(), Some(Value::from("shop")));

        let mut extra = Fields::new();
        extra.insert("owner".into(), "ana".into());
        extra.insert("version".into(), 2.into());
        store.set_metadata(extra).unwrap();
        assert_eq!(store.metadata_value("version").unwrap(), Some(Value::from(2)));
        assert_eq!(store.metadata().unwrap().len(), 3);

        assert!(store.remove_metadata_value("owner").unwrap());
        assert!(!store.remove_metadata_value("owner").unwrap());

        store.set_metadata_value("tmp", true).unwrap();
        store.reset_metadata().unwrap();
        let meta = store.metadata().unwrap();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta.get("version"), Some(&Value::from(1)));
        assert!(meta.get("tmp").is_none());
    }

    #[test]
    fn drop_removes_file_and_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = disk_store(&dir);
        store.collection("users").unwrap().insert(Record::new()).unwrap();
        store.map("settings").unwrap().set("k", 1).unwrap();

        assert!(store.drop_collection("users").unwrap());
        assert!(!dir.path().join("users.col").exists());
        assert!(store.collections().unwrap().is_empty());
        assert!(!store.drop_collection("users").unwrap());

        assert!(store.drop_map("settings").unwrap());
        assert!(store.maps().unwrap().is_empty());
        assert!(!store.drop_map("never").unwrap());
    }

    #[test]
    fn stale_catalog_entry_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = disk_store(&dir);
        store.collection("users").unwrap().insert(Record::new()).unwrap();
        std::fs::remove_file(dir.path().join("users.col")).unwrap();

        assert_eq!(store.collections().unwrap(), vec!["users"]);
        assert!(store.collection("users").unwrap().list().unwrap().is_empty());
    }

    #[test]
    fn debug_hides_key() {
        let store = Store::in_memory(StoreConfig::default().with_secret("hunter2")).unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains(&store.key().to_hex()));
    }
}
