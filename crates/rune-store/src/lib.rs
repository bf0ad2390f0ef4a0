//! Embedded, encrypted, file-backed document store.
//!
//! A store is one directory holding a catalog (`main.bin`), one file per
//! collection (`<name>.col`) and one file per key-value map (`<name>.map`).
//! Every file is a MessagePack payload sealed with the store key, and every
//! mutation rewrites the whole file atomically.
//!
//! # Handles
//!
//! - [`Store`] -- open directory plus key; owns the catalog and metadata
//! - [`Collection`] -- ordered records with generated identifiers
//! - [`KvMap`] -- string-keyed table of values
//!
//! Records may hold [`Reference`](rune_types::Reference) values pointing at
//! other records. Collection reads resolve them into the target record or
//! the value at a path inside it.
//!
//! # Storage Backends
//!
//! All backends implement the [`StorageBackend`] trait:
//!
//! - [`FsBackend`] -- directory on disk, atomic replace via temp file + rename
//! - [`InMemoryBackend`] -- `HashMap`-based store for tests and embedding
//!
//! ```
//! use rune_store::{Patch, Store, StoreConfig};
//! use rune_types::{Record, Value};
//!
//! let store = Store::in_memory(StoreConfig::default().with_secret("app")).unwrap();
//! let users = store.collection("users").unwrap();
//! let ana = users.insert(Record::new().with("name", "ana")).unwrap();
//! let id = ana.id().unwrap();
//!
//! users.update(&id, &Patch::new().push("tags", ["admin"])).unwrap();
//! let read = users.read(&id).unwrap().unwrap();
//! assert_eq!(read.get("tags"), Some(&Value::from(vec!["admin"])));
//! ```

pub mod backend;
pub mod catalog;
pub mod codec;
pub mod collection;
pub mod config;
pub mod disk;
pub mod error;
pub mod kv;
pub mod memory;
pub mod patch;
mod resolver;
pub mod store;

pub use backend::StorageBackend;
pub use catalog::{Catalog, Container, CATALOG_FILE, COLLECTION_EXT, MAP_EXT};
pub use codec::SealedCodec;
pub use collection::Collection;
pub use config::{
    StoreConfig, DEFAULT_MAX_REFERENCE_DEPTH, DEFAULT_MAX_REFERENCE_EXPANSIONS, DEFAULT_STORE_NAME,
};
pub use disk::FsBackend;
pub use error::{StoreError, StoreResult};
pub use kv::KvMap;
pub use memory::InMemoryBackend;
pub use patch::{Change, Patch, Selector};
pub use store::Store;
