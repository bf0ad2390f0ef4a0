use std::path::{Path, PathBuf};

use rune_crypto::{derive_key, SecretKey};
use rune_types::{Fields, Value};
use serde::{Deserialize, Serialize};

/// Default bound on nested reference resolution.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 32;

/// Default number of references one record read may follow in total.
pub const DEFAULT_MAX_REFERENCE_EXPANSIONS: usize = 4096;

/// Name given to stores opened without one.
pub const DEFAULT_STORE_NAME: &str = "default";

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the store's files.
    pub root: PathBuf,
    /// Store name, recorded as `name` in the catalog metadata.
    pub name: String,
    /// Shared secret the key is derived from. `None` means a random key.
    pub secret: Option<String>,
    /// Metadata the catalog starts with (and returns to on reset).
    pub metadata: Fields,
    /// How many reference hops a read follows before leaving a reference
    /// unresolved.
    pub max_reference_depth: usize,
    /// How many references resolving one record may follow in total before
    /// leaving the rest unresolved. Bounds fan-out through reference cycles.
    pub max_reference_expansions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            name: DEFAULT_STORE_NAME.to_string(),
            secret: None,
            metadata: Fields::new(),
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            max_reference_expansions: DEFAULT_MAX_REFERENCE_EXPANSIONS,
        }
    }
}

impl StoreConfig {
    /// Store rooted at `root`, named after the directory's last component.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| DEFAULT_STORE_NAME.to_string(), str::to_string);
        Self {
            root,
            name,
            ..Self::default()
        }
    }

    /// Store namespaced under an application package.
    ///
    /// Lives at `<config_root>/<package>/db/<db_name>` and is keyed by the
    /// package name, so every process running the same app reads the same
    /// store.
    pub fn for_app(config_root: impl AsRef<Path>, package: &str, db_name: &str) -> Self {
        Self {
            root: config_root.as_ref().join(package).join("db").join(db_name),
            name: db_name.to_string(),
            secret: Some(package.to_string()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    pub fn with_max_reference_expansions(mut self, expansions: usize) -> Self {
        self.max_reference_expansions = expansions;
        self
    }

    /// Key for this configuration: derived from the secret, or random.
    pub fn key(&self) -> SecretKey {
        derive_key(self.secret.as_deref())
    }

    /// Catalog metadata for a fresh or reset store.
    pub fn initial_metadata(&self) -> Fields {
        let mut metadata = self.metadata.clone();
        metadata.insert("name".to_string(), Value::String(self.name.clone()));
        metadata
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("root", &self.root)
            .field("name", &self.name)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("metadata", &self.metadata)
            .field("max_reference_depth", &self.max_reference_depth)
            .field("max_reference_expansions", &self.max_reference_expansions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.root, PathBuf::from("."));
        assert_eq!(c.name, "default");
        assert!(c.secret.is_none());
        assert!(c.metadata.is_empty());
        assert_eq!(c.max_reference_depth, 32);
        assert_eq!(c.max_reference_expansions, 4096);
    }

    #[test]
    fn name_from_directory() {
        let c = StoreConfig::new("/var/data/inventory");
        assert_eq!(c.name, "inventory");
        assert_eq!(c.root, PathBuf::from("/var/data/inventory"));
    }

    #[test]
    fn for_app_layout_and_secret() {
        let c = StoreConfig::for_app("/home/u/.config/rew", "com.example.app", "main");
        assert_eq!(
            c.root,
            PathBuf::from("/home/u/.config/rew/com.example.app/db/main")
        );
        assert_eq!(c.name, "main");
        assert_eq!(c.secret.as_deref(), Some("com.example.app"));
        assert_eq!(c.key(), SecretKey::from_secret("com.example.app"));
    }

    #[test]
    fn initial_metadata_includes_name() {
        let c = StoreConfig::new("/tmp/x")
            .with_name("shop")
            .with_metadata("version", 2);
        let meta = c.initial_metadata();
        assert_eq!(meta.get("name"), Some(&Value::from("shop")));
        assert_eq!(meta.get("version"), Some(&Value::from(2)));
    }

    #[test]
    fn debug_redacts_secret() {
        let c = StoreConfig::new("/tmp/x").with_secret("hunter2");
        let debug = format!("{c:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn serde_fills_defaults() {
        let c: StoreConfig = serde_json::from_str(r#"{"root":"/data/s"}"#).unwrap();
        assert_eq!(c.root, PathBuf::from("/data/s"));
        assert_eq!(c.max_reference_depth, DEFAULT_MAX_REFERENCE_DEPTH);
        assert_eq!(c.max_reference_expansions, DEFAULT_MAX_REFERENCE_EXPANSIONS);
    }
}
