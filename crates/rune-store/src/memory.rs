use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::backend::StorageBackend;
use crate::error::StoreResult;

/// In-memory, HashMap-based storage backend.
///
/// Intended for tests and ephemeral stores. Holds the same sealed bytes a
/// directory would, so everything above the backend behaves identically.
pub struct InMemoryBackend {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Number of files currently stored.
    pub fn len(&self) -> usize {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of stored file names.
    pub fn file_names(&self) -> Vec<String> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read(&self, file: &str) -> StoreResult<Option<Vec<u8>>> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        Ok(files.get(file).cloned())
    }

    fn write(&self, file: &str, data: &[u8]) -> StoreResult<()> {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.insert(file.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, file: &str) -> StoreResult<bool> {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        Ok(files.remove(file).is_some())
    }

    fn exists(&self, file: &str) -> StoreResult<bool> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        Ok(files.contains_key(file))
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("file_count", &self.len())
            .finish()
    }
}
