use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::StoreResult;

/// Directory-backed storage: one file per collection, map, and catalog.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Open a directory, creating it (and its parents) if absent.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a store file.
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, file: &str) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_of(file)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, file: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.path_of(file);
        let mut staging = NamedTempFile::new_in(&self.root)?;
        staging.write_all(data)?;
        staging.as_file().sync_all()?;
        staging.persist(&path).map_err(|e| e.error)?;
        debug!(path = %path.display(), len = data.len(), "file written");
        Ok(())
    }

    fn remove(&self, file: &str) -> StoreResult<bool> {
        let path = self.path_of(file);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "file removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, file: &str) -> StoreResult<bool> {
        Ok(self.path_of(file).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app").join("db").join("main");
        let backend = FsBackend::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(backend.root(), root);
    }

    #[test]
    fn write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();

        backend.write("users.col", b"payload").unwrap();
        assert!(backend.exists("users.col").unwrap());
        assert_eq!(
            fs::read(dir.path().join("users.col")).unwrap(),
            b"payload".to_vec()
        );
        assert_eq!(backend.read("users.col").unwrap(), Some(b"payload".to_vec()));

        assert!(backend.remove("users.col").unwrap());
        assert!(!backend.remove("users.col").unwrap());
        assert!(backend.read("users.col").unwrap().is_none());
    }

    #[test]
    fn write_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path()).unwrap();
        backend.write("a.map", b"one").unwrap();
        backend.write("a.map", b"two").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("a.map")]);
        assert_eq!(backend.read("a.map").unwrap(), Some(b"two".to_vec()));
    }
}
