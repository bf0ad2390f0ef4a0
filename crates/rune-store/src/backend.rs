use crate::error::StoreResult;

/// Byte-level storage beneath a [`Store`](crate::Store).
///
/// Files are addressed by bare file name (`users.col`, `main.bin`) relative to
/// the store root. Implementations must satisfy these invariants:
/// - `write` replaces the whole file; readers never observe a partial write.
/// - A missing file reads as `Ok(None)`, never as an error.
/// - All I/O errors are propagated, never silently ignored.
///
/// The backend stores opaque sealed bytes and never interprets them.
pub trait StorageBackend: Send + Sync {
    /// Read a whole file. Returns `Ok(None)` if it does not exist.
    fn read(&self, file: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replace a file's contents, creating it if needed.
    fn write(&self, file: &str, data: &[u8]) -> StoreResult<()>;

    /// Delete a file. Returns `true` if it existed.
    fn remove(&self, file: &str) -> StoreResult<bool>;

    /// Check whether a file exists.
    ///
    /// Default implementation reads the file. Backends may override with a
    /// cheaper check.
    fn exists(&self, file: &str) -> StoreResult<bool> {
        Ok(self.read(file)?.is_some())
    }
}
