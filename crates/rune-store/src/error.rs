use std::io;

use rune_types::TypeError;

/// Errors from store operations.
///
/// Absent records and keys are not errors; read paths return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A backing file could not be opened: the payload was too short to
    /// carry a nonce, or it decrypted to something that is not a valid
    /// encoding. Wrong keys, tampering, and format changes all land here.
    #[error("cannot decrypt {file}: {reason}")]
    Decrypt { file: String, reason: String },

    /// Contents could not be encoded for writing.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A selector, patch, or argument was malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid collection/map name, identifier, or reference.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
