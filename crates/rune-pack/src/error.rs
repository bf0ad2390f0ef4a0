use thiserror::Error;

/// Errors from packing and unpacking artifacts.
#[derive(Debug, Error)]
pub enum PackError {
    /// The artifact could not be opened. Deliberately carries no detail: a
    /// wrong secret and a corrupt artifact are indistinguishable.
    #[error("cannot unpack artifact")]
    Decrypt,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PackResult<T> = Result<T, PackError>;
