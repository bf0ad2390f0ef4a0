use thiserror::Error;

/// Errors from key handling and envelope operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The sealed payload cannot even hold the nonce.
    #[error("sealed payload too short: {len} bytes, need at least {min}")]
    PayloadTooShort { len: usize, min: usize },

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
