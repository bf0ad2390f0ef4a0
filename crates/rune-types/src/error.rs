use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid record id {0:?}: missing '+' separator")]
    InvalidRecordId(String),

    #[error("invalid reference {value:?}: {reason}")]
    InvalidReference { value: String, reason: String },
}
