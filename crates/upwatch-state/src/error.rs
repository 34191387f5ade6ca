//! Error types for the upwatch registry.

use thiserror::Error;

/// Result type alias for registry operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing the registry.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    /// A record could not be encoded to or decoded from its JSON column.
    #[error("codec error on {key}: {reason}")]
    Codec { key: String, reason: String },

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}
