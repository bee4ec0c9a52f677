//! Storage error types.

use thiserror::Error;

/// Storage error type.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Column JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A message with this id is already stored
    #[error("duplicate message id: {0}")]
    DuplicateId(String),

    /// A stored row could not be mapped back to a message
    #[error("malformed row: {0}")]
    Decode(String),
}

/// Result type alias using StorageError.
pub type StorageResult<T> = Result<T, StorageError>;
