//! Error types for the storage crate

use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Queue is unknown or has been deleted
    ///
    /// Callers surface this identically for "never existed" and
    /// "not owned by the caller" so queue existence is never leaked.
    #[error("queue not found")]
    QueueNotFound,

    /// Backend failure (database I/O, constraint violations)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
