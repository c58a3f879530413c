//! Storage error types.

use thiserror::Error;

/// Errors raised by repository implementations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row expected to exist is missing
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Stored value could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// Get a client-safe error message that doesn't leak storage internals
    pub fn client_message(&self) -> String {
        match self {
            StorageError::Database(_) | StorageError::Serialization(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for repository operations
pub type StorageResult<T> = Result<T, StorageError>;
