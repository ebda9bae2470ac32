//! Error types for the catalog indexer store.

use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A row carried a value the shared model cannot represent.
    #[error("Row mapping error: {0}")]
    MappingError(String),
}

impl StoreError {
    /// Create a mapping error.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::MappingError(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}
