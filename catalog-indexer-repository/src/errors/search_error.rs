//! Search error types.
//!
//! This module defines the error types that can occur during search engine
//! operations.

use thiserror::Error;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug, Clone)]
pub enum SearchError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to create or replace the shared index template.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Failed to create a backing index or attach an alias.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Bulk write request failed at the transport level.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An existence probe returned a status that is neither 200 nor 404.
    #[error("Unexpected status {status} from {operation}")]
    UnexpectedStatus { operation: String, status: u16 },
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a template error.
    pub fn template(msg: impl Into<String>) -> Self {
        Self::TemplateError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unexpected-status error for an existence probe.
    pub fn unexpected_status(operation: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            operation: operation.into(),
            status,
        }
    }
}
