//! Error types for the catalog indexer ingest.

use thiserror::Error;
use uuid::Uuid;

use crate::embeddings::EmbeddingError;
use catalog_indexer_repository::SearchError;
use catalog_indexer_store::StoreError;

/// Errors that can occur in the catalog indexer ingest.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error from the consumer component.
    #[error("Consumer error: {0}")]
    ConsumerError(String),

    /// Error from the processor component.
    #[error("Processor error: {0}")]
    ProcessorError(String),

    /// The referenced job does not exist; no retry can fix that.
    #[error("Job {job_id} not found")]
    JobNotFound { job_id: Uuid },

    /// The embedding service returned a different number of vectors than
    /// documents sent.
    #[error("Embedding contract violation: expected {expected} vectors, got {actual}")]
    EmbeddingContract { expected: usize, actual: usize },

    /// The bulk write reported document-level errors.
    #[error("elasticsearch_bulk_errors: {failed} of {total} documents failed")]
    BulkWriteFailures { failed: usize, total: usize },

    /// Error from the search engine.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Error from the job store.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Error from the embedding service.
    #[error("Embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    /// Broker-related error.
    #[error("Broker error: {0}")]
    BrokerError(String),

    /// Error parsing or decoding data.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl IngestError {
    /// Create a consumer error.
    pub fn consumer(msg: impl Into<String>) -> Self {
        Self::ConsumerError(msg.into())
    }

    /// Create a processor error.
    pub fn processor(msg: impl Into<String>) -> Self {
        Self::ProcessorError(msg.into())
    }

    /// Create a broker error.
    pub fn broker(msg: impl Into<String>) -> Self {
        Self::BrokerError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for IngestError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::BrokerError(err.to_string())
    }
}
