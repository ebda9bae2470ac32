//! Embedding provider interface.
//!
//! The pipeline consumes embeddings through one narrow call: a batch of
//! texts in, a batch of vectors out, ordered 1:1. The processor treats any
//! count mismatch as a fatal contract violation.

mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpEmbeddingProvider;

/// Errors from the embedding service.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Embedding API error: {status} - {body}")]
    ApiError { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Failed to parse embedding response: {0}")]
    ParseError(String),
}

/// Batch embedding interface.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async
/// tasks.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
