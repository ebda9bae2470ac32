//! HTTP embedding provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{EmbeddingError, EmbeddingProvider};
use crate::broker::CORRELATION_ID_HEADER;
use crate::context::current_correlation;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    vectors: Vec<Vec<f32>>,
}

/// Embedding provider backed by an HTTP embedding service.
///
/// Posts `{"texts": [...]}` and reads `{"vectors": [[...]]}` back.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmbeddingProvider {
    /// Create a provider for the given service endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        info!(endpoint = %endpoint, "Created embedding provider");
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest { texts });
        // Propagate the delivery's correlation id to the service
        if let Some(correlation_id) = current_correlation() {
            request = request.header(CORRELATION_ID_HEADER, correlation_id);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::ParseError(e.to_string()))?;

        debug!(
            texts = texts.len(),
            vectors = parsed.vectors.len(),
            "Received embedding batch"
        );
        Ok(parsed.vectors)
    }
}
