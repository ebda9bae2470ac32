//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::{
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{
        IndicesCreateParts, IndicesExistsAliasParts, IndicesExistsParts,
        IndicesPutIndexTemplateParts,
    },
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::bulk::{parse_bulk_response, BulkWriteReport};
use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use catalog_indexer_shared::ProductIndexDocument;

/// OpenSearch client implementation.
///
/// Thin transport layer: every method maps to one engine call and one
/// status-code decision. Idempotency logic lives in the lifecycle manager,
/// partial-failure accounting in [`crate::bulk`].
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Map an existence probe response to a bool.
    ///
    /// 200 means the name exists, 404 that it does not; anything else is a
    /// fatal error because the probe contract was violated.
    fn probe_result(operation: &str, status: u16) -> Result<bool, SearchError> {
        match status {
            200 => Ok(true),
            404 => Ok(false),
            other => Err(SearchError::unexpected_status(operation, other)),
        }
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn put_index_template(&self, name: &str, body: Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .put_index_template(IndicesPutIndexTemplateParts::Name(name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::template(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index template request failed");
            return Err(SearchError::template(format!(
                "Template put failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(template = %name, "Index template ensured");
        Ok(())
    }

    async fn alias_exists(&self, alias: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists_alias(IndicesExistsAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Self::probe_result("alias_exists", response.status_code().as_u16())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Self::probe_result("index_exists", response.status_code().as_u16())
    }

    async fn attach_write_alias(&self, index: &str, alias: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({
                "actions": [
                    { "add": { "index": index, "alias": alias, "is_write_index": true } }
                ]
            }))
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Alias update failed");
            return Err(SearchError::index_creation(format!(
                "Alias attach failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, alias = %alias, "Attached write alias");
        Ok(())
    }

    async fn create_index_with_alias(&self, index: &str, alias: &str) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(json!({
                "aliases": {
                    alias: { "is_write_index": true }
                }
            }))
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "Index create failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, alias = %alias, "Created backing index with write alias");
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[ProductIndexDocument],
    ) -> Result<BulkWriteReport, SearchError> {
        if documents.is_empty() {
            return Ok(BulkWriteReport::empty());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            body.push(json!({ "index": { "_id": doc.id } }).into());
            let doc_body = serde_json::to_value(doc)
                .map_err(|e| SearchError::SerializationError(e.to_string()))?;
            body.push(doc_body.into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Bulk write failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .unwrap_or(Value::Null);

        let report = parse_bulk_response(&response_body, documents.len());

        debug!(
            index = %index,
            total = report.total,
            failed = report.failed_count,
            took_ms = report.took_ms,
            "Bulk write completed"
        );

        Ok(report)
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let status = body["status"].as_str().unwrap_or("red");
        Ok(status == "green" || status == "yellow")
    }
}
