//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch,
//! Elasticsearch, mocks for testing).

use async_trait::async_trait;
use serde_json::Value;

use crate::bulk::BulkWriteReport;
use crate::errors::SearchError;
use catalog_indexer_shared::ProductIndexDocument;

/// Abstract interface for search engine operations.
///
/// The lifecycle manager and the processor depend on this trait rather
/// than a concrete backend, so both can be tested against mocks. The
/// operations are deliberately low level (existence probes, single-call
/// creates) because the idempotency logic lives above them in
/// [`crate::lifecycle::IndexLifecycleManager`].
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async
/// tasks.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Create or replace the shared index template.
    ///
    /// The target system treats this as an upsert, so repeated calls with
    /// the same body are safe.
    async fn put_index_template(&self, name: &str, body: Value) -> Result<(), SearchError>;

    /// Lightweight existence probe for an alias.
    ///
    /// Returns `Ok(true)` on 200, `Ok(false)` on 404; any other status is a
    /// fatal [`SearchError::UnexpectedStatus`].
    async fn alias_exists(&self, alias: &str) -> Result<bool, SearchError>;

    /// Lightweight existence probe for an index (or any name resolving to
    /// one, including aliases).
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Attach `alias` to an existing `index` as its write alias.
    async fn attach_write_alias(&self, index: &str, alias: &str) -> Result<(), SearchError>;

    /// Create `index` with `alias` attached as its write alias, in one call.
    async fn create_index_with_alias(&self, index: &str, alias: &str) -> Result<(), SearchError>;

    /// Bulk-write documents to `index`, addressed by each document's id.
    ///
    /// An empty slice short-circuits to a zero-cost success report. A
    /// non-success response from the write call is a fatal error carrying
    /// the response body; document-level failures are reported in the
    /// returned [`BulkWriteReport`] instead.
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[ProductIndexDocument],
    ) -> Result<BulkWriteReport, SearchError>;

    /// Check if the search engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
