//! Idempotent search-index lifecycle management.
//!
//! Ensures the shared index template exists and that every tenant has a
//! write alias backed by a versioned index. Every creation is preceded by
//! an existence check, so a retried job or a second worker racing on the
//! same tenant converges on exactly one index and one alias.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::errors::SearchError;
use crate::index_name::{alias_for_tenant, backing_index_for_alias};
use crate::interfaces::SearchEngineClient;
use crate::opensearch::{product_index_template, TEMPLATE_NAME};

/// Manages index templates and per-tenant aliases, idempotently.
pub struct IndexLifecycleManager {
    client: Arc<dyn SearchEngineClient>,
    /// One-time template flag, double-checked under the mutex so concurrent
    /// deliveries trigger at most one template call per process lifetime.
    template_ensured: Mutex<bool>,
}

impl IndexLifecycleManager {
    /// Create a new lifecycle manager over the given engine client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self {
            client,
            template_ensured: Mutex::new(false),
        }
    }

    /// Ensure the tenant's write alias exists, creating whatever is missing.
    ///
    /// Returns the alias name documents should be written to.
    #[instrument(skip(self))]
    pub async fn ensure_index(&self, tenant_id: &str) -> Result<String, SearchError> {
        self.ensure_template().await?;

        let alias = alias_for_tenant(tenant_id);

        if self.client.alias_exists(&alias).await? {
            debug!(alias = %alias, "Alias already exists");
            return Ok(alias);
        }

        // A plain index squatting on the alias name is accepted as is:
        // writes still resolve, they just lose alias-based reindexing.
        if self.client.index_exists(&alias).await? {
            warn!(
                alias = %alias,
                "A plain index already uses the alias name; writing to it directly"
            );
            return Ok(alias);
        }

        let backing = backing_index_for_alias(&alias);

        if self.client.index_exists(&backing).await? {
            self.client.attach_write_alias(&backing, &alias).await?;
            info!(alias = %alias, index = %backing, "Re-attached alias to existing backing index");
            return Ok(alias);
        }

        self.client.create_index_with_alias(&backing, &alias).await?;
        info!(alias = %alias, index = %backing, "Provisioned tenant index");
        Ok(alias)
    }

    /// Ensure the shared index template is present, once per process.
    async fn ensure_template(&self) -> Result<(), SearchError> {
        let mut ensured = self.template_ensured.lock().await;
        if *ensured {
            return Ok(());
        }

        self.client
            .put_index_template(TEMPLATE_NAME, product_index_template())
            .await?;

        *ensured = true;
        info!(template = %TEMPLATE_NAME, "Index template ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use crate::bulk::BulkWriteReport;
    use catalog_indexer_shared::ProductIndexDocument;

    /// Mock engine that records calls and serves canned existence answers.
    struct MockEngine {
        template_calls: AtomicUsize,
        create_calls: AtomicUsize,
        attach_calls: AtomicUsize,
        aliases: StdMutex<Vec<String>>,
        indices: StdMutex<Vec<String>>,
    }

    impl MockEngine {
        fn new() -> Self {
            Self {
                template_calls: AtomicUsize::new(0),
                create_calls: AtomicUsize::new(0),
                attach_calls: AtomicUsize::new(0),
                aliases: StdMutex::new(Vec::new()),
                indices: StdMutex::new(Vec::new()),
            }
        }

        fn with_index(self, index: &str) -> Self {
            self.indices.lock().unwrap().push(index.to_string());
            self
        }
    }

    #[async_trait]
    impl SearchEngineClient for MockEngine {
        async fn put_index_template(&self, _name: &str, _body: Value) -> Result<(), SearchError> {
            self.template_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn alias_exists(&self, alias: &str) -> Result<bool, SearchError> {
            Ok(self.aliases.lock().unwrap().contains(&alias.to_string()))
        }

        async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
            Ok(self.indices.lock().unwrap().contains(&index.to_string()))
        }

        async fn attach_write_alias(&self, _index: &str, alias: &str) -> Result<(), SearchError> {
            self.attach_calls.fetch_add(1, Ordering::SeqCst);
            self.aliases.lock().unwrap().push(alias.to_string());
            Ok(())
        }

        async fn create_index_with_alias(
            &self,
            index: &str,
            alias: &str,
        ) -> Result<(), SearchError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.indices.lock().unwrap().push(index.to_string());
            self.aliases.lock().unwrap().push(alias.to_string());
            Ok(())
        }

        async fn bulk_index(
            &self,
            _index: &str,
            _documents: &[ProductIndexDocument],
        ) -> Result<BulkWriteReport, SearchError> {
            Ok(BulkWriteReport::empty())
        }

        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_creates_index_and_alias_for_new_tenant() {
        let engine = Arc::new(MockEngine::new());
        let manager = IndexLifecycleManager::new(engine.clone());

        let alias = manager.ensure_index("acme").await.unwrap();

        assert_eq!(alias, "products-acme");
        assert_eq!(engine.create_calls.load(Ordering::SeqCst), 1);
        assert!(engine
            .indices
            .lock()
            .unwrap()
            .contains(&"products-acme-000001".to_string()));
    }

    #[tokio::test]
    async fn test_ensure_index_is_idempotent() {
        let engine = Arc::new(MockEngine::new());
        let manager = IndexLifecycleManager::new(engine.clone());

        manager.ensure_index("acme").await.unwrap();
        manager.ensure_index("acme").await.unwrap();

        // One backing index, one alias, never two
        assert_eq!(engine.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            engine
                .aliases
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.as_str() == "products-acme")
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_template_ensured_once_per_process() {
        let engine = Arc::new(MockEngine::new());
        let manager = IndexLifecycleManager::new(engine.clone());

        manager.ensure_index("a").await.unwrap();
        manager.ensure_index("b").await.unwrap();
        manager.ensure_index("c").await.unwrap();

        assert_eq!(engine.template_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accepts_plain_index_name_collision() {
        let engine = Arc::new(MockEngine::new().with_index("products-acme"));
        let manager = IndexLifecycleManager::new(engine.clone());

        let alias = manager.ensure_index("acme").await.unwrap();

        assert_eq!(alias, "products-acme");
        assert_eq!(engine.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.attach_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reattaches_alias_to_existing_backing_index() {
        let engine = Arc::new(MockEngine::new().with_index("products-acme-000001"));
        let manager = IndexLifecycleManager::new(engine.clone());

        let alias = manager.ensure_index("acme").await.unwrap();

        assert_eq!(alias, "products-acme");
        assert_eq!(engine.attach_calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_template_single_call() {
        let engine = Arc::new(MockEngine::new());
        let manager = Arc::new(IndexLifecycleManager::new(engine.clone()));

        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.ensure_index(&format!("tenant-{}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(engine.template_calls.load(Ordering::SeqCst), 1);
    }
}
