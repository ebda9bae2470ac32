//! Dependency initialization and wiring for the catalog indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::IndexingError;
use catalog_indexer_ingest::broker::KafkaBroker;
use catalog_indexer_ingest::consumer::{ConsumerConfig, IngestConsumer};
use catalog_indexer_ingest::embeddings::HttpEmbeddingProvider;
use catalog_indexer_ingest::processor::JobProcessor;
use catalog_indexer_repository::{IndexLifecycleManager, OpenSearchClient, SearchEngineClient};
use catalog_indexer_store::PgJobStore;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "catalog-indexer";

/// Default embedding service endpoint.
const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8089/embed";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured ingestion consumer ready to run.
    pub consumer: IngestConsumer,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: Postgres connection string (required)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: Consumer group ID (default: catalog-indexer)
    /// - `EMBEDDING_URL`: Embedding service endpoint (default: http://localhost:8089/embed)
    /// - `INGEST_MAX_RETRIES`: Retry attempts before dead-lettering (default: 3)
    /// - `INGEST_MAX_IN_FLIGHT`: Concurrent in-flight deliveries (default: 8)
    pub async fn new() -> Result<Self, IndexingError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| IndexingError::config("DATABASE_URL must be set"))?;
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let kafka_broker =
            env::var("KAFKA_BROKER").unwrap_or_else(|_| DEFAULT_KAFKA_BROKER.to_string());
        let kafka_group_id =
            env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| DEFAULT_KAFKA_GROUP_ID.to_string());
        let embedding_url =
            env::var("EMBEDDING_URL").unwrap_or_else(|_| DEFAULT_EMBEDDING_URL.to_string());

        let consumer_config = consumer_config_from_env()?;

        info!(
            opensearch_url = %opensearch_url,
            kafka_broker = %kafka_broker,
            kafka_group_id = %kafka_group_id,
            embedding_url = %embedding_url,
            max_retries = consumer_config.max_retries,
            max_in_flight = consumer_config.max_in_flight,
            "Initializing dependencies"
        );

        // Initialize OpenSearch client
        let search_client = OpenSearchClient::new(&opensearch_url)
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let search_client: Arc<dyn SearchEngineClient> = Arc::new(search_client);
        let lifecycle = Arc::new(IndexLifecycleManager::new(search_client.clone()));

        // Initialize Postgres job store
        let store = PgJobStore::connect(&database_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to connect to Postgres: {}", e)))?;

        info!("Postgres connection verified");

        // Initialize embedding provider
        let embeddings = HttpEmbeddingProvider::new(embedding_url);

        // Initialize Kafka broker
        let broker = KafkaBroker::new(&kafka_broker, &kafka_group_id)
            .map_err(|e| IndexingError::config(format!("Failed to create Kafka broker: {}", e)))?;

        info!("Kafka broker created");

        let processor = JobProcessor::new(
            Arc::new(store),
            lifecycle,
            search_client,
            Arc::new(embeddings),
        );

        let consumer = IngestConsumer::new(Arc::new(broker), Arc::new(processor), consumer_config);

        Ok(Self { consumer })
    }
}

/// Read consumer tuning from the environment, falling back to defaults.
fn consumer_config_from_env() -> Result<ConsumerConfig, IndexingError> {
    let mut config = ConsumerConfig::default();

    if let Ok(raw) = env::var("INGEST_MAX_RETRIES") {
        config.max_retries = raw
            .parse()
            .map_err(|_| IndexingError::config(format!("Invalid INGEST_MAX_RETRIES: {}", raw)))?;
    }
    if let Ok(raw) = env::var("INGEST_MAX_IN_FLIGHT") {
        config.max_in_flight = raw
            .parse()
            .map_err(|_| IndexingError::config(format!("Invalid INGEST_MAX_IN_FLIGHT: {}", raw)))?;
        if config.max_in_flight == 0 {
            return Err(IndexingError::config("INGEST_MAX_IN_FLIGHT must be > 0"));
        }
    }
    if let Ok(raw) = env::var("INGEST_RECONNECT_BACKOFF_SECS") {
        let secs: u64 = raw.parse().map_err(|_| {
            IndexingError::config(format!("Invalid INGEST_RECONNECT_BACKOFF_SECS: {}", raw))
        })?;
        config.reconnect_backoff = Duration::from_secs(secs);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_config_defaults() {
        let config = ConsumerConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_in_flight, 8);
    }
}
