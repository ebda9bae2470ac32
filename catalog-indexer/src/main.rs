//! Catalog Indexer - Multi-Tenant Catalog Ingestion
//!
//! Entry point for the catalog ingestion consumer. Consumes job-reference
//! messages from Kafka, processes the referenced jobs, and indexes product
//! documents into per-tenant OpenSearch indices.

use std::env;

use tokio::sync::broadcast;
use tracing::{error, info};

use catalog_indexer::{Dependencies, IndexingError};

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting catalog indexer");

    let deps = Dependencies::new().await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    deps.consumer.run(shutdown_rx).await?;

    info!("Catalog indexer stopped");
    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls the filter; `LOG_FORMAT=json` switches to JSON
/// output for log shipping.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
