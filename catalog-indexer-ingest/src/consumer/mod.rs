//! Queue consumer and retry router.
//!
//! Consumes job messages from the main ingestion topic and routes failed
//! deliveries to the retry or dead-letter topic.

mod ingest_consumer;
mod router;

pub use ingest_consumer::{ConsumerConfig, DeliveryHandler, IngestConsumer};
pub use router::{route_failure, RouteDecision};

/// The main ingestion topic.
pub const MAIN_TOPIC: &str = "catalog.ingestion.jobs";

/// Topic for messages awaiting another attempt.
pub const RETRY_TOPIC: &str = "catalog.ingestion.jobs.retry";

/// Terminal topic for messages that exhausted their retry budget.
pub const DEAD_LETTER_TOPIC: &str = "catalog.ingestion.jobs.dlq";
