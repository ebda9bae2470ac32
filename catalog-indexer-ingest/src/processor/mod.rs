//! Job processing.
//!
//! Defines the `MessageProcessor` trait the consumer delegates to, and the
//! `JobProcessor` that drives one ingestion job through the pipeline.

mod job_processor;

use async_trait::async_trait;

use crate::errors::IngestError;
use catalog_indexer_shared::{IngestionJobMessage, ProcessingResult};

pub use job_processor::JobProcessor;

/// Processes one job-reference message.
///
/// Implemented by [`JobProcessor`]; the consumer depends on the trait so it
/// can be tested with a fake.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// Process the referenced job. Errors propagate to the consumer's
    /// retry/dead-letter routing.
    async fn process(
        &self,
        message: IngestionJobMessage,
        attempt: u32,
    ) -> Result<ProcessingResult, IngestError>;
}
