//! Job store trait definition.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::StoreError;
use catalog_indexer_shared::{IngestionJob, ProductRaw};

/// Abstract interface for job and raw-payload persistence.
///
/// The processor owns the job record for the duration of one delivery;
/// raw payload rows are read-only input and are re-read on every attempt.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async
/// tasks.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Load a job by id within a tenant.
    ///
    /// Returns `Ok(None)` when no such job exists; the caller decides
    /// whether that is fatal.
    async fn load_job(
        &self,
        job_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<IngestionJob>, StoreError>;

    /// Persist the job's status, counts, error text, and timestamps.
    async fn update_job(&self, job: &IngestionJob) -> Result<(), StoreError>;

    /// Load all raw payload rows for a job, oldest first.
    async fn load_raw_payloads(
        &self,
        job_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductRaw>, StoreError>;
}
