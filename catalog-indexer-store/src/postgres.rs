//! Postgres implementation of the job store.
//!
//! Runs plain runtime queries against the admin subsystem's schema and maps
//! rows by hand so the shared crate stays free of database dependencies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::interfaces::JobStore;
use catalog_indexer_shared::{IngestionJob, JobStatus, ProductRaw, SourceType};

/// Postgres-backed job store.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to the given database URL.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        info!("Connected to job database");
        Ok(Self { pool })
    }

    fn map_job(row: &PgRow) -> Result<IngestionJob, StoreError> {
        let status_text: String = row.try_get("status")?;
        let status = JobStatus::parse(&status_text)
            .ok_or_else(|| StoreError::mapping(format!("unknown job status: {}", status_text)))?;

        let source_text: String = row.try_get("source_type")?;
        let source_type = SourceType::parse(&source_text)
            .ok_or_else(|| StoreError::mapping(format!("unknown source type: {}", source_text)))?;

        Ok(IngestionJob {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            source_type,
            status,
            total_count: row.try_get::<Option<i64>, _>("total_count")?,
            processed_count: row.try_get("processed_count")?,
            failed_count: row.try_get("failed_count")?,
            error: row.try_get::<Option<String>, _>("error")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            started_at: row.try_get::<Option<DateTime<Utc>>, _>("started_at")?,
            completed_at: row.try_get::<Option<DateTime<Utc>>, _>("completed_at")?,
        })
    }

    fn map_raw(row: &PgRow) -> Result<ProductRaw, StoreError> {
        Ok(ProductRaw {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            job_id: row.try_get("job_id")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn load_job(
        &self,
        job_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<IngestionJob>, StoreError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, source_type, status, total_count, processed_count, \
             failed_count, error, created_at, started_at, completed_at \
             FROM ingestion_jobs WHERE id = $1 AND tenant_id = $2",
        )
        .bind(job_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_job).transpose()
    }

    async fn update_job(&self, job: &IngestionJob) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE ingestion_jobs SET status = $1, total_count = $2, processed_count = $3, \
             failed_count = $4, error = $5, started_at = $6, completed_at = $7 \
             WHERE id = $8 AND tenant_id = $9",
        )
        .bind(job.status.as_str())
        .bind(job.total_count)
        .bind(job.processed_count)
        .bind(job.failed_count)
        .bind(job.error.as_deref())
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.id)
        .bind(job.tenant_id)
        .execute(&self.pool)
        .await?;

        debug!(job_id = %job.id, status = %job.status.as_str(), "Persisted job update");
        Ok(())
    }

    async fn load_raw_payloads(
        &self,
        job_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductRaw>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, job_id, payload, created_at \
             FROM product_raw WHERE job_id = $1 AND tenant_id = $2 ORDER BY created_at",
        )
        .bind(job_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::map_raw).collect()
    }
}
