//! Ingestion job processor.
//!
//! Drives one job end to end: load the job, ensure the tenant index, build
//! documents from the raw payload rows, enrich them with embeddings, bulk
//! write, and persist accurate counts. Every failure path persists the job
//! state before the error propagates, so the job table is always
//! inspectable even when message-level retries eventually exhaust.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};

use super::MessageProcessor;
use crate::builder::build_documents;
use crate::embeddings::EmbeddingProvider;
use crate::errors::IngestError;
use catalog_indexer_repository::{IndexLifecycleManager, SearchEngineClient};
use catalog_indexer_shared::{
    IngestionJob, IngestionJobMessage, JobStatus, ProcessingResult,
};
use catalog_indexer_store::JobStore;

/// Maximum length of the error text persisted on a failed job.
const MAX_ERROR_LEN: usize = 500;

/// Error label for jobs failed by document-level bulk errors.
const BULK_ERRORS_LABEL: &str = "elasticsearch_bulk_errors";

/// Error label for completed jobs that skipped some malformed rows.
const PARTIAL_FAILURES_LABEL: &str = "partial_failures";

/// Processor for ingestion jobs.
pub struct JobProcessor {
    store: Arc<dyn JobStore>,
    lifecycle: Arc<IndexLifecycleManager>,
    search: Arc<dyn SearchEngineClient>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl JobProcessor {
    /// Create a new job processor.
    pub fn new(
        store: Arc<dyn JobStore>,
        lifecycle: Arc<IndexLifecycleManager>,
        search: Arc<dyn SearchEngineClient>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            search,
            embeddings,
        }
    }

    /// Run all steps after the job was loaded.
    ///
    /// `parse_failures` is written as soon as it is known so the outer
    /// failure handler can fold it into the persisted counts.
    async fn execute(
        &self,
        job: &mut IngestionJob,
        message: &IngestionJobMessage,
        parse_failures: &mut usize,
    ) -> Result<ProcessingResult, IngestError> {
        let alias = self
            .lifecycle
            .ensure_index(&job.tenant_id.to_string())
            .await?;

        job.status = JobStatus::Processing;
        if job.started_at.is_none() {
            job.started_at = Some(Utc::now());
        }
        job.infer_total(message.count);
        self.store.update_job(job).await?;

        let rows = self.store.load_raw_payloads(job.id, job.tenant_id).await?;

        let built = build_documents(&rows, job.source_type, job.tenant_id);
        *parse_failures = built.parse_failures;
        let mut documents = built.documents;

        job.infer_total(Some((documents.len() + built.parse_failures) as i64));

        // An all-malformed batch is terminal: reprocessing the same rows
        // can never do better, so this is not an error.
        if documents.is_empty() {
            job.status = JobStatus::Completed;
            job.processed_count = 0;
            job.failed_count = built.parse_failures as i64;
            job.error =
                (built.parse_failures > 0).then(|| PARTIAL_FAILURES_LABEL.to_string());
            job.completed_at = Some(Utc::now());
            self.store.update_job(job).await?;

            warn!(job_id = %job.id, parse_failures = built.parse_failures, "No documents built");
            return Ok(ProcessingResult {
                job_id: job.id,
                processed_count: 0,
                failed_count: job.failed_count,
                total_count: job.total_count.unwrap_or(0),
            });
        }

        let texts: Vec<String> = documents
            .iter()
            .map(|doc| doc.embedding_text.clone())
            .collect();
        let vectors = self.embeddings.embed(&texts).await?;

        if vectors.len() != documents.len() {
            return Err(IngestError::EmbeddingContract {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }

        for (doc, vector) in documents.iter_mut().zip(vectors) {
            doc.embedding = Some(vector);
        }

        let document_count = documents.len();
        let report = self.search.bulk_index(&alias, &documents).await?;

        if report.failed_count > 0 || report.has_errors {
            // An off-contract report may claim more failures than were sent
            let bulk_failed = report.failed_count.min(document_count);
            job.status = JobStatus::Failed;
            job.processed_count = (document_count - bulk_failed) as i64;
            job.failed_count = (built.parse_failures + bulk_failed) as i64;
            job.error = Some(BULK_ERRORS_LABEL.to_string());
            job.completed_at = Some(Utc::now());
            self.store.update_job(job).await?;

            // The whole job is retried; reprocessing re-derives all counts
            return Err(IngestError::BulkWriteFailures {
                failed: bulk_failed,
                total: report.total,
            });
        }

        job.status = JobStatus::Completed;
        job.processed_count = document_count as i64;
        job.failed_count = built.parse_failures as i64;
        job.error = (built.parse_failures > 0).then(|| PARTIAL_FAILURES_LABEL.to_string());
        job.completed_at = Some(Utc::now());
        self.store.update_job(job).await?;

        info!(
            job_id = %job.id,
            processed = job.processed_count,
            failed = job.failed_count,
            took_ms = report.took_ms,
            "Job completed"
        );

        Ok(ProcessingResult {
            job_id: job.id,
            processed_count: job.processed_count,
            failed_count: job.failed_count,
            total_count: job.total_count.unwrap_or(document_count as i64),
        })
    }

    /// Persist a failed job before the error propagates.
    async fn persist_failure(
        &self,
        job: &mut IngestionJob,
        error: &IngestError,
        parse_failures: usize,
    ) {
        job.status = JobStatus::Failed;
        job.failed_count = job.failed_count.max(parse_failures as i64);
        job.error = Some(truncate_error(&error.to_string()));
        job.completed_at = Some(Utc::now());

        if let Err(persist_err) = self.store.update_job(job).await {
            warn!(
                job_id = %job.id,
                error = %persist_err,
                "Could not persist failed job state"
            );
        }
    }
}

#[async_trait]
impl MessageProcessor for JobProcessor {
    #[instrument(skip(self, message), fields(job_id = %message.job_id, tenant_id = %message.tenant_id, attempt))]
    async fn process(
        &self,
        message: IngestionJobMessage,
        attempt: u32,
    ) -> Result<ProcessingResult, IngestError> {
        let mut job = self
            .store
            .load_job(message.job_id, message.tenant_id)
            .await?
            .ok_or(IngestError::JobNotFound {
                job_id: message.job_id,
            })?;

        let mut parse_failures = 0usize;
        match self.execute(&mut job, &message, &mut parse_failures).await {
            Ok(result) => Ok(result),
            Err(e) => {
                // The bulk-errors path already persisted accurate counts;
                // re-persisting here would overwrite them.
                if !matches!(e, IngestError::BulkWriteFailures { .. }) {
                    self.persist_failure(&mut job, &e, parse_failures).await;
                }
                Err(e)
            }
        }
    }
}

/// Truncate an error message to the persisted column budget, on a char
/// boundary.
fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_LEN {
        message.to_string()
    } else {
        message.chars().take(MAX_ERROR_LEN).collect()
    }
}
