//! Ingestion job types.
//!
//! Defines the queue message that references a job, the persisted job
//! record mutated by the processor, and the result returned to the consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a job's payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Bulk JSON upload.
    Json,
    /// Bulk CSV upload.
    Csv,
    /// Pushed by a tenant webhook.
    Webhook,
    /// Pulled from a tenant feed.
    Pull,
}

impl SourceType {
    /// Stable string form used in the job table.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Json => "json",
            SourceType::Csv => "csv",
            SourceType::Webhook => "webhook",
            SourceType::Pull => "pull",
        }
    }

    /// Parse the stable string form back into a source type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(SourceType::Json),
            "csv" => Some(SourceType::Csv),
            "webhook" => Some(SourceType::Webhook),
            "pull" => Some(SourceType::Pull),
            _ => None,
        }
    }
}

/// Lifecycle status of an ingestion job.
///
/// Jobs move `Queued -> Processing -> Completed | Failed`. A failed job may
/// be re-driven through `Processing` by a message-level retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Stable string form used in the job table.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse the stable string form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// The message published by the admin API when a job is queued.
///
/// One message references exactly one persisted job; the payload itself
/// stays in the raw-payload table and is re-read on every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJobMessage {
    /// The persisted job's identifier.
    pub job_id: Uuid,
    /// The tenant that owns the job.
    pub tenant_id: Uuid,
    /// Where the payload came from.
    pub source_type: SourceType,
    /// Item count as reported at submission time, if known.
    #[serde(default)]
    pub count: Option<i64>,
}

/// A persisted ingestion job record.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_type: SourceType,
    pub status: JobStatus,
    /// Total items in the job, once known. Never decreased.
    pub total_count: Option<i64>,
    pub processed_count: i64,
    pub failed_count: i64,
    /// Short error text for failed or partially failed jobs.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl IngestionJob {
    /// Raise `total_count` to `count` if it is still unknown.
    ///
    /// An already-known total is kept as is, so retries can never shrink it.
    pub fn infer_total(&mut self, count: Option<i64>) {
        if self.total_count.is_none() {
            self.total_count = count;
        }
    }
}

/// Outcome of one successful job-processing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    pub job_id: Uuid,
    pub processed_count: i64,
    pub failed_count: i64,
    pub total_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserializes_camel_case() {
        let body = r#"{
            "jobId": "550e8400-e29b-41d4-a716-446655440000",
            "tenantId": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "sourceType": "json",
            "count": 42
        }"#;

        let msg: IngestionJobMessage = serde_json::from_str(body).unwrap();

        assert_eq!(
            msg.job_id,
            Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
        );
        assert_eq!(msg.source_type, SourceType::Json);
        assert_eq!(msg.count, Some(42));
    }

    #[test]
    fn test_message_count_optional() {
        let body = r#"{
            "jobId": "550e8400-e29b-41d4-a716-446655440000",
            "tenantId": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "sourceType": "csv"
        }"#;

        let msg: IngestionJobMessage = serde_json::from_str(body).unwrap();
        assert_eq!(msg.source_type, SourceType::Csv);
        assert!(msg.count.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("cancelled"), None);
    }

    #[test]
    fn test_source_type_round_trip() {
        for source in [
            SourceType::Json,
            SourceType::Csv,
            SourceType::Webhook,
            SourceType::Pull,
        ] {
            assert_eq!(SourceType::parse(source.as_str()), Some(source));
        }
    }

    #[test]
    fn test_infer_total_never_decreases() {
        let mut job = IngestionJob {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            source_type: SourceType::Json,
            status: JobStatus::Processing,
            total_count: Some(10),
            processed_count: 0,
            failed_count: 0,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        job.infer_total(Some(3));
        assert_eq!(job.total_count, Some(10));

        job.total_count = None;
        job.infer_total(Some(3));
        assert_eq!(job.total_count, Some(3));
    }
}
