//! Raw payload rows and the index-ready product document.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A raw payload row persisted alongside a job.
///
/// Read-only input to the processor; re-read on every attempt so retries
/// re-derive their counts instead of accumulating state.
#[derive(Debug, Clone)]
pub struct ProductRaw {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub job_id: Uuid,
    /// The as-submitted payload text (JSON or CSV).
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// A normalized product document ready for bulk indexing.
///
/// Built per raw row, enriched with an embedding vector, and discarded
/// after the bulk write. `id` addresses the document in the bulk action
/// line; `embedding_text` is the model input and is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ProductIndexDocument {
    /// Document id used for the bulk action line, not part of the body.
    #[serde(skip)]
    pub id: String,
    /// Text handed to the embedding service, not part of the body.
    #[serde(skip)]
    pub embedding_text: String,

    pub tenant_id: Uuid,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    /// Free-form tenant attributes, passed through unmodified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    /// Attached after the embedding call, before the bulk write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub indexed_at: DateTime<Utc>,
}

impl ProductIndexDocument {
    /// Create a document with the given id and tenant, everything else empty.
    pub fn new(id: impl Into<String>, tenant_id: Uuid) -> Self {
        let id = id.into();
        Self {
            product_id: id.clone(),
            id,
            embedding_text: String::new(),
            tenant_id,
            name: None,
            description: None,
            brand: None,
            category: None,
            price: None,
            in_stock: None,
            attributes: None,
            embedding: None,
            indexed_at: Utc::now(),
        }
    }
}
