//! Bulk write accounting.
//!
//! The bulk endpoint reports per-item outcomes; this module turns that
//! response into success/failure counts so the processor can account for
//! partial failures instead of treating the batch as all-or-nothing.

use serde_json::Value;

/// Outcome of one bulk write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWriteReport {
    /// Number of items the engine reported on.
    pub total: usize,
    /// Items whose outcome carried an error or a status >= 300.
    pub failed_count: usize,
    /// Engine-reported wall time for the batch, in milliseconds.
    pub took_ms: u64,
    /// Whether the response carried any error at all.
    pub has_errors: bool,
}

impl BulkWriteReport {
    /// Report for an empty batch: zero-cost success.
    pub fn empty() -> Self {
        Self {
            total: 0,
            failed_count: 0,
            took_ms: 0,
            has_errors: false,
        }
    }
}

/// Parse a bulk response body into a report.
///
/// If the response carries a per-item list, `total` is that list's length
/// and `failed_count` counts items with an error or a status >= 300, capped
/// at `attempted` so counts stay within the batch that was sent. If no
/// item list is present but the top-level `errors` flag is set, the entire
/// batch of `attempted` documents is counted as failed. A body that is not
/// an object at all is conservatively reported as a full failure.
pub fn parse_bulk_response(body: &Value, attempted: usize) -> BulkWriteReport {
    let Some(obj) = body.as_object() else {
        return BulkWriteReport {
            total: attempted,
            failed_count: attempted,
            took_ms: 0,
            has_errors: true,
        };
    };

    let took_ms = obj.get("took").and_then(Value::as_u64).unwrap_or(0);
    let errors_flag = obj.get("errors").and_then(Value::as_bool).unwrap_or(false);

    match obj.get("items").and_then(Value::as_array) {
        Some(items) => {
            // An off-contract response can list more failing items than
            // documents were sent; failures never exceed the batch
            let failed_count = items
                .iter()
                .filter(|item| item_failed(item))
                .count()
                .min(attempted);
            BulkWriteReport {
                total: items.len(),
                failed_count,
                took_ms,
                has_errors: errors_flag || failed_count > 0,
            }
        }
        None if errors_flag => BulkWriteReport {
            total: attempted,
            failed_count: attempted,
            took_ms,
            has_errors: true,
        },
        None => BulkWriteReport {
            total: attempted,
            failed_count: 0,
            took_ms,
            has_errors: false,
        },
    }
}

/// Whether a single bulk item outcome is a failure.
///
/// Each item is keyed by its action (`index`, `create`, ...); the outcome
/// object carries either an `error` or a `status`.
fn item_failed(item: &Value) -> bool {
    let Some(outcome) = item
        .as_object()
        .and_then(|actions| actions.values().next())
    else {
        // Malformed item entry, count it against the batch
        return true;
    };

    if outcome.get("error").is_some() {
        return true;
    }

    outcome
        .get("status")
        .and_then(Value::as_u64)
        .map(|status| status >= 300)
        .unwrap_or(false)
}
