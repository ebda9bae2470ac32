//! Per-delivery correlation context.
//!
//! The correlation id travels on message headers and is attached to logs
//! without threading it through every call. It lives in a task-local scope
//! entered at delivery start; when the task finishes, success or failure,
//! the scope is dropped, so an id can never leak into the next delivery
//! handled on the same worker.

use std::future::Future;

tokio::task_local! {
    static CORRELATION_ID: String;
}

/// Run `fut` with `correlation_id` as the ambient correlation context.
pub async fn with_correlation<F>(correlation_id: String, fut: F) -> F::Output
where
    F: Future,
{
    CORRELATION_ID.scope(correlation_id, fut).await
}

/// The current delivery's correlation id, if inside a delivery scope.
pub fn current_correlation() -> Option<String> {
    CORRELATION_ID.try_with(|id| id.clone()).ok()
}
