//! Message broker abstraction.
//!
//! The retry router only needs three operations from the broker: ack a
//! delivery, return it to the queue, and publish a copy somewhere else.
//! Keeping that surface behind a trait makes the routing logic pure and
//! testable with a fake broker.

mod kafka;
mod offsets;

use async_trait::async_trait;

use crate::errors::IngestError;

pub use kafka::KafkaBroker;

/// Header carrying the correlation id across re-publishes.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Header carrying the delivery attempt count. Starts at 0, incremented on
/// each re-publish.
pub const RETRY_COUNT_HEADER: &str = "x-retry-count";

/// Headers carried on every ingestion message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeaders {
    /// Correlation id, propagated across retries. Empty when the producer
    /// did not set one; the consumer generates a fresh id in that case.
    pub correlation_id: String,
    /// How many times this message has been re-published after a failure.
    pub retry_count: u32,
}

impl MessageHeaders {
    /// Headers for a first delivery with no correlation id.
    pub fn empty() -> Self {
        Self {
            correlation_id: String::new(),
            retry_count: 0,
        }
    }
}

/// One message as delivered by the broker, with its position for
/// acknowledgment.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub body: Vec<u8>,
    pub headers: MessageHeaders,
}

/// Abstract broker operations used by the retry router.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; deliveries are handled on
/// concurrent tasks.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Acknowledge a delivery (single, non-bulk).
    async fn ack(&self, delivery: &Delivery) -> Result<(), IngestError>;

    /// Return a delivery to the queue so it is redelivered.
    ///
    /// Used only when a re-publish failed; the message must not be lost.
    async fn nack_requeue(&self, delivery: &Delivery) -> Result<(), IngestError>;

    /// Publish a message copy to `destination` with the given headers,
    /// marked persistent.
    async fn publish(
        &self,
        destination: &str,
        body: &[u8],
        headers: &MessageHeaders,
    ) -> Result<(), IngestError>;
}
