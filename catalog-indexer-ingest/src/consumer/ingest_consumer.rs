//! Ingest consumer implementation.
//!
//! Runs the long-lived delivery loop and owns the per-delivery
//! ack/retry/dead-letter decision.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::router::route_failure;
use super::{DEAD_LETTER_TOPIC, MAIN_TOPIC, RETRY_TOPIC};
use crate::broker::{Delivery, KafkaBroker, MessageBroker, MessageHeaders};
use crate::context::with_correlation;
use crate::errors::IngestError;
use crate::processor::MessageProcessor;
use catalog_indexer_shared::IngestionJobMessage;

/// Configuration for the ingest consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Maximum re-publish attempts before a message is dead-lettered.
    pub max_retries: u32,
    /// Bounded in-flight delivery count (broker-side flow control).
    pub max_in_flight: usize,
    /// How long to wait before retrying after a broker receive failure.
    pub reconnect_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_in_flight: 8,
            reconnect_backoff: Duration::from_secs(5),
        }
    }
}

/// Handles one delivery end to end: context, deserialization, processing,
/// and the ack/retry/dead-letter outcome.
///
/// Separated from the receive loop so it can be tested against fake broker
/// and processor implementations.
pub struct DeliveryHandler {
    broker: Arc<dyn MessageBroker>,
    processor: Arc<dyn MessageProcessor>,
    config: ConsumerConfig,
}

impl DeliveryHandler {
    /// Create a new delivery handler.
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        processor: Arc<dyn MessageProcessor>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            broker,
            processor,
            config,
        }
    }

    /// Handle one delivery. Never returns an error: every failure mode ends
    /// in a broker outcome (ack after re-publish, or nack-requeue).
    pub async fn handle(&self, delivery: Delivery) {
        let correlation_id = if delivery.headers.correlation_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            delivery.headers.correlation_id.clone()
        };
        let attempt = delivery.headers.retry_count;

        let span = info_span!(
            "delivery",
            correlation_id = %correlation_id,
            attempt = attempt,
            offset = delivery.offset,
        );

        with_correlation(correlation_id.clone(), async {
            match self.process_body(&delivery.body, attempt).await {
                Ok(()) => {
                    if let Err(e) = self.broker.ack(&delivery).await {
                        error!(error = %e, "Failed to ack successful delivery");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Processing failed, routing for retry");
                    self.route_failed(&delivery, correlation_id, attempt).await;
                }
            }
        })
        .instrument(span)
        .await
    }

    /// Deserialize the body and delegate to the processor.
    ///
    /// An empty or invalid body is a processing failure with no job
    /// reference; the same retry/dead-letter routing applies.
    async fn process_body(&self, body: &[u8], attempt: u32) -> Result<(), IngestError> {
        let message: IngestionJobMessage = serde_json::from_slice(body)
            .map_err(|e| IngestError::parse(format!("Invalid job message body: {}", e)))?;

        let result = self.processor.process(message, attempt).await?;

        debug!(
            job_id = %result.job_id,
            processed = result.processed_count,
            failed = result.failed_count,
            "Job processed"
        );
        Ok(())
    }

    /// Re-publish a failed delivery to the retry or dead-letter topic, then
    /// ack the original. The failure is owned by the new message; only a
    /// failed re-publish returns the original to the queue.
    async fn route_failed(&self, delivery: &Delivery, correlation_id: String, attempt: u32) {
        let decision = route_failure(attempt, self.config.max_retries);
        let headers = MessageHeaders {
            correlation_id,
            retry_count: decision.attempt(),
        };

        match self
            .broker
            .publish(decision.destination(), &delivery.body, &headers)
            .await
        {
            Ok(()) => {
                info!(
                    destination = %decision.destination(),
                    attempt = decision.attempt(),
                    "Re-published failed delivery"
                );
                if let Err(e) = self.broker.ack(delivery).await {
                    error!(error = %e, "Failed to ack re-published delivery");
                }
            }
            Err(publish_err) => {
                error!(error = %publish_err, "Re-publish failed, returning delivery to queue");
                if let Err(e) = self.broker.nack_requeue(delivery).await {
                    error!(error = %e, "Failed to requeue delivery");
                }
            }
        }
    }
}

/// Long-lived consumer over the Kafka broker.
///
/// Receives one delivery at a time, bounded by the in-flight semaphore, and
/// hands each to the delivery handler on its own task. Broker errors are
/// logged and retried after a fixed backoff; the loop only exits on the
/// shutdown signal.
pub struct IngestConsumer {
    broker: Arc<KafkaBroker>,
    handler: Arc<DeliveryHandler>,
    config: ConsumerConfig,
}

impl IngestConsumer {
    /// Create a new consumer.
    pub fn new(
        broker: Arc<KafkaBroker>,
        processor: Arc<dyn MessageProcessor>,
        config: ConsumerConfig,
    ) -> Self {
        let handler = Arc::new(DeliveryHandler::new(
            broker.clone(),
            processor,
            config.clone(),
        ));

        Self {
            broker,
            handler,
            config,
        }
    }

    /// Run the consumer until a shutdown signal arrives.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), IngestError> {
        self.broker
            .ensure_topology(&[MAIN_TOPIC, RETRY_TOPIC, DEAD_LETTER_TOPIC])
            .await?;
        // Retried copies land on the retry topic and re-enter the same loop
        self.broker.subscribe(&[MAIN_TOPIC, RETRY_TOPIC])?;

        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight));

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    break;
                }
                delivery = self.broker.recv() => {
                    match delivery {
                        Ok(delivery) => {
                            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                                break;
                            };
                            let handler = self.handler.clone();
                            tokio::spawn(async move {
                                handler.handle(delivery).await;
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            error!(
                                error = %e,
                                backoff_secs = self.config.reconnect_backoff.as_secs(),
                                "Broker receive failed, backing off"
                            );
                            tokio::time::sleep(self.config.reconnect_backoff).await;
                        }
                    }
                }
            }
        }

        // Drain in-flight deliveries before the subscription goes away
        let _ = semaphore
            .acquire_many(self.config.max_in_flight as u32)
            .await;
        self.broker.unsubscribe();

        info!("Consumer shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use catalog_indexer_shared::ProcessingResult;

    /// Fake broker that records every operation.
    #[derive(Default)]
    struct FakeBroker {
        acks: Mutex<Vec<i64>>,
        nacks: Mutex<Vec<i64>>,
        published: Mutex<Vec<(String, Vec<u8>, MessageHeaders)>>,
        fail_publish: bool,
    }

    #[async_trait]
    impl MessageBroker for FakeBroker {
        async fn ack(&self, delivery: &Delivery) -> Result<(), IngestError> {
            self.acks.lock().unwrap().push(delivery.offset);
            Ok(())
        }

        async fn nack_requeue(&self, delivery: &Delivery) -> Result<(), IngestError> {
            self.nacks.lock().unwrap().push(delivery.offset);
            Ok(())
        }

        async fn publish(
            &self,
            destination: &str,
            body: &[u8],
            headers: &MessageHeaders,
        ) -> Result<(), IngestError> {
            if self.fail_publish {
                return Err(IngestError::broker("publish unavailable"));
            }
            self.published.lock().unwrap().push((
                destination.to_string(),
                body.to_vec(),
                headers.clone(),
            ));
            Ok(())
        }
    }

    /// Fake processor with a canned outcome.
    struct FakeProcessor {
        fail: bool,
        calls: Mutex<Vec<u32>>,
    }

    impl FakeProcessor {
        fn succeeding() -> Self {
            Self {
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessageProcessor for FakeProcessor {
        async fn process(
            &self,
            message: IngestionJobMessage,
            attempt: u32,
        ) -> Result<ProcessingResult, IngestError> {
            self.calls.lock().unwrap().push(attempt);
            if self.fail {
                return Err(IngestError::processor("boom"));
            }
            Ok(ProcessingResult {
                job_id: message.job_id,
                processed_count: 1,
                failed_count: 0,
                total_count: 1,
            })
        }
    }

    fn job_body() -> Vec<u8> {
        br#"{
            "jobId": "550e8400-e29b-41d4-a716-446655440000",
            "tenantId": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "sourceType": "json",
            "count": 1
        }"#
        .to_vec()
    }

    fn delivery(body: Vec<u8>, correlation_id: &str, retry_count: u32) -> Delivery {
        Delivery {
            topic: MAIN_TOPIC.to_string(),
            partition: 0,
            offset: 7,
            body,
            headers: MessageHeaders {
                correlation_id: correlation_id.to_string(),
                retry_count,
            },
        }
    }

    fn handler(broker: Arc<FakeBroker>, processor: Arc<FakeProcessor>) -> DeliveryHandler {
        DeliveryHandler::new(broker, processor, ConsumerConfig::default())
    }

    #[tokio::test]
    async fn test_success_acks_without_republish() {
        let broker = Arc::new(FakeBroker::default());
        let processor = Arc::new(FakeProcessor::succeeding());
        let handler = handler(broker.clone(), processor.clone());

        handler.handle(delivery(job_body(), "corr", 0)).await;

        assert_eq!(broker.acks.lock().unwrap().as_slice(), &[7]);
        assert!(broker.published.lock().unwrap().is_empty());
        assert!(broker.nacks.lock().unwrap().is_empty());
        assert_eq!(processor.calls.lock().unwrap().as_slice(), &[0]);
    }

    #[tokio::test]
    async fn test_failure_republishes_to_retry_and_acks() {
        let broker = Arc::new(FakeBroker::default());
        let handler = handler(broker.clone(), Arc::new(FakeProcessor::failing()));

        handler.handle(delivery(job_body(), "corr-9", 0)).await;

        let published = broker.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        let (destination, body, headers) = &published[0];
        assert_eq!(destination, RETRY_TOPIC);
        assert_eq!(body, &job_body());
        assert_eq!(headers.retry_count, 1);
        assert_eq!(headers.correlation_id, "corr-9");
        assert_eq!(broker.acks.lock().unwrap().as_slice(), &[7]);
    }

    #[tokio::test]
    async fn test_exhausted_retries_go_to_dead_letter() {
        let broker = Arc::new(FakeBroker::default());
        let handler = handler(broker.clone(), Arc::new(FakeProcessor::failing()));

        handler.handle(delivery(job_body(), "corr", 3)).await;

        let published = broker.published.lock().unwrap();
        assert_eq!(published[0].0, DEAD_LETTER_TOPIC);
        assert_eq!(published[0].2.retry_count, 4);
    }

    #[tokio::test]
    async fn test_publish_failure_requeues_original() {
        let broker = Arc::new(FakeBroker {
            fail_publish: true,
            ..Default::default()
        });
        let handler = handler(broker.clone(), Arc::new(FakeProcessor::failing()));

        handler.handle(delivery(job_body(), "corr", 0)).await;

        assert_eq!(broker.nacks.lock().unwrap().as_slice(), &[7]);
        assert!(broker.acks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_body_is_routed_like_a_failure() {
        let broker = Arc::new(FakeBroker::default());
        let processor = Arc::new(FakeProcessor::succeeding());
        let handler = handler(broker.clone(), processor.clone());

        handler.handle(delivery(b"not json".to_vec(), "corr", 0)).await;

        // Processor never ran; the message still went through retry routing
        assert!(processor.calls.lock().unwrap().is_empty());
        let published = broker.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, RETRY_TOPIC);
    }

    #[tokio::test]
    async fn test_missing_correlation_id_is_generated() {
        let broker = Arc::new(FakeBroker::default());
        let handler = handler(broker.clone(), Arc::new(FakeProcessor::failing()));

        handler.handle(delivery(job_body(), "", 0)).await;

        let published = broker.published.lock().unwrap();
        assert!(!published[0].2.correlation_id.is_empty());
        assert!(Uuid::parse_str(&published[0].2.correlation_id).is_ok());
    }
}
