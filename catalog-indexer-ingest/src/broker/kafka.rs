//! Kafka implementation of the message broker.
//!
//! One `StreamConsumer` with manual commits plus one `FutureProducer` for
//! retry/dead-letter re-publishes. Deliveries complete concurrently, so ack
//! goes through the offset tracker and commits only the contiguous
//! completed prefix of each partition; nack-requeue seeks the partition
//! back so the message is redelivered, and the outstanding offset keeps
//! later commits held until it resolves.

use std::time::Duration;

use rdkafka::{
    admin::{AdminClient, AdminOptions, NewTopic, TopicReplication},
    client::DefaultClientContext,
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::{Header, Headers, Message as KafkaMessage, OwnedHeaders},
    producer::{FutureProducer, FutureRecord},
    types::RDKafkaErrorCode,
    Offset, TopicPartitionList,
};
use tracing::{debug, info, warn};

use super::offsets::OffsetTracker;
use super::{Delivery, MessageBroker, MessageHeaders, CORRELATION_ID_HEADER, RETRY_COUNT_HEADER};
use crate::errors::IngestError;

use async_trait::async_trait;

/// How long a re-publish may wait for broker confirmation.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// Kafka broker connection for the ingestion pipeline.
pub struct KafkaBroker {
    consumer: StreamConsumer,
    producer: FutureProducer,
    brokers: String,
    offsets: OffsetTracker,
}

impl KafkaBroker {
    /// Create a new broker connection.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, IngestError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", "all")
            .set("message.timeout.ms", "10000")
            .create()?;

        info!(brokers = %brokers, group_id = %group_id, "Created Kafka broker connection");

        Ok(Self {
            consumer,
            producer,
            brokers: brokers.to_string(),
            offsets: OffsetTracker::new(),
        })
    }

    /// Declare the ingestion topology: create every topic in `topics`,
    /// treating "already exists" as success.
    pub async fn ensure_topology(&self, topics: &[&str]) -> Result<(), IngestError> {
        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()?;

        let new_topics: Vec<NewTopic> = topics
            .iter()
            .map(|name| NewTopic::new(name, 1, TopicReplication::Fixed(1)))
            .collect();

        let results = admin
            .create_topics(new_topics.iter(), &AdminOptions::new())
            .await?;

        for result in results {
            match result {
                Ok(topic) => info!(topic = %topic, "Created topic"),
                Err((topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!(topic = %topic, "Topic already exists");
                }
                Err((topic, code)) => {
                    return Err(IngestError::broker(format!(
                        "Failed to create topic {}: {}",
                        topic, code
                    )));
                }
            }
        }

        Ok(())
    }

    /// Subscribe to the given topics, replacing any prior subscription.
    pub fn subscribe(&self, topics: &[&str]) -> Result<(), IngestError> {
        self.consumer.subscribe(topics)?;
        info!(topics = ?topics, "Subscribed to topics");
        Ok(())
    }

    /// Cancel the subscription. Called before the connection is released.
    pub fn unsubscribe(&self) {
        self.consumer.unsubscribe();
        info!("Unsubscribed from topics");
    }

    /// Wait for the next delivery.
    ///
    /// The returned delivery owns its body and headers, so it can be moved
    /// onto a processing task while the loop keeps receiving.
    pub async fn recv(&self) -> Result<Delivery, IngestError> {
        let message = self.consumer.recv().await?;

        let body = message.payload().unwrap_or_default().to_vec();
        let headers = Self::parse_headers(&message);

        self.offsets
            .delivered(message.topic(), message.partition(), message.offset());

        Ok(Delivery {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            body,
            headers,
        })
    }

    fn parse_headers(message: &impl KafkaMessage) -> MessageHeaders {
        let mut parsed = MessageHeaders::empty();

        let Some(headers) = message.headers() else {
            return parsed;
        };

        for header in headers.iter() {
            let Some(value) = header.value else { continue };
            match header.key {
                CORRELATION_ID_HEADER => {
                    parsed.correlation_id = String::from_utf8_lossy(value).into_owned();
                }
                RETRY_COUNT_HEADER => {
                    parsed.retry_count = String::from_utf8_lossy(value)
                        .parse()
                        .unwrap_or_else(|_| {
                            warn!("Unparseable retry count header, treating as 0");
                            0
                        });
                }
                _ => {}
            }
        }

        parsed
    }
}

#[async_trait]
impl MessageBroker for KafkaBroker {
    async fn ack(&self, delivery: &Delivery) -> Result<(), IngestError> {
        // Commit only when the contiguous completed prefix advanced; an
        // earlier in-flight or requeued offset holds the position back
        let Some(position) =
            self.offsets
                .completed(&delivery.topic, delivery.partition, delivery.offset)
        else {
            debug!(
                topic = %delivery.topic,
                partition = delivery.partition,
                offset = delivery.offset,
                "Acknowledged delivery, commit held for an earlier offset"
            );
            return Ok(());
        };

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&delivery.topic, delivery.partition, Offset::Offset(position))?;

        self.consumer.commit(&tpl, CommitMode::Async)?;

        debug!(
            topic = %delivery.topic,
            partition = delivery.partition,
            offset = delivery.offset,
            committed = position,
            "Acknowledged delivery"
        );
        Ok(())
    }

    async fn nack_requeue(&self, delivery: &Delivery) -> Result<(), IngestError> {
        // The offset stays in flight in the tracker, so later completions
        // on this partition cannot commit past it before it is redelivered
        self.consumer.seek(
            &delivery.topic,
            delivery.partition,
            Offset::Offset(delivery.offset),
            Duration::from_secs(5),
        )?;

        warn!(
            topic = %delivery.topic,
            partition = delivery.partition,
            offset = delivery.offset,
            "Returned delivery to the queue"
        );
        Ok(())
    }

    async fn publish(
        &self,
        destination: &str,
        body: &[u8],
        headers: &MessageHeaders,
    ) -> Result<(), IngestError> {
        let retry_count = headers.retry_count.to_string();
        let kafka_headers = OwnedHeaders::new()
            .insert(Header {
                key: CORRELATION_ID_HEADER,
                value: Some(headers.correlation_id.as_bytes()),
            })
            .insert(Header {
                key: RETRY_COUNT_HEADER,
                value: Some(retry_count.as_bytes()),
            });

        let record = FutureRecord::<(), [u8]>::to(destination)
            .payload(body)
            .headers(kafka_headers);

        self.producer
            .send(record, PUBLISH_TIMEOUT)
            .await
            .map_err(|(e, _)| IngestError::broker(e.to_string()))?;

        debug!(
            destination = %destination,
            retry_count = headers.retry_count,
            "Published message"
        );
        Ok(())
    }
}
