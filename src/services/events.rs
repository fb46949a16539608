use crate::models::{ContentHolder, UploadBody};
use crate::services::store::BackendError;
use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::sync::Arc;
use std::time::Duration;

/// Largest message the producer accepts; comfortably above the upload ceiling.
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Delivers uploaded content to downstream subscribers.
///
/// `publish` resolves only once the broker has acknowledged the message.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError>;

    /// Flushes anything still in flight. Called once at process shutdown.
    async fn shutdown(&self) {}
}

/// Kafka publisher: one message per upload, keyed by `<owner>/<file>`,
/// carrying the raw bytes plus `name`, `profile` and `contentType` headers.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(brokers: &str, topic: String, timeout: Duration) -> Result<Self, BackendError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("message.max.bytes", MAX_MESSAGE_BYTES.to_string())
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .create()
            .map_err(BackendError::transport)?;

        Ok(Self {
            producer,
            topic,
            timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn publish(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        let key = holder.key().object_key();
        let payload = holder.content.bytes();
        let headers = OwnedHeaders::new()
            .insert(Header {
                key: "name",
                value: Some(holder.file.as_str()),
            })
            .insert(Header {
                key: "profile",
                value: Some(holder.owner.id.as_str()),
            })
            .insert(Header {
                key: "contentType",
                value: Some(holder.content_type.as_str()),
            });

        let record = FutureRecord::to(&self.topic)
            .key(key.as_str())
            .payload(payload.as_ref())
            .headers(headers);

        match self
            .producer
            .send(record, Timeout::After(self.timeout))
            .await
        {
            Ok(_) => {
                tracing::debug!(
                    "📨 Published {} ({} bytes) to {}",
                    key,
                    payload.len(),
                    self.topic
                );
                Ok(())
            }
            Err((e, _)) => {
                tracing::error!("Message publish failed for {}: {}", key, e);
                Err(BackendError::transport(e))
            }
        }
    }

    async fn shutdown(&self) {
        let producer = self.producer.clone();
        let timeout = self.timeout;
        let flushed =
            tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout))).await;
        match flushed {
            Ok(Ok(())) => tracing::info!("📨 Event producer flushed"),
            Ok(Err(e)) => tracing::warn!("Event producer flush failed: {}", e),
            Err(e) => tracing::warn!("Event producer flush task failed: {}", e),
        }
    }
}

/// Publisher that acknowledges everything without a broker. Development only.
pub struct NoOpPublisher;

#[async_trait]
impl EventPublisher for NoOpPublisher {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn publish(&self, holder: &ContentHolder<UploadBody>) -> Result<(), BackendError> {
        tracing::debug!("Skipping publish of {} (noop publisher)", holder.key());
        Ok(())
    }
}

/// Factory function to create a publisher based on configuration
pub fn create_publisher(
    publisher_type: &str,
    brokers: &str,
    topic: &str,
    timeout: Duration,
) -> Result<Arc<dyn EventPublisher>, BackendError> {
    match publisher_type.to_lowercase().as_str() {
        "noop" | "none" | "disabled" => Ok(Arc::new(NoOpPublisher)),
        _ => Ok(Arc::new(KafkaPublisher::new(
            brokers,
            topic.to_string(),
            timeout,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OwnerScope;

    #[tokio::test]
    async fn test_noop_publisher_acknowledges() {
        let publisher = create_publisher("noop", "", "uploads", Duration::from_secs(1)).unwrap();
        assert_eq!(publisher.name(), "noop");

        let holder = ContentHolder::upload(
            OwnerScope::new("u1", "Ada", "Lovelace"),
            "a.txt",
            "text/plain",
            "",
            UploadBody::new(&b"abc"[..]),
        );
        assert!(publisher.publish(&holder).await.is_ok());
    }

    #[tokio::test]
    async fn test_kafka_publisher_builds_without_broker() {
        // librdkafka connects lazily, so construction needs no live broker
        let publisher =
            KafkaPublisher::new("127.0.0.1:9092", "uploads".to_string(), Duration::from_secs(5))
                .unwrap();
        assert_eq!(publisher.topic(), "uploads");
        assert_eq!(publisher.name(), "kafka");
    }
}
