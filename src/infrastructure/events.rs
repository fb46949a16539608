use crate::config::ServiceConfig;
use crate::services::events::{EventPublisher, create_publisher};
use std::sync::Arc;
use tracing::info;

pub fn setup_publisher(config: &ServiceConfig) -> anyhow::Result<Arc<dyn EventPublisher>> {
    let publisher = create_publisher(
        &config.publisher_type,
        &config.kafka_brokers,
        &config.event_topic,
        config.store_timeout,
    )?;

    info!(
        "📨 Event publisher: {} (topic: {})",
        publisher.name(),
        config.event_topic
    );
    Ok(publisher)
}
