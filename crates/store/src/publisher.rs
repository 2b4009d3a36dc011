use async_trait::async_trait;
use domain::OrderEvent;

use crate::Result;

/// Outbound message bus port.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a JSON payload on a topic.
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()>;
}

/// Extension trait providing convenience methods for publishers.
#[async_trait]
pub trait EventPublisherExt: EventPublisher {
    /// Serializes an order event and publishes it on its topic.
    async fn publish_event(&self, event: &OrderEvent) -> Result<()> {
        let payload = serde_json::to_value(event)?;
        self.publish(event.topic(), payload).await
    }
}

// Blanket implementation for all EventPublisher implementations
impl<T: EventPublisher + ?Sized> EventPublisherExt for T {}

/// Publisher that writes each message to the log and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
        tracing::info!(topic, %payload, "event published");
        Ok(())
    }
}
