use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::publisher::EventPublisher;
use crate::{Result, StoreError};

/// A message recorded by [`InMemoryEventPublisher`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Publisher that records every message in memory so tests can inspect what
/// was sent. Nothing is ever dropped.
#[derive(Clone, Default)]
pub struct InMemoryEventPublisher {
    messages: Arc<RwLock<Vec<PublishedMessage>>>,
    fail: Arc<AtomicBool>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every published message in publish order.
    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.messages.read().await.clone()
    }

    /// Returns the payloads published on one topic.
    pub async fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.payload.clone())
            .collect()
    }

    /// Makes every publish fail while set.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("broker rejected {topic}")));
        }

        self.messages.write().await.push(PublishedMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
