//! Domain events exchanged with the host runtime.
//!
//! The core publishes requests (e.g. "embed this context record") and
//! never waits for them; the host reports completion through a separate
//! event that an independent handler observes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::record::{EntityId, MessageRecord, RecordId, RoomId};

/// Scheduling hint for embedding generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingPriority {
    High,
    #[default]
    Normal,
    Low,
}

/// Terminal state of an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Started,
    Completed,
    Timeout,
}

/// Emitted by the host after a message has been fully processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEndedEvent {
    pub run_id: String,
    /// The message that triggered the run.
    pub message_id: Option<RecordId>,
    pub room_id: Option<RoomId>,
    pub entity_id: Option<EntityId>,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Emitted by the host once a queued embedding has been written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingCompletedEvent {
    /// The embedded record, with `embedding` populated.
    pub record: Option<MessageRecord>,
}

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A context record should be embedded by the host's embedding service.
    EmbeddingGenerationRequested {
        record: MessageRecord,
        priority: EmbeddingPriority,
        retry_count: u32,
        max_retries: u32,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// An assembler fell back to its empty result
    ContextAssemblyFailed {
        provider: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Publishing is
/// fire-and-forget: the publisher never learns whether anyone handled it.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::EmbeddingGenerationRequested {
            record: MessageRecord::dialogue("u".into(), "r".into(), "ctx"),
            priority: EmbeddingPriority::High,
            retry_count: 0,
            max_retries: 3,
            source: "test".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::EmbeddingGenerationRequested {
                priority, max_retries, ..
            } => {
                assert_eq!(*priority, EmbeddingPriority::High);
                assert_eq!(*max_retries, 3);
            }
            _ => panic!("Expected EmbeddingGenerationRequested event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::ContextAssemblyFailed {
            provider: "FACTS".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn priority_serializes_lowercase() {
        let json = serde_json::to_string(&EmbeddingPriority::Normal).unwrap();
        assert_eq!(json, "\"normal\"");
    }
}
