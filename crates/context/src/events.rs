//! Embedding event handlers.
//!
//! After each completed run the recent conversation is stored as a compact
//! context record and an embedding request is published for it. The host
//! generates the embedding on its own schedule and reports back through
//! [`handle_embedding_completed`].

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{debug, error, info};

use toonctx_codec::encode_or_fallback;
use toonctx_core::error::HostError;
use toonctx_core::event::{DomainEvent, EmbeddingCompletedEvent, RunEndedEvent, RunStatus};
use toonctx_core::host::Table;
use toonctx_core::record::{MessageRecord, RecordId, RoomId};

use crate::runtime::HostRuntime;

/// `source` tag of derived context records.
pub const CONTEXT_SOURCE: &str = "toon-context";

/// `source` of the embedding requests this module publishes.
pub const REQUEST_SOURCE: &str = "toon-plugin";

const MAX_RETRIES: u32 = 3;

/// Store a compact context record for the run's message and request its
/// embedding. Returns the new record's id, or `None` when nothing was
/// queued. Failures are logged, never returned.
pub async fn handle_run_ended(runtime: &HostRuntime, event: &RunEndedEvent) -> Option<RecordId> {
    if event.status != RunStatus::Completed {
        debug!(run_id = %event.run_id, status = ?event.status, "Skipping non-completed run");
        return None;
    }

    let (Some(message_id), Some(room_id)) = (&event.message_id, &event.room_id) else {
        debug!(run_id = %event.run_id, "Run ended without message or room id");
        return None;
    };

    if !runtime.settings.embedding.enabled {
        return None;
    }

    match queue_context(runtime, message_id, room_id).await {
        Ok(queued) => queued,
        Err(e) => {
            error!(message_id = %message_id, error = %e, "Failed to queue context embedding");
            None
        }
    }
}

async fn queue_context(
    runtime: &HostRuntime,
    message_id: &RecordId,
    room_id: &RoomId,
) -> Result<Option<RecordId>, HostError> {
    let settings = &runtime.settings.embedding;

    let Some(source) = runtime.store.record_by_id(message_id).await? else {
        debug!(message_id = %message_id, "Message not found");
        return Ok(None);
    };

    let length = source.text_or_empty().chars().count();
    if length < settings.min_message_length {
        debug!(length, "Skipping embedding for short message");
        return Ok(None);
    }
    if source.source.as_deref() == Some(CONTEXT_SOURCE) {
        return Ok(None);
    }

    info!(message_id = %message_id.short(8), "Processing completed run");

    let recent = runtime
        .store
        .ordered_records(room_id, Table::Messages, settings.max_context_messages, false)
        .await?;
    if recent.is_empty() {
        debug!("No context record created");
        return Ok(None);
    }

    let rows: Vec<Value> = recent
        .iter()
        .map(|m| {
            json!({
                "sender": m.entity_id.as_str(),
                "text": m.text_or_empty(),
                "timestamp": m.created_at_millis(),
            })
        })
        .collect();
    let encoded = encode_or_fallback(&Value::Array(rows), &runtime.settings.codec.encode_options());

    let mut metadata = Map::new();
    metadata.insert("messageCount".into(), recent.len().into());
    metadata.insert("sourceMessageId".into(), message_id.as_str().into());
    metadata.insert("toonEncoded".into(), (!encoded.fallback).into());

    let record = MessageRecord {
        source: Some(CONTEXT_SOURCE.to_string()),
        metadata,
        ..MessageRecord::dialogue(source.entity_id.clone(), room_id.clone(), encoded.text)
    };
    let id = runtime.store.create_record(record.clone(), Table::ToonContext).await?;

    runtime.events.publish(DomainEvent::EmbeddingGenerationRequested {
        record,
        priority: settings.priority,
        retry_count: 0,
        max_retries: MAX_RETRIES,
        source: REQUEST_SOURCE.to_string(),
        timestamp: Utc::now(),
    });

    info!(
        record_id = %id.short(8),
        messages = recent.len(),
        priority = ?settings.priority,
        "Queued context embedding"
    );
    Ok(Some(id))
}

/// Log completed embeddings of context records; other records are ignored.
pub fn handle_embedding_completed(event: &EmbeddingCompletedEvent) {
    let Some(record) = &event.record else {
        return;
    };
    if record.source.as_deref() != Some(CONTEXT_SOURCE) {
        return;
    }

    info!(
        record_id = %record.id.short(8),
        messages = record.metadata.get("messageCount").and_then(serde_json::Value::as_u64).unwrap_or(0),
        text_length = record.text_or_empty().len(),
        dimensions = record.embedding.as_ref().map_or(0, Vec::len),
        "Context embedding completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{AGENT, Fixture, ROOM, USER, at};
    use toonctx_core::event::EmbeddingPriority;
    use toonctx_core::host::RecordStore;
    use toonctx_core::record::ChannelKind;

    fn run_ended(message_id: &RecordId, status: RunStatus) -> RunEndedEvent {
        RunEndedEvent {
            run_id: "run-1".into(),
            message_id: Some(message_id.clone()),
            room_id: Some(ROOM.into()),
            entity_id: Some(USER.into()),
            status,
            start_time: at(0),
            end_time: Some(at(2)),
            error: None,
        }
    }

    #[tokio::test]
    async fn completed_run_queues_context_record() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let mut events = fx.runtime.events.subscribe();
        fx.say(USER, "hi", 0).await;
        let message = fx.say(USER, "can you book a table for two?", 1).await;
        fx.say(AGENT, "Sure, for what time?", 2).await;

        let id = handle_run_ended(&fx.runtime, &run_ended(&message.id, RunStatus::Completed))
            .await
            .unwrap();

        let stored = fx.store.records(Table::ToonContext).await;
        assert_eq!(stored.len(), 1);
        let record = &stored[0];
        assert_eq!(record.id, id);
        assert_eq!(record.source.as_deref(), Some(CONTEXT_SOURCE));
        assert_eq!(record.entity_id.as_str(), USER);
        assert_eq!(record.metadata["messageCount"], 3);
        assert_eq!(record.metadata["sourceMessageId"], message.id.as_str());
        assert_eq!(record.metadata["toonEncoded"], true);
        assert!(record.text_or_empty().starts_with("[3]{sender,text,timestamp}:\n"));
        assert!(record.text_or_empty().contains("\"Sure, for what time?\""));

        let event = events.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::EmbeddingGenerationRequested {
                record,
                priority,
                retry_count,
                max_retries,
                source,
                ..
            } => {
                assert_eq!(record.id, id);
                assert_eq!(*priority, EmbeddingPriority::Normal);
                assert_eq!(*retry_count, 0);
                assert_eq!(*max_retries, 3);
                assert_eq!(source, REQUEST_SOURCE);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn context_is_limited_to_recent_messages() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let mut last = None;
        for i in 0..8 {
            last = Some(fx.say(USER, &format!("message number {i}"), i).await);
        }
        let message = last.unwrap();

        handle_run_ended(&fx.runtime, &run_ended(&message.id, RunStatus::Completed))
            .await
            .unwrap();

        let record = &fx.store.records(Table::ToonContext).await[0];
        assert_eq!(record.metadata["messageCount"], 5);
        assert!(!record.text_or_empty().contains("message number 2"));
        assert!(record.text_or_empty().contains("message number 7"));
    }

    #[tokio::test]
    async fn unfinished_or_incomplete_runs_are_ignored() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let message = fx.say(USER, "a perfectly long message", 0).await;

        assert!(handle_run_ended(&fx.runtime, &run_ended(&message.id, RunStatus::Timeout)).await.is_none());
        assert!(handle_run_ended(&fx.runtime, &run_ended(&message.id, RunStatus::Started)).await.is_none());

        let mut no_room = run_ended(&message.id, RunStatus::Completed);
        no_room.room_id = None;
        assert!(handle_run_ended(&fx.runtime, &no_room).await.is_none());

        let missing = run_ended(&RecordId::from("does-not-exist"), RunStatus::Completed);
        assert!(handle_run_ended(&fx.runtime, &missing).await.is_none());

        assert!(fx.store.records(Table::ToonContext).await.is_empty());
    }

    #[tokio::test]
    async fn short_and_derived_messages_are_skipped() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let short = fx.say(USER, "ok", 0).await;
        assert!(handle_run_ended(&fx.runtime, &run_ended(&short.id, RunStatus::Completed)).await.is_none());

        let mut derived = MessageRecord::dialogue(USER.into(), ROOM.into(), "[1]{sender,text}:\n  u,hello");
        derived.source = Some(CONTEXT_SOURCE.into());
        fx.store.create_record(derived.clone(), Table::Messages).await.unwrap();
        assert!(handle_run_ended(&fx.runtime, &run_ended(&derived.id, RunStatus::Completed)).await.is_none());

        assert!(fx.store.records(Table::ToonContext).await.is_empty());
    }

    #[tokio::test]
    async fn disabled_embedding_does_nothing() {
        let mut fx = Fixture::new(ChannelKind::Group).await;
        fx.runtime.settings.embedding.enabled = false;
        let message = fx.say(USER, "a perfectly long message", 0).await;

        assert!(handle_run_ended(&fx.runtime, &run_ended(&message.id, RunStatus::Completed)).await.is_none());
        assert!(fx.store.records(Table::ToonContext).await.is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let message = fx.say(USER, "a perfectly long message", 0).await;
        fx.store.set_unavailable(true).await;

        assert!(handle_run_ended(&fx.runtime, &run_ended(&message.id, RunStatus::Completed)).await.is_none());
    }

    #[test]
    fn completion_handler_accepts_any_record() {
        handle_embedding_completed(&EmbeddingCompletedEvent { record: None });

        let mut record = MessageRecord::dialogue(USER.into(), ROOM.into(), "[1]{a}:\n  1");
        record.source = Some(CONTEXT_SOURCE.into());
        record.embedding = Some(vec![0.0; 8]);
        handle_embedding_completed(&EmbeddingCompletedEvent {
            record: Some(record),
        });
    }
}
