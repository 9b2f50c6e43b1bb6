//! Shared fixtures for provider tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use toonctx_core::host::{EmbeddingService, RecordStore, Table};
use toonctx_core::record::{
    ActionOutcome, ChannelKind, EntityId, EntityRecord, MessageRecord, RoomId, RoomMetadata,
};
use toonctx_memory::{HashingEmbedder, InMemoryStore};

use crate::runtime::HostRuntime;

pub const ROOM: &str = "room-5f2a9c11";
pub const AGENT: &str = "agent-7d41e0b2";
pub const USER: &str = "user-3b88c5d4";

/// A room with the agent and one named user.
pub struct Fixture {
    pub store: InMemoryStore,
    pub runtime: HostRuntime,
}

impl Fixture {
    pub async fn new(channel: ChannelKind) -> Self {
        Self::with_embedder(channel, Arc::new(HashingEmbedder::default())).await
    }

    pub async fn with_embedder(channel: ChannelKind, embedder: Arc<dyn EmbeddingService>) -> Self {
        let store = InMemoryStore::new();
        store
            .add_room(RoomMetadata {
                id: ROOM.into(),
                channel,
                name: Some("general".into()),
            })
            .await;
        store
            .add_participant(&ROOM.into(), EntityRecord::new(AGENT.into(), "Eliza").with_role("agent"))
            .await
            .unwrap();
        store
            .add_participant(&ROOM.into(), EntityRecord::new(USER.into(), "Alice"))
            .await
            .unwrap();

        let runtime = HostRuntime::new(AGENT.into(), "Eliza", Arc::new(store.clone()), embedder);
        Self { store, runtime }
    }

    /// Store a dialogue line `seconds` after the fixture epoch.
    pub async fn say(&self, entity: &str, text: &str, seconds: i64) -> MessageRecord {
        let record = MessageRecord::dialogue(entity.into(), ROOM.into(), text).with_created_at(at(seconds));
        self.store.create_record(record.clone(), Table::Messages).await.unwrap();
        record
    }

    /// Store an action result belonging to `run_id`.
    pub async fn act(&self, run_id: &str, action: &str, thought: Option<&str>, seconds: i64) {
        let record = MessageRecord::action_result(
            AGENT.into(),
            ROOM.into(),
            ActionOutcome {
                run_id: Some(run_id.into()),
                action_name: Some(action.into()),
                action_status: Some("completed".into()),
                plan_thought: thought.map(String::from),
            },
        )
        .with_created_at(at(seconds));
        self.store.create_record(record, Table::Messages).await.unwrap();
    }
}

/// 2025-01-01T12:00:00Z plus `seconds`.
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
}

/// An incoming message from the fixture user, not yet stored.
pub fn incoming(text: &str) -> MessageRecord {
    MessageRecord::dialogue(EntityId::from(USER), RoomId::from(ROOM), text).with_created_at(at(3600))
}
