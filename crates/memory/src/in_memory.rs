//! In-memory record store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use toonctx_core::error::HostError;
use toonctx_core::host::{RecordStore, SimilarityQuery, Table};
use toonctx_core::record::{
    EntityId, EntityRecord, FactRecord, MessageRecord, RecordId, RoomId, RoomMetadata,
};

use crate::vector::search_facts;

struct RoomEntry {
    metadata: RoomMetadata,
    participants: Vec<EntityId>,
}

#[derive(Default)]
struct StoreState {
    rooms: HashMap<RoomId, RoomEntry>,
    entities: HashMap<EntityId, EntityRecord>,
    records: Vec<(Table, MessageRecord)>,
    facts: Vec<FactRecord>,
    unavailable: bool,
}

impl StoreState {
    fn check(&self) -> Result<(), HostError> {
        if self.unavailable {
            return Err(HostError::Store("in-memory store marked unavailable".into()));
        }
        Ok(())
    }

    /// Records matching `filter`, oldest first, keeping the newest `limit`.
    fn newest<F>(&self, table: Table, limit: usize, filter: F) -> Vec<MessageRecord>
    where
        F: Fn(&MessageRecord) -> bool,
    {
        let mut matching: Vec<MessageRecord> = self
            .records
            .iter()
            .filter(|(t, r)| *t == table && filter(r))
            .map(|(_, r)| r.clone())
            .collect();
        // Stable: records stamped at the same instant keep insertion order.
        matching.sort_by_key(|r| r.created_at_millis());
        let skip = matching.len().saturating_sub(limit);
        matching.split_off(skip)
    }
}

/// A record store that keeps rooms, participants, messages and facts in
/// memory. Facts carry their own embeddings for similarity search.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room, replacing any previous metadata.
    pub async fn add_room(&self, metadata: RoomMetadata) {
        let mut state = self.state.write().await;
        let participants = state
            .rooms
            .remove(&metadata.id)
            .map(|entry| entry.participants)
            .unwrap_or_default();
        state.rooms.insert(
            metadata.id.clone(),
            RoomEntry {
                metadata,
                participants,
            },
        );
    }

    /// Add an entity to a registered room.
    pub async fn add_participant(
        &self,
        room: &RoomId,
        entity: EntityRecord,
    ) -> Result<(), HostError> {
        let mut state = self.state.write().await;
        let entry = state
            .rooms
            .get_mut(room)
            .ok_or_else(|| HostError::RoomNotFound(room.to_string()))?;
        if !entry.participants.contains(&entity.id) {
            entry.participants.push(entity.id.clone());
        }
        state.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    pub async fn add_fact(&self, fact: FactRecord) {
        self.state.write().await.facts.push(fact);
    }

    /// Every record of `table` in insertion order.
    pub async fn records(&self, table: Table) -> Vec<MessageRecord> {
        self.state
            .read()
            .await
            .records
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Make every subsequent call fail with [`HostError::Store`].
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn ordered_records(
        &self,
        room: &RoomId,
        table: Table,
        limit: usize,
        unique_only: bool,
    ) -> Result<Vec<MessageRecord>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        let mut records = state.newest(table, usize::MAX, |r| &r.room_id == room);

        if unique_only {
            let mut seen = HashSet::new();
            records.retain(|r| r.text.is_none() || seen.insert(r.text_or_empty().to_string()));
        }

        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }

    async fn records_across_rooms(
        &self,
        rooms: &[RoomId],
        table: Table,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        Ok(state.newest(table, limit, |r| rooms.contains(&r.room_id)))
    }

    async fn rooms_shared_by(&self, a: &EntityId, b: &EntityId) -> Result<Vec<RoomId>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        let mut rooms: Vec<RoomId> = state
            .rooms
            .iter()
            .filter(|(_, entry)| entry.participants.contains(a) && entry.participants.contains(b))
            .map(|(id, _)| id.clone())
            .collect();
        rooms.sort();
        Ok(rooms)
    }

    async fn search_by_similarity(
        &self,
        query: SimilarityQuery,
    ) -> Result<Vec<FactRecord>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        if query.table != Table::Facts {
            return Ok(Vec::new());
        }

        Ok(search_facts(&state.facts, &query))
    }

    async fn room(&self, room: &RoomId) -> Result<Option<RoomMetadata>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        Ok(state.rooms.get(room).map(|entry| entry.metadata.clone()))
    }

    async fn entities_for_room(&self, room: &RoomId) -> Result<Vec<EntityRecord>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        let Some(entry) = state.rooms.get(room) else {
            return Ok(Vec::new());
        };
        Ok(entry
            .participants
            .iter()
            .filter_map(|id| state.entities.get(id).cloned())
            .collect())
    }

    async fn record_by_id(&self, id: &RecordId) -> Result<Option<MessageRecord>, HostError> {
        let state = self.state.read().await;
        state.check()?;
        Ok(state
            .records
            .iter()
            .find(|(_, r)| &r.id == id)
            .map(|(_, r)| r.clone()))
    }

    async fn create_record(
        &self,
        mut record: MessageRecord,
        table: Table,
    ) -> Result<RecordId, HostError> {
        let mut state = self.state.write().await;
        state.check()?;
        if record.created_at.is_none() {
            record.created_at = Some(Utc::now());
        }
        let id = record.id.clone();
        debug!(table = table.as_str(), id = %id, "Storing record");

        if table == Table::Facts {
            let text = record.text_or_empty().to_string();
            state.facts.push(FactRecord {
                id: record.id,
                entity_id: Some(record.entity_id),
                room_id: Some(record.room_id),
                world_id: record.world_id,
                created_at: record.created_at,
                embedding: record.embedding,
                ..FactRecord::new(text)
            });
        } else {
            state.records.push((table, record));
        }
        Ok(id)
    }
}
