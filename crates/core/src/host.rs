//! Host capability traits: what the core needs from the agent runtime.
//!
//! The runtime owns storage, embeddings and room bookkeeping. The core only
//! calls through these traits, so assemblers can be exercised against the
//! in-memory implementations in `toonctx-memory`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::record::{
    EntityId, EntityRecord, FactRecord, MessageRecord, RecordId, RoomId, RoomMetadata, WorldId,
};

/// Logical tables the host keeps records in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Messages,
    Facts,
    /// Derived, compact-encoded context records queued for embedding.
    ToonContext,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Messages => "messages",
            Table::Facts => "facts",
            Table::ToonContext => "toon_context",
        }
    }
}

/// A vector similarity search over the fact table.
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub table: Table,
    pub embedding: Vec<f32>,
    /// Free-text query passed along for hosts doing hybrid search.
    pub query_text: Option<String>,
    pub room_id: Option<RoomId>,
    pub world_id: Option<WorldId>,
    pub entity_id: Option<EntityId>,
    pub limit: usize,
}

impl SimilarityQuery {
    pub fn facts(embedding: Vec<f32>, limit: usize) -> Self {
        Self {
            table: Table::Facts,
            embedding,
            query_text: None,
            room_id: None,
            world_id: None,
            entity_id: None,
            limit,
        }
    }
}

/// Record storage owned by the host runtime.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The store name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// The most recent `limit` records of a room, oldest first.
    async fn ordered_records(
        &self,
        room: &RoomId,
        table: Table,
        limit: usize,
        unique_only: bool,
    ) -> Result<Vec<MessageRecord>, HostError>;

    /// The most recent `limit` records across several rooms, oldest first.
    async fn records_across_rooms(
        &self,
        rooms: &[RoomId],
        table: Table,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, HostError>;

    /// Rooms in which both entities participate.
    async fn rooms_shared_by(&self, a: &EntityId, b: &EntityId) -> Result<Vec<RoomId>, HostError>;

    /// Facts ranked by similarity to the query embedding, best first.
    async fn search_by_similarity(
        &self,
        query: SimilarityQuery,
    ) -> Result<Vec<FactRecord>, HostError>;

    async fn room(&self, room: &RoomId) -> Result<Option<RoomMetadata>, HostError>;

    async fn entities_for_room(&self, room: &RoomId) -> Result<Vec<EntityRecord>, HostError>;

    async fn record_by_id(&self, id: &RecordId) -> Result<Option<MessageRecord>, HostError>;

    async fn create_record(&self, record: MessageRecord, table: Table) -> Result<RecordId, HostError>;
}

/// Text embedding capability.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed `text`. Fails with [`HostError::Embedding`] on empty text or
    /// when the backing service is unavailable.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, HostError>;
}
