//! # toonctx Core
//!
//! Domain records, host capability traits, and error definitions for the
//! toonctx context pipeline. This crate has **no codec logic**; it defines
//! the shapes the host runtime hands to the core, and the traits through
//! which the core calls back into the host.
//!
//! ## Design Philosophy
//!
//! Every host collaborator is a trait here. Implementations live in the
//! host (or in `toonctx-memory` for tests and demos). This enables:
//! - Running the assemblers without a real agent runtime
//! - Explicit, read-only registries instead of ambient globals
//! - Clean dependency graph (all crates depend inward on core)

pub mod action;
pub mod error;
pub mod event;
pub mod host;
pub mod record;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ActionExample, ActionRegistry, State};
pub use error::{Error, HostError, Result};
pub use event::{
    DomainEvent, EmbeddingCompletedEvent, EmbeddingPriority, EventBus, RunEndedEvent, RunStatus,
};
pub use host::{EmbeddingService, RecordStore, SimilarityQuery, Table};
pub use record::{
    ActionOutcome, ChannelKind, EntityId, EntityRecord, FactRecord, MessageRecord, RecordId,
    RecordKind, RoomId, RoomMetadata, WorldId,
};
