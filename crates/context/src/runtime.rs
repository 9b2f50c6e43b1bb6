//! The host runtime handle passed to every assembler.
//!
//! Collaborators are handed over explicitly instead of living in globals,
//! so a test can assemble context against in-memory doubles.

use std::sync::Arc;

use toonctx_codec::EncodeOptions;
use toonctx_config::AppConfig;
use toonctx_core::action::ActionRegistry;
use toonctx_core::event::EventBus;
use toonctx_core::host::{EmbeddingService, RecordStore};
use toonctx_core::record::EntityId;

/// Everything an assembler may call into. Cheap to clone.
#[derive(Clone)]
pub struct HostRuntime {
    /// The agent's own entity id.
    pub agent_id: EntityId,
    pub agent_name: String,
    pub store: Arc<dyn RecordStore>,
    pub embeddings: Arc<dyn EmbeddingService>,
    pub actions: ActionRegistry,
    pub settings: AppConfig,
    pub events: Arc<EventBus>,
}

impl HostRuntime {
    pub fn new(
        agent_id: EntityId,
        agent_name: impl Into<String>,
        store: Arc<dyn RecordStore>,
        embeddings: Arc<dyn EmbeddingService>,
    ) -> Self {
        Self {
            agent_id,
            agent_name: agent_name.into(),
            store,
            embeddings,
            actions: ActionRegistry::new(),
            settings: AppConfig::default(),
            events: Arc::new(EventBus::default()),
        }
    }

    pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_settings(mut self, settings: AppConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Share an event bus with the host.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    /// How many recent messages make up "the conversation".
    pub fn conversation_length(&self) -> usize {
        self.settings.conversation.conversation_length
    }

    /// Options for the tab-delimited sections embedded in prompts.
    pub fn context_options(&self) -> EncodeOptions {
        self.settings.codec.context_options()
    }

    pub fn is_agent(&self, entity: &EntityId) -> bool {
        *entity == self.agent_id
    }
}

impl std::fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRuntime")
            .field("agent_id", &self.agent_id)
            .field("agent_name", &self.agent_name)
            .field("store", &self.store.name())
            .field("actions", &self.actions.names())
            .finish_non_exhaustive()
    }
}
