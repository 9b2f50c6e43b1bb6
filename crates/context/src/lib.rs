//! # toonctx Context
//!
//! Turns host records into compact prompt sections.
//!
//! - [`formatter`] labels and caps arbitrary values for a prompt
//! - [`providers`] hold the four assemblers: conversation, facts, entities
//!   and actions
//! - [`events`] derive embeddable context records after each run
//!
//! Every assembler receives a [`HostRuntime`] carrying the store, the
//! embedding service, the action registry and settings. Assemblers never
//! fail: host errors are logged and turned into an empty result with
//! `data.error` set.

pub mod events;
pub mod formatter;
pub mod provider;
pub mod providers;
pub mod runtime;
pub mod token;

pub use events::{handle_embedding_completed, handle_run_ended};
pub use formatter::{FormattedContext, add_header, format_for_llm, format_serializable};
pub use provider::{ContextProvider, ProviderResult, default_providers};
pub use providers::{ActionsProvider, ConversationProvider, EntitiesProvider, FactsProvider};
pub use runtime::HostRuntime;
pub use token::estimate_tokens;
