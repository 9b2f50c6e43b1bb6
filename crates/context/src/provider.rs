//! The provider contract shared by every assembler.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::error;

use toonctx_core::action::State;
use toonctx_core::error::HostError;
use toonctx_core::event::DomainEvent;
use toonctx_core::record::MessageRecord;

use crate::providers::{ActionsProvider, ConversationProvider, EntitiesProvider, FactsProvider};
use crate::runtime::HostRuntime;

/// What an assembler hands back to the host's prompt composer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderResult {
    /// Prompt text; empty when there is nothing to add.
    pub text: String,

    /// Template values, mostly plain-format renderings.
    pub values: Map<String, Value>,

    /// Structured data for downstream consumers.
    pub data: Map<String, Value>,
}

impl ProviderResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Whether the assembler failed and fell back to this result.
    pub fn is_error(&self) -> bool {
        self.data.get("error").and_then(Value::as_bool).unwrap_or(false)
    }

    fn into_error(self) -> Self {
        self.with_data("error", true)
    }
}

/// A named source of prompt context.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Unique provider name (e.g., "FACTS").
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Ordering hint for the host's composer; lower runs first.
    fn position(&self) -> i32 {
        0
    }

    /// Dynamic providers only run when the host explicitly asks for them.
    fn dynamic(&self) -> bool {
        false
    }

    /// Assemble context for `message`. Never fails.
    async fn get(&self, runtime: &HostRuntime, message: &MessageRecord, state: &State) -> ProviderResult;
}

/// The four compact-context providers, in position order.
pub fn default_providers() -> Vec<Arc<dyn ContextProvider>> {
    let mut providers: Vec<Arc<dyn ContextProvider>> = vec![
        Arc::new(ConversationProvider),
        Arc::new(FactsProvider),
        Arc::new(EntitiesProvider),
        Arc::new(ActionsProvider),
    ];
    providers.sort_by_key(|p| p.position());
    providers
}

/// Run an assembly, turning any host failure into `empty` flagged with
/// `data.error`. The failure is logged and published on the event bus.
pub(crate) async fn guarded<F>(
    runtime: &HostRuntime,
    provider: &str,
    empty: ProviderResult,
    assembly: F,
) -> ProviderResult
where
    F: Future<Output = Result<ProviderResult, HostError>>,
{
    match assembly.await {
        Ok(result) => result,
        Err(e) => {
            error!(provider, error = %e, "Context assembly failed");
            runtime.events.publish(DomainEvent::ContextAssemblyFailed {
                provider: provider.to_string(),
                error_message: e.to_string(),
                timestamp: Utc::now(),
            });
            empty.into_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_values_and_data() {
        let result = ProviderResult::new("# Facts")
            .with_value("facts", "a\nb")
            .with_data("count", 2);
        assert_eq!(result.text, "# Facts");
        assert_eq!(result.values["facts"], "a\nb");
        assert_eq!(result.data["count"], 2);
        assert!(!result.is_error());
    }

    #[test]
    fn error_flag_is_detected() {
        assert!(ProviderResult::default().into_error().is_error());
    }

    #[test]
    fn default_providers_are_ordered_by_position() {
        let providers = default_providers();
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["ACTIONS", "FACTS", "ENTITIES", "RECENT_MESSAGES"]);

        let dynamic: Vec<&str> = providers
            .iter()
            .filter(|p| p.dynamic())
            .map(|p| p.name())
            .collect();
        assert_eq!(dynamic, vec!["FACTS", "ENTITIES"]);
    }
}
