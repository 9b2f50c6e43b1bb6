//! Action trait: the response actions a host runtime can perform.
//!
//! Actions live in the runtime's registry; the core only asks each one
//! whether it applies to the current message and renders the survivors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::HostError;
use crate::record::MessageRecord;

/// Composed prompt state handed to action validators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub values: serde_json::Map<String, serde_json::Value>,

    /// Free-form text composed by earlier providers.
    #[serde(default)]
    pub text: String,
}

/// One turn of an example exchange showing an action in use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionExample {
    /// Speaker placeholder, e.g. `{{name1}}`.
    pub name: String,
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

/// The core Action trait.
#[async_trait]
pub trait Action: Send + Sync {
    /// Unique action name (e.g., "REPLY").
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Alternative names that trigger this action.
    fn similes(&self) -> &[String] {
        &[]
    }

    /// Example conversations, each a sequence of turns.
    fn examples(&self) -> &[Vec<ActionExample>] {
        &[]
    }

    /// Whether the action is available for this message. May fail.
    async fn validate(&self, message: &MessageRecord, state: &State) -> Result<bool, HostError>;
}

/// The runtime's action registry, in registration order.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Register an action. Replaces any existing action with the same name.
    pub fn register(&mut self, action: Arc<dyn Action>) {
        match self.actions.iter().position(|a| a.name() == action.name()) {
            Some(i) => self.actions[i] = action,
            None => self.actions.push(action),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
