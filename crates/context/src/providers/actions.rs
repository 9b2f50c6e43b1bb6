//! Response actions available for the current message.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

use toonctx_core::action::{Action, ActionExample, State};
use toonctx_core::record::MessageRecord;

use super::{join_sections, table_section};
use crate::formatter::{add_header, truncate_chars};
use crate::provider::{ContextProvider, ProviderResult};
use crate::runtime::HostRuntime;

pub const NAME: &str = "ACTIONS";

/// Validates every registered action and lists the ones that apply.
pub struct ActionsProvider;

#[async_trait]
impl ContextProvider for ActionsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Compact list of the actions available for this message"
    }

    fn position(&self) -> i32 {
        -1
    }

    async fn get(&self, runtime: &HostRuntime, message: &MessageRecord, state: &State) -> ProviderResult {
        let available = available_actions(runtime, message, state).await;
        if available.is_empty() {
            return empty_result();
        }
        let settings = &runtime.settings.actions;

        let rows = available
            .iter()
            .map(|a| json!({"name": a.name(), "desc": truncate_chars(a.description(), settings.description_chars)}))
            .collect();
        let table = table_section(runtime, "# Actions (TOON)", rows);

        let names = available.iter().map(|a| a.name()).collect::<Vec<_>>().join(", ");
        let described = available
            .iter()
            .map(|a| format!("- **{}**: {}", a.name(), a.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let examples = add_header(
            "# Action Examples",
            &compose_examples(&available, settings.example_count, &runtime.agent_name),
        );

        let data: Vec<Value> = available
            .iter()
            .map(|a| json!({"name": a.name(), "description": a.description()}))
            .collect();

        ProviderResult::new(join_sections([table.as_str(), examples.as_str()]))
            .with_value("actionNames", format!("Possible response actions: {names}"))
            .with_value("actionsWithDescriptions", add_header("# Available Actions", &described))
            .with_value("actionExamples", examples)
            .with_data("actionsData", Value::Array(data))
    }
}

fn empty_result() -> ProviderResult {
    ProviderResult::default()
        .with_value("actionNames", "")
        .with_value("actionsWithDescriptions", "")
        .with_value("actionExamples", "")
        .with_data("actionsData", Value::Array(Vec::new()))
}

/// Actions whose validator accepts the message, in registration order.
/// A failing validator counts as a rejection.
async fn available_actions(
    runtime: &HostRuntime,
    message: &MessageRecord,
    state: &State,
) -> Vec<Arc<dyn Action>> {
    let checks = runtime.actions.actions().iter().map(|action| async move {
        match action.validate(message, state).await {
            Ok(true) => Some(Arc::clone(action)),
            Ok(false) => None,
            Err(e) => {
                warn!(action = action.name(), error = %e, "Action validation failed");
                None
            }
        }
    });

    let available: Vec<Arc<dyn Action>> = join_all(checks).await.into_iter().flatten().collect();
    debug!(
        registered = runtime.actions.len(),
        available = available.len(),
        "Validated actions"
    );
    available
}

/// Render up to `limit` example exchanges, taking one example per action
/// in turn until the limit or the examples run out.
fn compose_examples(actions: &[Arc<dyn Action>], limit: usize, agent_name: &str) -> String {
    let mut picked: Vec<&[ActionExample]> = Vec::new();
    let mut round = 0;
    while picked.len() < limit {
        let mut any = false;
        for action in actions {
            if let Some(example) = action.examples().get(round) {
                any = true;
                if picked.len() < limit {
                    picked.push(example);
                }
            }
        }
        if !any {
            break;
        }
        round += 1;
    }

    picked
        .iter()
        .map(|turns| {
            turns
                .iter()
                .map(|turn| {
                    let mut line = format!(
                        "{}: {}",
                        fill_names(&turn.name, agent_name),
                        fill_names(&turn.text, agent_name)
                    );
                    if !turn.actions.is_empty() {
                        line.push_str(&format!(" (actions: {})", turn.actions.join(", ")));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Replace `{{agentName}}` and `{{nameN}}` placeholders.
fn fill_names(text: &str, agent_name: &str) -> String {
    let mut out = text.replace("{{agentName}}", agent_name);
    for n in 1..=9 {
        let placeholder = format!("{{{{name{n}}}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &format!("User{n}"));
        }
    }
    out
}
