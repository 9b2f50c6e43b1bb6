//! Facts relevant to the current conversation.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::debug;

use toonctx_core::action::State;
use toonctx_core::error::HostError;
use toonctx_core::host::{SimilarityQuery, Table};
use toonctx_core::record::{FactRecord, MessageRecord};

use super::{table_section, to_data};
use crate::provider::{ContextProvider, ProviderResult, guarded};
use crate::runtime::HostRuntime;

pub const NAME: &str = "FACTS";

/// Looks up stored facts similar to the last few turns.
pub struct FactsProvider;

#[async_trait]
impl ContextProvider for FactsProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Compact known facts about the people in the conversation"
    }

    fn dynamic(&self) -> bool {
        true
    }

    async fn get(&self, runtime: &HostRuntime, message: &MessageRecord, _state: &State) -> ProviderResult {
        guarded(runtime, NAME, empty_result(), assemble(runtime, message)).await
    }
}

fn empty_result() -> ProviderResult {
    ProviderResult::default()
        .with_value("facts", "")
        .with_data("facts", Value::Array(Vec::new()))
}

async fn assemble(runtime: &HostRuntime, message: &MessageRecord) -> Result<ProviderResult, HostError> {
    let settings = &runtime.settings.facts;
    let room_id = &message.room_id;

    let recent = runtime
        .store
        .ordered_records(room_id, Table::Messages, settings.recent_message_count, false)
        .await?;

    let start = recent.len().saturating_sub(settings.embedding_turns);
    let query_text = recent[start..]
        .iter()
        .map(MessageRecord::text_or_empty)
        .collect::<Vec<_>>()
        .join("\n");
    if query_text.trim().is_empty() {
        debug!(room = %room_id, "No recent text to look up facts for");
        return Ok(empty_result());
    }

    let embedding = runtime.embeddings.embed(&query_text).await?;

    let base = SimilarityQuery {
        room_id: Some(room_id.clone()),
        query_text: message.text.clone(),
        ..SimilarityQuery::facts(embedding, settings.search_count)
    };
    let by_world = SimilarityQuery {
        world_id: message.world_id.clone(),
        ..base.clone()
    };
    let by_sender = SimilarityQuery {
        entity_id: Some(message.entity_id.clone()),
        ..base
    };

    let (world_facts, sender_facts) = tokio::try_join!(
        runtime.store.search_by_similarity(by_world),
        runtime.store.search_by_similarity(by_sender),
    )?;

    let facts = dedupe(world_facts.into_iter().chain(sender_facts));
    if facts.is_empty() {
        return Ok(empty_result());
    }

    let rows = facts
        .iter()
        .rev()
        .map(|f| json!({"fact": f.text, "conf": f.confidence_percent()}))
        .collect();
    let text = table_section(runtime, "# Known Facts (TOON)", rows);

    let plain = facts.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join("\n");

    debug!(count = facts.len(), "Assembled facts");
    Ok(ProviderResult::new(text)
        .with_value("facts", plain)
        .with_data("facts", to_data(&facts)))
}

/// Keep the first occurrence of every fact id.
fn dedupe(facts: impl IntoIterator<Item = FactRecord>) -> Vec<FactRecord> {
    let mut seen = HashSet::new();
    facts
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect()
}
