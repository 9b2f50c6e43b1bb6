//! The people present in the current room.

use async_trait::async_trait;
use serde_json::{Value, json};

use toonctx_core::action::State;
use toonctx_core::error::HostError;
use toonctx_core::record::{EntityRecord, MessageRecord};

use super::{table_section, to_data};
use crate::provider::{ContextProvider, ProviderResult, guarded};
use crate::runtime::HostRuntime;

pub const NAME: &str = "ENTITIES";

pub struct EntitiesProvider;

#[async_trait]
impl ContextProvider for EntitiesProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Compact list of the people in the current room"
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
        .with_value("entities", "")
        .with_value("senderName", "")
        .with_data("entitiesData", Value::Array(Vec::new()))
        .with_data("senderName", Value::Null)
}

async fn assemble(runtime: &HostRuntime, message: &MessageRecord) -> Result<ProviderResult, HostError> {
    let entities = runtime.store.entities_for_room(&message.room_id).await?;
    if entities.is_empty() {
        return Ok(empty_result());
    }

    let settings = &runtime.settings.entities;
    let sender_name = entities
        .iter()
        .find(|e| e.id == message.entity_id)
        .and_then(EntityRecord::primary_name)
        .map(String::from);

    let rows = entities
        .iter()
        .map(|e| {
            json!({
                "name": e.primary_name().unwrap_or("Unknown"),
                "id": e.id.short(settings.id_chars),
                "role": e.role.as_deref().unwrap_or(&settings.default_role),
            })
        })
        .collect();
    let text = table_section(runtime, "# People in Room (TOON)", rows);

    Ok(ProviderResult::new(text)
        .with_value("entities", format_entities(&entities))
        .with_value("senderName", sender_name.clone().unwrap_or_default())
        .with_data("entitiesData", to_data(&entities))
        .with_data("senderName", sender_name.map_or(Value::Null, Value::from)))
}

fn format_entities(entities: &[EntityRecord]) -> String {
    entities
        .iter()
        .map(|e| {
            let mut block = format!("\"{}\"\nID: {}", e.primary_name().unwrap_or("Unknown"), e.id);
            if e.names.len() > 1 {
                block.push_str(&format!("\nAliases: {}", e.names[1..].join(", ")));
            }
            if let Some(role) = &e.role {
                block.push_str(&format!("\nRole: {role}"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}
