//! Recent conversation, action runs and the message being answered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;

use toonctx_core::action::State;
use toonctx_core::error::HostError;
use toonctx_core::host::Table;
use toonctx_core::record::{EntityId, EntityRecord, MessageRecord, RoomId};

use super::{join_sections, table_section, to_data};
use crate::formatter::{add_header, truncate_chars};
use crate::provider::{ContextProvider, ProviderResult, guarded};
use crate::runtime::HostRuntime;

pub const NAME: &str = "RECENT_MESSAGES";

const UNKNOWN_RUN: &str = "unknown";

/// Recent dialogue as a compact table, plus recent action runs and a focus
/// instruction for the incoming message.
pub struct ConversationProvider;

#[async_trait]
impl ContextProvider for ConversationProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Compact recent messages, interactions and action results"
    }

    fn position(&self) -> i32 {
        100
    }

    async fn get(&self, runtime: &HostRuntime, message: &MessageRecord, _state: &State) -> ProviderResult {
        guarded(runtime, NAME, empty_result(String::new()), assemble(runtime, message)).await
    }
}

fn empty_result(action_results: String) -> ProviderResult {
    ProviderResult::default()
        .with_value("recentPosts", "")
        .with_value("recentMessages", "")
        .with_value("recentMessageInteractions", "")
        .with_value("recentPostInteractions", "")
        .with_value("recentInteractions", "")
        .with_value("recentActionResults", action_results)
        .with_data("recentMessages", Value::Array(Vec::new()))
        .with_data("recentInteractions", Value::Array(Vec::new()))
        .with_data("actionResults", Value::Array(Vec::new()))
}

async fn assemble(runtime: &HostRuntime, message: &MessageRecord) -> Result<ProviderResult, HostError> {
    let store = runtime.store.as_ref();
    let room_id = &message.room_id;

    let (entities, room, recent, interactions) = tokio::try_join!(
        store.entities_for_room(room_id),
        store.room(room_id),
        store.ordered_records(room_id, Table::Messages, runtime.conversation_length(), false),
        recent_interactions(runtime, &message.entity_id, room_id),
    )?;

    let (action_results, dialogue): (Vec<MessageRecord>, Vec<MessageRecord>) =
        recent.into_iter().partition(MessageRecord::is_action_result);

    let names = Names::new(runtime, &entities);
    let is_post_format = room.is_some_and(|r| r.channel.is_post_format());

    let conversation = table_section(
        runtime,
        "# Conversation (TOON)",
        dialogue.iter().map(|m| compact_line(runtime, &names, m)).collect(),
    );
    let plain_messages = format_messages(&names, &dialogue);
    let recent_posts = add_header("# Posts in Thread", &format_posts(&names, &dialogue));
    let actions_text = add_header(
        "# Recent Actions",
        &format_action_runs(
            &action_results,
            runtime.settings.conversation.max_action_runs,
            runtime.settings.conversation.run_id_chars,
        ),
    );

    let received = message.text_or_empty();
    if recent_posts.is_empty() && conversation.is_empty() && dialogue.is_empty() && received.is_empty() {
        return Ok(empty_result(actions_text).with_data("actionResults", to_data(&action_results)));
    }

    let recent_message = dialogue
        .iter()
        .max_by_key(|m| m.created_at_millis())
        .map(|m| format_messages(&names, std::slice::from_ref(m)))
        .unwrap_or_default();

    let sender = sender_name(&entities, message);
    let (received_header, focus_header) = if received.trim().is_empty() {
        (String::new(), String::new())
    } else {
        (
            add_header("# Received Message", &format!("{sender}: {received}")),
            add_header(
                "# Focus",
                &format!("Reply to the above message from **{sender}**. Keep response relevant."),
            ),
        )
    };

    let interaction_lines = interactions
        .iter()
        .map(|m| format!("{}: {}", names.interaction(&m.entity_id), m.text_or_empty()))
        .collect::<Vec<_>>()
        .join("\n");

    let text = join_sections([
        if is_post_format { recent_posts.as_str() } else { conversation.as_str() },
        actions_text.as_str(),
        received_header.as_str(),
        focus_header.as_str(),
    ]);

    Ok(ProviderResult::new(text)
        .with_value("recentPosts", recent_posts)
        .with_value("recentMessages", plain_messages)
        .with_value("recentMessageInteractions", interaction_lines.clone())
        .with_value("recentPostInteractions", interaction_lines.clone())
        .with_value("recentInteractions", interaction_lines)
        .with_value("recentActionResults", actions_text)
        .with_value("recentMessage", recent_message)
        .with_data("recentMessages", to_data(&dialogue))
        .with_data("recentInteractions", to_data(&interactions))
        .with_data("actionResults", to_data(&action_results)))
}

/// Records the sender and the agent exchanged in other rooms. Empty when
/// the agent is talking to itself.
async fn recent_interactions(
    runtime: &HostRuntime,
    sender: &EntityId,
    current_room: &RoomId,
) -> Result<Vec<MessageRecord>, HostError> {
    if runtime.is_agent(sender) {
        return Ok(Vec::new());
    }
    let rooms: Vec<RoomId> = runtime
        .store
        .rooms_shared_by(sender, &runtime.agent_id)
        .await?
        .into_iter()
        .filter(|room| room != current_room)
        .collect();
    if rooms.is_empty() {
        return Ok(Vec::new());
    }
    runtime
        .store
        .records_across_rooms(&rooms, Table::Messages, runtime.settings.conversation.cross_room_limit)
        .await
}

/// Display names for the room's participants.
struct Names<'a> {
    agent_id: &'a EntityId,
    agent_name: &'a str,
    by_id: HashMap<&'a EntityId, &'a str>,
}

impl<'a> Names<'a> {
    fn new(runtime: &'a HostRuntime, entities: &'a [EntityRecord]) -> Self {
        Self {
            agent_id: &runtime.agent_id,
            agent_name: &runtime.agent_name,
            by_id: entities
                .iter()
                .map(|e| (&e.id, e.primary_name().unwrap_or("Unknown")))
                .collect(),
        }
    }

    fn lookup(&self, entity: &EntityId, unknown: &'a str) -> &str {
        if entity == self.agent_id {
            return self.agent_name;
        }
        self.by_id.get(entity).copied().unwrap_or(unknown)
    }

    fn dialogue(&self, entity: &EntityId) -> &str {
        self.lookup(entity, "Unknown")
    }

    fn interaction(&self, entity: &EntityId) -> &str {
        self.lookup(entity, "unknown")
    }
}

fn compact_line(runtime: &HostRuntime, names: &Names<'_>, message: &MessageRecord) -> Value {
    json!({
        "from": names.dialogue(&message.entity_id),
        "text": truncate_chars(message.text_or_empty(), runtime.settings.conversation.max_message_chars),
        "time": timestamp(message).format("%H:%M:%S").to_string(),
    })
}

fn timestamp(message: &MessageRecord) -> DateTime<Utc> {
    message.created_at.unwrap_or_else(Utc::now)
}

fn format_messages(names: &Names<'_>, messages: &[MessageRecord]) -> String {
    messages
        .iter()
        .filter(|m| !m.text_or_empty().is_empty())
        .map(|m| format!("{}: {}", names.dialogue(&m.entity_id), m.text_or_empty()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_posts(names: &Names<'_>, messages: &[MessageRecord]) -> String {
    messages
        .iter()
        .filter(|m| !m.text_or_empty().is_empty())
        .map(|m| {
            format!(
                "{} ({}):\n{}",
                names.dialogue(&m.entity_id),
                timestamp(m).format("%Y-%m-%d %H:%M"),
                m.text_or_empty()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Group action results by run, keep the latest `max_runs` runs and list
/// each run's actions oldest first.
fn format_action_runs(results: &[MessageRecord], max_runs: usize, id_chars: usize) -> String {
    let mut runs: Vec<(&str, Vec<&MessageRecord>)> = Vec::new();
    for record in results {
        let run_id = record
            .action_outcome()
            .and_then(|o| o.run_id.as_deref())
            .unwrap_or(UNKNOWN_RUN);
        match runs.iter_mut().find(|(id, _)| *id == run_id) {
            Some((_, members)) => members.push(record),
            None => runs.push((run_id, vec![record])),
        }
    }

    let skip = runs.len().saturating_sub(max_runs);
    runs.into_iter()
        .skip(skip)
        .map(|(run_id, mut members)| {
            members.sort_by_key(|m| m.created_at_millis());
            let thought = members
                .first()
                .and_then(|m| m.action_outcome())
                .and_then(|o| o.plan_thought.as_deref())
                .filter(|t| !t.is_empty());
            let lines = members
                .iter()
                .filter_map(|m| m.action_outcome())
                .map(|o| {
                    format!(
                        "  - {} ({})",
                        o.action_name.as_deref().unwrap_or("Unknown"),
                        o.action_status.as_deref().unwrap_or("unknown")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            let short_id = truncate_chars(run_id, id_chars);
            match thought {
                Some(thought) => format!("**Run {short_id}** - \"{thought}\"\n{lines}"),
                None => format!("**Run {short_id}**\n{lines}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The incoming message's sender as shown in the focus instruction.
fn sender_name(entities: &[EntityRecord], message: &MessageRecord) -> String {
    entities
        .iter()
        .find(|e| e.id == message.entity_id)
        .and_then(EntityRecord::primary_name)
        .or(message.sender_name.as_deref())
        .unwrap_or("Unknown User")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_support::{AGENT, Fixture, ROOM, USER, at, incoming};
    use toonctx_core::host::RecordStore;
    use toonctx_core::record::{ActionOutcome, ChannelKind, EntityRecord, RoomMetadata};

    #[tokio::test]
    async fn dialogue_is_encoded_as_a_table() {
        let fx = Fixture::new(ChannelKind::Group).await;
        fx.say(USER, "hi there", 0).await;
        fx.say(AGENT, "hello Alice", 5).await;

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("how are you?"), &State::default())
            .await;

        assert!(result.text.starts_with(
            "# Conversation (TOON)\n[2\t]{from\ttext\ttime}:\n  Alice\thi there\t\"12:00:00\"\n  Eliza\thello Alice\t\"12:00:05\"\n"
        ));
        assert!(result.text.contains("# Received Message\nAlice: how are you?\n"));
        assert!(result.text.contains("Reply to the above message from **Alice**."));
        assert_eq!(result.values["recentMessages"], "Alice: hi there\nEliza: hello Alice");
        assert_eq!(result.values["recentMessage"], "Eliza: hello Alice");
        assert_eq!(result.data["recentMessages"].as_array().unwrap().len(), 2);
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn long_messages_are_cut() {
        let fx = Fixture::new(ChannelKind::Group).await;
        fx.say(USER, &"x".repeat(600), 0).await;

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("?"), &State::default())
            .await;

        let longest = result.text.lines().map(|l| l.matches('x').count()).max().unwrap();
        assert_eq!(longest, 500);
    }

    #[tokio::test]
    async fn action_runs_keep_the_latest_three() {
        let fx = Fixture::new(ChannelKind::Group).await;
        fx.act("run-aaaaaaaa-1", "SEARCH", Some("look it up"), 0).await;
        fx.act("run-bbbbbbbb-2", "REPLY", None, 10).await;
        fx.act("run-cccccccc-3", "FOLLOW_UP", None, 30).await;
        fx.act("run-cccccccc-3", "THINK", Some("plan first"), 20).await;
        fx.act("run-dddddddd-4", "MUTE", None, 40).await;

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("status?"), &State::default())
            .await;
        let actions = result.values["recentActionResults"].as_str().unwrap();

        assert!(!actions.contains("SEARCH"));
        assert_eq!(
            actions,
            "# Recent Actions\n\
             **Run run-bbbb**\n  - REPLY (completed)\n\n\
             **Run run-cccc** - \"plan first\"\n  - THINK (completed)\n  - FOLLOW_UP (completed)\n\n\
             **Run run-dddd**\n  - MUTE (completed)\n"
        );
        assert_eq!(result.data["actionResults"].as_array().unwrap().len(), 5);
        assert!(!result.text.contains("# Conversation (TOON)"));
    }

    #[tokio::test]
    async fn missing_run_id_groups_under_unknown() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let record = MessageRecord::action_result(AGENT.into(), ROOM.into(), ActionOutcome::default())
            .with_created_at(at(0));
        fx.store.create_record(record, Table::Messages).await.unwrap();

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("hm"), &State::default())
            .await;
        assert!(result.text.contains("**Run unknown**\n  - Unknown (unknown)"));
    }

    #[tokio::test]
    async fn threads_render_as_posts() {
        let fx = Fixture::new(ChannelKind::Thread).await;
        fx.say(USER, "first post", 0).await;

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("reply"), &State::default())
            .await;

        assert!(result.text.starts_with("# Posts in Thread\nAlice (2025-01-01 12:00):\nfirst post\n"));
        assert!(!result.text.contains("(TOON)"));
        assert_eq!(
            result.values["recentPosts"],
            "# Posts in Thread\nAlice (2025-01-01 12:00):\nfirst post\n"
        );
    }

    #[tokio::test]
    async fn empty_room_and_empty_message_yield_nothing() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let result = ConversationProvider
            .get(&fx.runtime, &incoming(""), &State::default())
            .await;

        assert_eq!(result.text, "");
        assert_eq!(result.values["recentMessages"], "");
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn unknown_sender_uses_platform_name() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let message = MessageRecord::dialogue("stranger".into(), ROOM.into(), "anyone here?")
            .with_sender_name("Bob");
        let result = ConversationProvider.get(&fx.runtime, &message, &State::default()).await;
        assert!(result.text.contains("# Received Message\nBob: anyone here?"));

        let anonymous = MessageRecord::dialogue("stranger".into(), ROOM.into(), "hello?");
        let result = ConversationProvider.get(&fx.runtime, &anonymous, &State::default()).await;
        assert!(result.text.contains("from **Unknown User**"));
    }

    #[tokio::test]
    async fn interactions_come_from_other_shared_rooms() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let dm: RoomId = "room-dm".into();
        fx.store
            .add_room(RoomMetadata {
                id: dm.clone(),
                channel: ChannelKind::Dm,
                name: None,
            })
            .await;
        fx.store
            .add_participant(&dm, EntityRecord::new(AGENT.into(), "Eliza"))
            .await
            .unwrap();
        fx.store
            .add_participant(&dm, EntityRecord::new(USER.into(), "Alice"))
            .await
            .unwrap();
        let private = MessageRecord::dialogue(AGENT.into(), dm, "see you tomorrow").with_created_at(at(1));
        fx.store.create_record(private, Table::Messages).await.unwrap();
        fx.say(USER, "in the main room", 2).await;

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("hi"), &State::default())
            .await;
        assert_eq!(result.values["recentInteractions"], "Eliza: see you tomorrow");
        assert_eq!(result.data["recentInteractions"].as_array().unwrap().len(), 1);

        // The agent's own messages never look up interactions.
        let own = MessageRecord::dialogue(AGENT.into(), ROOM.into(), "note to self");
        let result = ConversationProvider.get(&fx.runtime, &own, &State::default()).await;
        assert_eq!(result.values["recentInteractions"], "");
    }

    #[tokio::test]
    async fn store_failure_returns_error_result() {
        let fx = Fixture::new(ChannelKind::Group).await;
        let mut events = fx.runtime.events.subscribe();
        fx.store.set_unavailable(true).await;

        let result = ConversationProvider
            .get(&fx.runtime, &incoming("hello"), &State::default())
            .await;

        assert_eq!(result.text, "");
        assert!(result.is_error());
        assert_eq!(result.values["recentMessages"], "");
        assert_eq!(result.data["recentMessages"], Value::Array(Vec::new()));

        let event = events.recv().await.unwrap();
        assert!(matches!(
            event.as_ref(),
            toonctx_core::event::DomainEvent::ContextAssemblyFailed { provider, .. } if provider == NAME
        ));
    }
}
