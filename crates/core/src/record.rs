//! Context record types owned by the host runtime.
//!
//! The host stores loosely structured memories; the core only ever sees them
//! through this closed set of typed variants. Anything the host cannot map
//! onto these shapes is rejected at the boundary, before an assembler runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The first `n` characters, used for compact display.
            pub fn short(&self, n: usize) -> String {
                self.0.chars().take(n).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a stored record (message, fact, context record).
    RecordId
);
id_type!(
    /// Identifier of a participant: a user or the agent itself.
    EntityId
);
id_type!(
    /// Identifier of a room (channel, DM, thread).
    RoomId
);
id_type!(
    /// Identifier of a world (server / workspace grouping rooms).
    WorldId
);

// ── Messages ──────────────────────────────────────────────────────────────

/// The outcome of one executed action, stored by the host as a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Execution run this action belonged to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_status: Option<String>,
    /// The planner's rationale for the run, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_thought: Option<String>,
}

/// Distinguishes dialogue from action-result records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Dialogue,
    ActionResult(ActionOutcome),
}

/// A message-table record: dialogue turns, action results and context records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: RecordId,

    /// Who produced this record.
    pub entity_id: EntityId,

    pub room_id: RoomId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_id: Option<WorldId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub kind: RecordKind,

    /// Origin tag (platform name, or `toon-context` for derived records).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Display name the platform attached to the sender, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Filled in by the host once embedding generation completes.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl MessageRecord {
    /// Create a dialogue record stamped with the current time.
    pub fn dialogue(entity_id: EntityId, room_id: RoomId, text: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            entity_id,
            room_id,
            world_id: None,
            text: Some(text.into()),
            created_at: Some(Utc::now()),
            kind: RecordKind::Dialogue,
            source: None,
            sender_name: None,
            metadata: serde_json::Map::new(),
            embedding: None,
        }
    }

    /// Create an action-result record stamped with the current time.
    pub fn action_result(entity_id: EntityId, room_id: RoomId, outcome: ActionOutcome) -> Self {
        Self {
            kind: RecordKind::ActionResult(outcome),
            text: None,
            ..Self::dialogue(entity_id, room_id, "")
        }
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_world(mut self, world_id: WorldId) -> Self {
        self.world_id = Some(world_id);
        self
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    pub fn is_action_result(&self) -> bool {
        matches!(self.kind, RecordKind::ActionResult(_))
    }

    pub fn action_outcome(&self) -> Option<&ActionOutcome> {
        match &self.kind {
            RecordKind::ActionResult(outcome) => Some(outcome),
            RecordKind::Dialogue => None,
        }
    }

    /// Text content, or the empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Creation time in epoch milliseconds; records without one sort first.
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.map(|t| t.timestamp_millis()).unwrap_or(0)
    }
}

// ── Facts ─────────────────────────────────────────────────────────────────

/// A fact the agent has extracted and stored about the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactRecord {
    pub id: RecordId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_id: Option<WorldId>,

    pub text: String,

    /// Extraction confidence in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Relevance score (set by similarity search)
    #[serde(default)]
    pub score: f32,

    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl FactRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            entity_id: None,
            room_id: None,
            world_id: None,
            text: text.into(),
            confidence: None,
            created_at: Some(Utc::now()),
            score: 0.0,
            embedding: None,
        }
    }

    /// Confidence as a whole percentage in `0..=100`. A missing, zero or
    /// NaN confidence counts as certain; out-of-range values are clamped.
    pub fn confidence_percent(&self) -> i64 {
        let confidence = match self.confidence {
            Some(c) if c != 0.0 && !c.is_nan() => c.clamp(0.0, 1.0),
            _ => 1.0,
        };
        (confidence * 100.0).round() as i64
    }
}

// ── Entities & rooms ──────────────────────────────────────────────────────

/// A participant known to a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,

    /// Known names, most preferred first.
    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl EntityRecord {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            names: vec![name.into()],
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(|s| s.as_str())
    }
}

/// The kind of channel a room is backed by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    Dm,
    Group,
    Feed,
    Thread,
    Voice,
    Api,
}

impl ChannelKind {
    /// Feeds and threads are rendered as posts rather than a conversation.
    pub fn is_post_format(&self) -> bool {
        matches!(self, ChannelKind::Feed | ChannelKind::Thread)
    }
}

/// Room metadata needed to choose a rendering style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMetadata {
    pub id: RoomId,

    #[serde(default)]
    pub channel: ChannelKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialogue_record_defaults() {
        let msg = MessageRecord::dialogue("user-1".into(), "room-1".into(), "hello");
        assert_eq!(msg.text_or_empty(), "hello");
        assert!(!msg.is_action_result());
        assert!(msg.created_at.is_some());
    }

    #[test]
    fn action_result_carries_outcome() {
        let msg = MessageRecord::action_result(
            "agent".into(),
            "room-1".into(),
            ActionOutcome {
                run_id: Some("run-1".into()),
                action_name: Some("REPLY".into()),
                action_status: Some("completed".into()),
                plan_thought: None,
            },
        );
        assert!(msg.is_action_result());
        assert_eq!(msg.action_outcome().unwrap().action_name.as_deref(), Some("REPLY"));
        assert_eq!(msg.text_or_empty(), "");
    }

    #[test]
    fn record_kind_is_tagged_in_json() {
        let msg = MessageRecord::action_result("a".into(), "r".into(), ActionOutcome::default());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"]["type"], "action_result");

        let back: MessageRecord = serde_json::from_value(json).unwrap();
        assert!(back.is_action_result());
    }

    #[test]
    fn confidence_percent_rounds_and_defaults() {
        let mut fact = FactRecord::new("likes tea");
        assert_eq!(fact.confidence_percent(), 100);
        fact.confidence = Some(0.876);
        assert_eq!(fact.confidence_percent(), 88);
        fact.confidence = Some(0.0);
        assert_eq!(fact.confidence_percent(), 100);
    }

    #[test]
    fn confidence_percent_stays_in_range() {
        let mut fact = FactRecord::new("likes tea");
        for (confidence, percent) in [(1.5, 100), (f64::INFINITY, 100), (-0.2, 0), (f64::NAN, 100)] {
            fact.confidence = Some(confidence);
            assert_eq!(fact.confidence_percent(), percent, "{confidence}");
        }
    }

    #[test]
    fn short_id_truncates_by_chars() {
        let id = EntityId::from("0123456789abcdef");
        assert_eq!(id.short(8), "01234567");
        assert_eq!(EntityId::from("abc").short(8), "abc");
    }

    #[test]
    fn feed_and_thread_use_post_format() {
        assert!(ChannelKind::Feed.is_post_format());
        assert!(ChannelKind::Thread.is_post_format());
        assert!(!ChannelKind::Group.is_post_format());
    }
}
