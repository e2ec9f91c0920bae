//! Host event payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::ActorKind;

fn active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieResult {
    pub result: u32,
    /// Discarded dice (advantage, rerolls) are inactive
    #[serde(default = "active")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Die {
    pub faces: Option<u32>,
    pub formula: Option<String>,
    pub results: Vec<DieResult>,
}

impl Die {
    /// Whether this is a `d{faces}`, by face count or by formula.
    pub fn is(&self, faces: u32) -> bool {
        self.faces == Some(faces)
            || self
                .formula
                .as_deref()
                .is_some_and(|f| f.contains(&format!("d{faces}")))
    }

    pub fn shows(&self, value: u32) -> bool {
        self.results.iter().any(|r| r.active && r.result == value)
    }
}

/// Roll classification embedded in a chat message by the game system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollData {
    pub is_critical: bool,
    pub dice: Vec<Die>,
    /// `action`, `reaction`, or another system roll type
    #[serde(rename = "type")]
    pub roll_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub author_is_gm: bool,
    pub alias: Option<String>,
    /// Actor reference of the speaker, if any
    pub speaker_actor: Option<String>,
    pub roll: Option<RollData>,
}

/// A level change observed on an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorUpdate {
    pub actor_id: String,
    #[serde(default)]
    pub actor_kind: ActorKind,
    #[serde(default)]
    pub old_level: Option<u32>,
    #[serde(default)]
    pub new_level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagTeamInitiator {
    pub user_id: Option<String>,
    pub actor_id: Option<String>,
}

/// Shared tag-team roll state, as stored in the game system's setting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagTeamState {
    pub initiator: Option<TagTeamInitiator>,
    /// Member actor references
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    MessageCreated(ChatMessage),
    #[serde(rename_all = "camelCase")]
    AnimationComplete { message_id: String },
    ActorUpdated(ActorUpdate),
    SettingChanged { key: String, value: Value },
}
