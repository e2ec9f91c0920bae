//! Turning host events into triggers

use crit_types::{EntityType, TriggerTag};

use super::events::{ActorUpdate, ChatMessage, RollData, TagTeamState};
use crate::debug_log;
use crate::host::{ActorKind, Roster};
use crate::resolve::Trigger;

/// Name of the game system setting that carries tag-team state.
pub const TAG_TEAM_SETTING: &str = "TagTeamRoll";

/// Minimum members for a tag team to count as open.
pub const TAG_TEAM_MIN_MEMBERS: usize = 2;

/// A classified event, plus who caused it (for player-colored text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub trigger: Trigger,
    pub user_id: Option<String>,
    /// Debounce key, `subject:discriminant`
    pub key: String,
}

/// Which class a roll belongs to: any d20 is an adversary roll, any d12 a
/// player (duality) roll; otherwise the author decides.
pub fn roll_class(message: &ChatMessage, roll: &RollData) -> EntityType {
    if roll.dice.iter().any(|d| d.is(20)) {
        EntityType::Adversary
    } else if roll.dice.iter().any(|d| d.is(12)) {
        EntityType::PlayerCharacter
    } else if message.author_is_gm {
        EntityType::Adversary
    } else {
        EntityType::PlayerCharacter
    }
}

/// Critical tag for a roll type. Rolls with no type count as actions.
fn critical_tag(roll_type: Option<&str>) -> Option<TriggerTag> {
    match roll_type.map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some("action") => Some(TriggerTag::Action),
        Some("reaction") => Some(TriggerTag::Reaction),
        Some(_) => None,
    }
}

/// A critical roll or an adversary fumble, if the message holds one.
pub fn classify_message(message: &ChatMessage) -> Option<Detection> {
    let roll = message.roll.as_ref()?;
    let class = roll_class(message, roll);

    let tag = if roll.is_critical {
        let tag = critical_tag(roll.roll_type.as_deref());
        if tag.is_none() {
            debug_log!(
                "Critical in {} has roll type {:?}, ignoring",
                message.id,
                roll.roll_type
            );
        }
        tag?
    } else if class == EntityType::Adversary
        && roll.dice.iter().any(|d| d.is(20) && d.shows(1))
    {
        TriggerTag::Fumble
    } else {
        return None;
    };

    let actor_key = match class {
        EntityType::PlayerCharacter => Some(message.author_id.clone()),
        EntityType::Adversary => message.speaker_actor.clone(),
    };
    debug_log!(
        "Message {} classified as {} {} (key {:?})",
        message.id,
        class.label(),
        tag,
        actor_key
    );
    Some(Detection {
        trigger: Trigger::new(class, actor_key, tag),
        user_id: Some(message.author_id.clone()).filter(|id| !id.is_empty()),
        key: format!("{}:{}", message.id, tag),
    })
}

/// A player character whose level went up, attributed to its owner.
pub fn classify_level_up(update: &ActorUpdate, roster: &dyn Roster) -> Option<Detection> {
    if update.actor_kind != ActorKind::Character {
        return None;
    }
    let (old, new) = (update.old_level?, update.new_level?);
    if new <= old {
        return None;
    }

    let owner = roster.owner_of(&update.actor_id).map(|u| u.id);
    if owner.is_none() {
        debug_log!("No owner for {}, level up falls to wildcard entries", update.actor_id);
    }
    Some(Detection {
        trigger: Trigger::new(EntityType::PlayerCharacter, owner.clone(), TriggerTag::LevelUp),
        user_id: owner,
        key: format!("{}:levelup:{new}", update.actor_id),
    })
}

/// Whether a changed setting key is the tag-team state.
pub fn is_tag_team_setting(key: &str) -> bool {
    key.rsplit('.').next() == Some(TAG_TEAM_SETTING)
}

/// An open tag team: an initiator and enough members.
pub fn classify_tag_team(state: &TagTeamState) -> Option<Detection> {
    let initiator = state.initiator.as_ref()?;
    if state.members.len() < TAG_TEAM_MIN_MEMBERS {
        debug_log!("Tag team has {} members, not open yet", state.members.len());
        return None;
    }
    let user_id = initiator.user_id.clone().filter(|id| !id.is_empty())?;
    let subject = initiator.actor_id.as_deref().unwrap_or(&user_id);
    Some(Detection {
        key: format!("{subject}:tagteam"),
        trigger: Trigger::player(user_id.clone(), TriggerTag::TagTeam),
        user_id: Some(user_id),
    })
}
