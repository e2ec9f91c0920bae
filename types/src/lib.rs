//! Shared configuration types for critical notifications
//!
//! This crate contains the serializable data that the core engine, the CLI
//! and any configuration UI agree on: configuration entries, the per-entry
//! setting bundles, and the symbolic lookup tables used when rendering.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Declares a string-backed enum that never fails to deserialize: unknown
/// values map to the `#[default]` variant, like a lookup table miss.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(from = "String", into = "&'static str")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value, )+
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $( $value => $name::$variant, )+
                    _ => $name::default(),
                }
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod serde_helpers;
pub mod settings;

pub use settings::{
    ART_ANCHOR, ASSET_ROOT, ArtSettings, ArtSize, CategorySettings, ClassPair, DEFAULT_VOLUME,
    Fill, FontSize, FxKind, FxOptions, FxSettings, ImageSize, Intensity, LetterSpacing,
    SettingBundle, SettingCategory, SoundSettings, TextSettings,
};

// ─────────────────────────────────────────────────────────────────────────────
// Reserved Entries
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_PC_ID: &str = "default-player-character";
pub const DEFAULT_ADVERSARY_ID: &str = "default-adversary";

/// Target sentinel meaning "any player" / "any adversary"
pub const ALL_TARGETS: &str = "all";

/// Maximum length of an entry name
pub const MAX_NAME_LEN: usize = 30;

// ─────────────────────────────────────────────────────────────────────────────
// Entity Type
// ─────────────────────────────────────────────────────────────────────────────

/// The two broad subjects an entry can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    #[default]
    #[serde(rename = "Player Character")]
    PlayerCharacter,
    #[serde(rename = "Adversary")]
    Adversary,
}

impl EntityType {
    pub const ALL: [EntityType; 2] = [Self::PlayerCharacter, Self::Adversary];

    /// Key of this class inside the global `{pc, adversary}` blobs.
    pub fn class_key(&self) -> &'static str {
        match self {
            Self::PlayerCharacter => "pc",
            Self::Adversary => "adversary",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PlayerCharacter => "Player Character",
            Self::Adversary => "Adversary",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Id of the reserved default entry for this class.
    pub fn default_entry_id(&self) -> &'static str {
        match self {
            Self::PlayerCharacter => DEFAULT_PC_ID,
            Self::Adversary => DEFAULT_ADVERSARY_ID,
        }
    }

    /// Trigger kinds that make sense for this class.
    pub fn allowed_triggers(&self) -> &'static [TriggerKind] {
        match self {
            Self::PlayerCharacter => &[
                TriggerKind::ActionAndReaction,
                TriggerKind::OnlyAction,
                TriggerKind::OnlyReaction,
                TriggerKind::LevelUp,
                TriggerKind::TagTeamOpen,
            ],
            Self::Adversary => &[
                TriggerKind::ActionAndReaction,
                TriggerKind::OnlyAction,
                TriggerKind::OnlyReaction,
                TriggerKind::Fumble,
            ],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Triggers
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime roll classification an entry is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerTag {
    Action,
    Reaction,
    Fumble,
    #[serde(rename = "levelup")]
    LevelUp,
    #[serde(rename = "tagteam")]
    TagTeam,
}

impl TriggerTag {
    pub const ALL: [TriggerTag; 5] = [
        Self::Action,
        Self::Reaction,
        Self::Fumble,
        Self::LevelUp,
        Self::TagTeam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Reaction => "reaction",
            Self::Fumble => "fumble",
            Self::LevelUp => "levelup",
            Self::TagTeam => "tagteam",
        }
    }

    /// Parse a tag name; unknown roll types (damage, healing, ...) yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl std::fmt::Display for TriggerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic rule category an entry is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TriggerKind {
    #[default]
    #[serde(rename = "Action and Reaction")]
    ActionAndReaction,
    #[serde(rename = "Only Action")]
    OnlyAction,
    #[serde(rename = "Only Reaction")]
    OnlyReaction,
    #[serde(rename = "Fumble")]
    Fumble,
    #[serde(rename = "Level Up")]
    LevelUp,
    #[serde(rename = "Tag Team", alias = "Tag Team Open")]
    TagTeamOpen,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 6] = [
        Self::ActionAndReaction,
        Self::OnlyAction,
        Self::OnlyReaction,
        Self::Fumble,
        Self::LevelUp,
        Self::TagTeamOpen,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ActionAndReaction => "Action and Reaction",
            Self::OnlyAction => "Only Action",
            Self::OnlyReaction => "Only Reaction",
            Self::Fumble => "Fumble",
            Self::LevelUp => "Level Up",
            Self::TagTeamOpen => "Tag Team",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Tag Team Open" => Some(Self::TagTeamOpen),
            _ => Self::ALL.into_iter().find(|k| k.label() == label),
        }
    }

    /// Fixed mapping from rule category to runtime classification tags.
    pub fn tags(&self) -> &'static [TriggerTag] {
        match self {
            Self::ActionAndReaction => &[TriggerTag::Action, TriggerTag::Reaction],
            Self::OnlyAction => &[TriggerTag::Action],
            Self::OnlyReaction => &[TriggerTag::Reaction],
            Self::Fumble => &[TriggerTag::Fumble],
            Self::LevelUp => &[TriggerTag::LevelUp],
            Self::TagTeamOpen => &[TriggerTag::TagTeam],
        }
    }

    pub fn matches_tag(&self, tag: TriggerTag) -> bool {
        self.tags().contains(&tag)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Entry
// ─────────────────────────────────────────────────────────────────────────────

/// Random 16-character alphanumeric id.
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn default_entry_name() -> String {
    "New Critical".to_string()
}

/// One critical / fumble / level-up / tag-team rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationEntry {
    #[serde(default = "generate_id")]
    pub id: String,

    #[serde(default = "default_entry_name")]
    pub name: String,

    #[serde(rename = "type", default)]
    pub entity_type: EntityType,

    #[serde(rename = "target", alias = "triggerType", default)]
    pub trigger: TriggerKind,

    /// Player Character target: a user id or [`ALL_TARGETS`]
    #[serde(default, deserialize_with = "serde_helpers::opt_string")]
    pub user_id: Option<String>,

    /// Adversary target: an actor reference, [`ALL_TARGETS`], or unset (any)
    #[serde(default, deserialize_with = "serde_helpers::opt_string")]
    pub adversary_id: Option<String>,

    #[serde(default, deserialize_with = "serde_helpers::bool")]
    pub is_default: bool,

    #[serde(default = "now_millis")]
    pub created_at: i64,

    #[serde(default = "now_millis")]
    pub updated_at: i64,
}

impl Default for ConfigurationEntry {
    fn default() -> Self {
        let now = now_millis();
        Self {
            id: generate_id(),
            name: default_entry_name(),
            entity_type: EntityType::PlayerCharacter,
            trigger: TriggerKind::ActionAndReaction,
            user_id: None,
            adversary_id: None,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ConfigurationEntry {
    /// A fresh user-created entry.
    pub fn new(name: impl Into<String>, entity_type: EntityType, trigger: TriggerKind) -> Self {
        let mut entry = Self {
            name: name.into(),
            trigger,
            ..Self::default()
        };
        entry.set_entity_type(entity_type);
        entry
    }

    /// The reserved default entry for a class.
    pub fn reserved_default(entity_type: EntityType) -> Self {
        let now = now_millis();
        let (user_id, adversary_id) = match entity_type {
            EntityType::PlayerCharacter => (Some(ALL_TARGETS.to_string()), None),
            EntityType::Adversary => (None, Some(ALL_TARGETS.to_string())),
        };
        Self {
            id: entity_type.default_entry_id().to_string(),
            name: Self::default_name(entity_type.default_entry_id())
                .unwrap_or_default()
                .to_string(),
            entity_type,
            trigger: TriggerKind::ActionAndReaction,
            user_id,
            adversary_id,
            is_default: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Static name of a reserved entry, `None` for any other id.
    pub fn default_name(id: &str) -> Option<&'static str> {
        match id {
            DEFAULT_PC_ID => Some("Default Player Character"),
            DEFAULT_ADVERSARY_ID => Some("Default Adversary"),
            _ => None,
        }
    }

    pub fn is_reserved_id(id: &str) -> bool {
        Self::default_name(id).is_some()
    }

    /// Switch the target class, clearing the field that belongs to the other
    /// class and resetting a trigger kind the new class cannot use.
    pub fn set_entity_type(&mut self, entity_type: EntityType) {
        self.entity_type = entity_type;
        match entity_type {
            EntityType::PlayerCharacter => {
                self.adversary_id = None;
                if self.user_id.is_none() {
                    self.user_id = Some(ALL_TARGETS.to_string());
                }
            }
            EntityType::Adversary => {
                self.user_id = None;
            }
        }
        if !entity_type.allowed_triggers().contains(&self.trigger) {
            self.trigger = TriggerKind::ActionAndReaction;
        }
    }

    /// Whether this entry targets "everyone" of its class.
    pub fn is_wildcard(&self) -> bool {
        match self.entity_type {
            EntityType::PlayerCharacter => self.user_id.as_deref() == Some(ALL_TARGETS),
            EntityType::Adversary => self
                .adversary_id
                .as_deref()
                .is_none_or(|id| id.is_empty() || id == ALL_TARGETS),
        }
    }

    /// The configured user or actor reference (whichever applies to the class).
    pub fn target(&self) -> Option<&str> {
        match self.entity_type {
            EntityType::PlayerCharacter => self.user_id.as_deref(),
            EntityType::Adversary => self.adversary_id.as_deref(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Colors
// ─────────────────────────────────────────────────────────────────────────────

/// RGB triple
pub type Rgb = [u8; 3];

/// Parse `#rgb` or `#rrggbb` (leading `#` optional).
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let digits = hex.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}
