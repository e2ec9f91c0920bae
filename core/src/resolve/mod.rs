//! Configuration resolution
//!
//! Two pure steps turn a trigger into presentation settings:
//!
//! 1. [`select_entry`] picks the one entry that should fire, by tier:
//!    specific target, then wildcard, then the reserved default.
//! 2. [`resolve_settings`] fills each of the four categories independently
//!    from the entry's own settings, the global class blob, or the built-in
//!    default, in that order.

mod layers;

#[cfg(test)]
mod selection_tests;

pub use layers::{GlobalDefaults, Layer, Layered, ResolvedSettings, resolve_settings};

use crit_types::{ConfigurationEntry, EntityType, TriggerTag};
use serde::Serialize;

use crate::debug_log;

/// A classified event asking for an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trigger {
    pub entity_type: EntityType,
    /// User id (player characters) or actor reference (adversaries)
    pub actor_key: Option<String>,
    pub tag: TriggerTag,
}

impl Trigger {
    pub fn new(entity_type: EntityType, actor_key: Option<String>, tag: TriggerTag) -> Self {
        Self {
            entity_type,
            actor_key: actor_key.filter(|k| !k.is_empty()),
            tag,
        }
    }

    pub fn player(user_id: impl Into<String>, tag: TriggerTag) -> Self {
        Self::new(EntityType::PlayerCharacter, Some(user_id.into()), tag)
    }

    pub fn adversary(actor_ref: Option<&str>, tag: TriggerTag) -> Self {
        Self::new(EntityType::Adversary, actor_ref.map(str::to_string), tag)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.entity_type.class_key(),
            self.actor_key.as_deref().unwrap_or("-"),
            self.tag
        )
    }
}

/// Priority tier an entry was selected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Specific,
    Wildcard,
    Default,
}

/// The entry that should fire for `trigger`, if any.
pub fn select_entry<'a>(
    entries: &'a [ConfigurationEntry],
    trigger: &Trigger,
) -> Option<&'a ConfigurationEntry> {
    select_with_tier(entries, trigger).map(|(entry, _)| entry)
}

/// Like [`select_entry`], also reporting which tier matched.
///
/// Ties inside a tier go to the earliest entry in list order.
pub fn select_with_tier<'a>(
    entries: &'a [ConfigurationEntry],
    trigger: &Trigger,
) -> Option<(&'a ConfigurationEntry, MatchTier)> {
    let candidates: Vec<&ConfigurationEntry> = entries
        .iter()
        .filter(|e| e.entity_type == trigger.entity_type && e.trigger.matches_tag(trigger.tag))
        .collect();

    if candidates.is_empty() {
        debug_log!("No entry handles {}", trigger);
        return None;
    }

    let overrides = || candidates.iter().copied().filter(|e| !e.is_default);

    if let Some(key) = trigger.actor_key.as_deref() {
        let specific = || overrides().filter(|e| !e.is_wildcard());

        if let Some(entry) = specific().find(|e| e.target() == Some(key)) {
            debug_log!("{} matched specific entry {}", trigger, entry.id);
            return Some((entry, MatchTier::Specific));
        }

        // Actor references differ in granularity between sources
        // (`Actor.x` vs `Scene.s.Token.t.Actor.x`), so adversaries also
        // accept containment either way.
        if trigger.entity_type == EntityType::Adversary {
            let lenient = specific().find(|e| {
                e.adversary_id
                    .as_deref()
                    .is_some_and(|stored| stored.contains(key) || key.contains(stored))
            });
            if let Some(entry) = lenient {
                debug_log!("{} matched adversary entry {} by containment", trigger, entry.id);
                return Some((entry, MatchTier::Specific));
            }
        }
    }

    if let Some(entry) = overrides().find(|e| e.is_wildcard()) {
        debug_log!("{} matched wildcard entry {}", trigger, entry.id);
        return Some((entry, MatchTier::Wildcard));
    }

    let fallback = candidates.iter().copied().find(|e| e.is_default);
    match fallback {
        Some(entry) => debug_log!("{} fell back to default entry {}", trigger, entry.id),
        None => debug_log!("{} has no matching default, nothing fires", trigger),
    }
    fallback.map(|entry| (entry, MatchTier::Default))
}
