//! Configuration entry validation
//!
//! Default entries are exempt. Everything else is checked before it is
//! persisted, and a batch containing any invalid entry is rejected whole.

use crit_types::{
    ALL_TARGETS, ConfigurationEntry, EntityType, MAX_NAME_LEN, TriggerKind, serde_helpers,
};
use serde::Deserialize;
use thiserror::Error;

use crate::host::Roster;

/// Problems found in one entry.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Validation failed for {entry_name}: {}", .messages.join(", "))]
pub struct ValidationError {
    pub entry_id: String,
    pub entry_name: String,
    pub messages: Vec<String>,
}

fn name_errors(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        Some("Name cannot be empty".to_string())
    } else if name.chars().count() > MAX_NAME_LEN {
        Some(format!("Name cannot exceed {MAX_NAME_LEN} characters"))
    } else {
        None
    }
}

fn target_list() -> String {
    TriggerKind::ALL
        .iter()
        .map(|k| k.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// All problems with a typed entry; empty when valid.
pub fn validate_entry(entry: &ConfigurationEntry, roster: &dyn Roster) -> Vec<String> {
    let mut errors = Vec::new();

    errors.extend(name_errors(&entry.name));

    if !entry.entity_type.allowed_triggers().contains(&entry.trigger) {
        errors.push(format!(
            "Target '{}' is not available for {} entries",
            entry.trigger.label(),
            entry.entity_type.label()
        ));
    }

    if entry.entity_type == EntityType::PlayerCharacter {
        match entry.user_id.as_deref() {
            None => errors.push("Please select a user for Player Character type".to_string()),
            Some(ALL_TARGETS) => {}
            Some(id) if roster.user(id).is_none() => {
                errors.push("Selected user does not exist".to_string())
            }
            Some(_) => {}
        }
    }

    // Adversary target needs no check: empty means every adversary

    errors
}

/// Validate every non-default entry, collecting one error per offender.
pub fn validate_batch(
    entries: &[ConfigurationEntry],
    roster: &dyn Roster,
) -> Result<(), Vec<ValidationError>> {
    let failures: Vec<ValidationError> = entries
        .iter()
        .filter(|e| !e.is_default)
        .filter_map(|entry| {
            let messages = validate_entry(entry, roster);
            (!messages.is_empty()).then(|| ValidationError {
                entry_id: entry.id.clone(),
                entry_name: entry.name.clone(),
                messages,
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw form payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Entry as submitted by a form, before the labels are parsed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryDraft {
    #[serde(deserialize_with = "serde_helpers::opt_string")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(alias = "triggerType")]
    pub target: String,
    #[serde(deserialize_with = "serde_helpers::opt_string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "serde_helpers::opt_string")]
    pub adversary_id: Option<String>,
    #[serde(deserialize_with = "serde_helpers::bool")]
    pub is_default: bool,
}

impl EntryDraft {
    /// Parse labels into a typed entry.
    ///
    /// Blank labels take the data-model defaults. Unknown labels are errors.
    /// Timestamps are preserved from `existing` when the id matches.
    pub fn into_entry(
        self,
        existing: Option<&ConfigurationEntry>,
    ) -> Result<ConfigurationEntry, ValidationError> {
        let display_name = self.name.clone();
        let mut messages = Vec::new();

        let entity_type = if self.entity_type.is_empty() {
            Some(EntityType::PlayerCharacter)
        } else {
            EntityType::from_label(&self.entity_type)
        };
        if entity_type.is_none() {
            messages.push("Type must be 'Player Character' or 'Adversary'".to_string());
        }

        let trigger = if self.target.is_empty() {
            Some(TriggerKind::ActionAndReaction)
        } else {
            TriggerKind::from_label(&self.target)
        };
        if trigger.is_none() {
            messages.push(format!("Target must be one of: {}", target_list()));
        }

        let (Some(entity_type), Some(trigger)) = (entity_type, trigger) else {
            return Err(ValidationError {
                entry_id: self.id.unwrap_or_default(),
                entry_name: display_name,
                messages,
            });
        };

        let mut entry = match existing {
            Some(prev) => prev.clone(),
            None => ConfigurationEntry::default(),
        };
        if let Some(id) = self.id {
            entry.id = id;
        }
        entry.name = self.name;
        entry.entity_type = entity_type;
        entry.trigger = trigger;
        entry.user_id = self.user_id;
        entry.adversary_id = self.adversary_id;
        entry.is_default = self.is_default;
        Ok(entry)
    }
}
