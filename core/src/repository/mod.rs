//! Configuration repository
//!
//! CRUD over the ordered entry list plus the nested per-entry settings map.
//! Every write is read-modify-write of a whole key: the list is always
//! persisted complete, never patched in place.
//!
//! Reads never fail. A corrupt list reads as empty and the problem is
//! reported on the notification channel. Writes fail loudly so callers can
//! abort whatever UI flow triggered them.

mod error;

#[cfg(test)]
mod repository_tests;

pub use error::RepositoryError;

use std::sync::Arc;

use crit_types::{
    ArtSettings, CategorySettings, ClassPair, ConfigurationEntry, EntityType, FxSettings,
    SettingBundle, SettingCategory, SoundSettings, TextSettings, TriggerKind, now_millis,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::debug_log;
use crate::host::{ActorKind, Notifier, Roster};
use crate::resolve::GlobalDefaults;
use crate::store::{SettingsStore, SettingsStoreExt, StoreError, keys};
use crate::validation::validate_batch;

/// Partial update merged into an existing entry by [`ConfigRepository::update`].
///
/// `user_id` / `adversary_id` use a nested option: `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
    #[serde(rename = "target", alias = "triggerType")]
    pub trigger: Option<TriggerKind>,
    #[serde(deserialize_with = "patch_field")]
    pub user_id: Option<Option<String>>,
    #[serde(deserialize_with = "patch_field")]
    pub adversary_id: Option<Option<String>>,
}

/// Present key maps to `Some`, with `null` / `""` meaning clear.
fn patch_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    crit_types::serde_helpers::opt_string(deserializer).map(Some)
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge into `entry`. Reserved entries keep their name and class.
    pub fn apply(self, entry: &mut ConfigurationEntry) {
        let reserved = ConfigurationEntry::is_reserved_id(&entry.id);

        if let Some(name) = self.name {
            if reserved {
                debug_log!("Ignoring rename of reserved entry {}", entry.id);
            } else {
                entry.name = name;
            }
        }
        if let Some(entity_type) = self.entity_type {
            if reserved && entity_type != entry.entity_type {
                debug_log!("Ignoring type change of reserved entry {}", entry.id);
            } else if entity_type != entry.entity_type {
                entry.set_entity_type(entity_type);
            }
        }
        if let Some(trigger) = self.trigger {
            entry.trigger = trigger;
        }
        if let Some(user_id) = self.user_id {
            entry.user_id = user_id;
        }
        if let Some(adversary_id) = self.adversary_id {
            entry.adversary_id = adversary_id;
        }
    }
}

/// What [`ConfigRepository::ensure_defaults`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultsReport {
    pub created: Vec<EntityType>,
    pub migrated: Vec<(EntityType, SettingCategory)>,
}

impl DefaultsReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.migrated.is_empty()
    }
}

/// One element of the stored list. Elements that fail to decode (an
/// unknown label, a missing field) are carried through rewrites untouched.
#[derive(Debug, Clone)]
enum Slot {
    Entry(ConfigurationEntry),
    Unreadable(Value),
}

impl Slot {
    fn id(&self) -> Option<&str> {
        match self {
            Self::Entry(entry) => Some(&entry.id),
            Self::Unreadable(raw) => raw.get("id").and_then(Value::as_str),
        }
    }

    fn is_entry(&self, id: &str) -> bool {
        matches!(self, Self::Entry(entry) if entry.id == id)
    }
}

pub struct ConfigRepository {
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
}

impl ConfigRepository {
    pub fn new(store: Arc<dyn SettingsStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entries
    // ─────────────────────────────────────────────────────────────────────────

    /// Ordered entries. Never fails: storage problems read as empty.
    pub fn list(&self) -> Vec<ConfigurationEntry> {
        match self.try_list() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to load configurations");
                self.notifier.error("Failed to load configurations");
                Vec::new()
            }
        }
    }

    /// Ordered entries, surfacing storage errors. Entries that no longer
    /// decode are skipped, not fatal.
    pub fn try_list(&self) -> Result<Vec<ConfigurationEntry>, RepositoryError> {
        Ok(self
            .load_slots()?
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Entry(entry) => Some(entry),
                Slot::Unreadable(_) => None,
            })
            .collect())
    }

    /// The stored list, one slot per element. Anything but a list (or
    /// nothing) is a load error.
    fn load_slots(&self) -> Result<Vec<Slot>, RepositoryError> {
        let items = match self.store.get(keys::CONFIGURATIONS) {
            Ok(None | Some(Value::Null)) => return Ok(Vec::new()),
            Ok(Some(Value::Array(items))) => items,
            Ok(Some(other)) => {
                let source = serde_json::from_value::<Vec<Value>>(other)
                    .err()
                    .unwrap_or_else(|| <serde_json::Error as serde::de::Error>::custom("expected a list"));
                return Err(RepositoryError::Load(StoreError::Decode {
                    key: keys::CONFIGURATIONS.to_string(),
                    source,
                }));
            }
            Err(err) => return Err(RepositoryError::Load(err)),
        };

        Ok(items
            .into_iter()
            .map(|item| match serde_json::from_value(item.clone()) {
                Ok(entry) => Slot::Entry(entry),
                Err(err) => {
                    tracing::warn!(
                        id = item.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"),
                        error = %err,
                        "Skipping unreadable configuration"
                    );
                    Slot::Unreadable(item)
                }
            })
            .collect())
    }

    /// Persist slots in order, unreadable ones verbatim.
    fn save_slots(&self, slots: &[Slot]) -> Result<(), RepositoryError> {
        let mut items = Vec::with_capacity(slots.len());
        for slot in slots {
            items.push(match slot {
                Slot::Entry(entry) => serde_json::to_value(entry).map_err(|source| {
                    RepositoryError::Save(StoreError::Encode {
                        key: keys::CONFIGURATIONS.to_string(),
                        source,
                    })
                })?,
                Slot::Unreadable(raw) => raw.clone(),
            });
        }
        self.write_list(Value::Array(items), slots.len())
    }

    fn write_list(&self, list: Value, count: usize) -> Result<(), RepositoryError> {
        self.store.set(keys::CONFIGURATIONS, list).map_err(|err| {
            tracing::error!(error = ?err, "Failed to save configurations");
            self.notifier.error("Failed to save configuration");
            RepositoryError::Save(err)
        })?;
        tracing::debug!(count, "Saved configurations");
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<ConfigurationEntry> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Replace the whole persisted list. Timestamps are written as given.
    pub fn save_all(&self, entries: &[ConfigurationEntry]) -> Result<(), RepositoryError> {
        let list = serde_json::to_value(entries).map_err(|source| {
            RepositoryError::Save(StoreError::Encode {
                key: keys::CONFIGURATIONS.to_string(),
                source,
            })
        })?;
        self.write_list(list, entries.len())
    }

    /// Append an entry. Refuses to write when the stored list is unreadable.
    pub fn add(&self, entry: ConfigurationEntry) -> Result<(), RepositoryError> {
        let mut slots = self.load_slots()?;
        tracing::debug!(id = %entry.id, name = %entry.name, "Adding configuration");
        slots.push(Slot::Entry(entry));
        self.save_slots(&slots)
    }

    /// Remove an entry and its settings. Reserved entries are refused with a
    /// warning. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        if ConfigurationEntry::is_reserved_id(id) {
            self.notifier.warn("Cannot delete default configuration entries");
            return Ok(false);
        }

        let mut slots = self.load_slots()?;
        let before = slots.len();
        slots.retain(|slot| slot.id() != Some(id));
        if slots.len() == before {
            return Ok(false);
        }
        self.save_slots(&slots)?;

        let mut bundles = self.raw_bundles();
        if bundles.remove(id).is_some() {
            self.store
                .set(keys::CONFIG_SETTINGS, Value::Object(bundles))
                .map_err(RepositoryError::Save)?;
        }
        Ok(true)
    }

    /// Merge `patch` into the entry and bump `updated_at`.
    pub fn update(
        &self,
        id: &str,
        patch: EntryPatch,
    ) -> Result<Option<ConfigurationEntry>, RepositoryError> {
        self.modify(id, |entry| {
            patch.apply(entry);
            entry.updated_at = now_millis();
        })
    }

    /// Switch an entry between player character and adversary.
    pub fn set_entity_type(
        &self,
        id: &str,
        entity_type: EntityType,
    ) -> Result<Option<ConfigurationEntry>, RepositoryError> {
        self.update(
            id,
            EntryPatch {
                entity_type: Some(entity_type),
                ..Default::default()
            },
        )
    }

    /// Target an entry at one adversary actor. Non-adversary actors are
    /// refused with a warning.
    pub fn assign_adversary(
        &self,
        id: &str,
        actor_ref: &str,
        roster: &dyn Roster,
    ) -> Result<bool, RepositoryError> {
        let Some(actor) = roster.actor(actor_ref) else {
            self.notifier.warn("Actor not found");
            return Ok(false);
        };
        if actor.kind != ActorKind::Adversary {
            self.notifier.warn("Only adversary actors can be assigned here");
            return Ok(false);
        }
        let updated = self.modify(id, |entry| entry.adversary_id = Some(actor.id.clone()))?;
        Ok(updated.is_some())
    }

    /// Reset an adversary entry to "any adversary".
    pub fn clear_adversary(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.modify(id, |entry| entry.adversary_id = None)?.is_some())
    }

    fn modify(
        &self,
        id: &str,
        f: impl FnOnce(&mut ConfigurationEntry),
    ) -> Result<Option<ConfigurationEntry>, RepositoryError> {
        let mut slots = self.load_slots()?;
        let found = slots.iter_mut().find_map(|slot| match slot {
            Slot::Entry(entry) if entry.id == id => Some(entry),
            _ => None,
        });
        let Some(entry) = found else {
            tracing::debug!(id, "Configuration not found");
            return Ok(None);
        };
        f(entry);
        let updated = entry.clone();
        self.save_slots(&slots)?;
        Ok(Some(updated))
    }

    /// Form submit: pin reserved names, validate everything else, and
    /// persist the batch only if every entry passes.
    pub fn save_validated(
        &self,
        mut entries: Vec<ConfigurationEntry>,
        roster: &dyn Roster,
    ) -> Result<(), RepositoryError> {
        for entry in &mut entries {
            entry.is_default = ConfigurationEntry::is_reserved_id(&entry.id);
            if let Some(name) = ConfigurationEntry::default_name(&entry.id) {
                entry.name = name.to_string();
            }
        }

        if let Err(failures) = validate_batch(&entries, roster) {
            for failure in &failures {
                self.notifier.error(&failure.to_string());
            }
            return Err(RepositoryError::Validation(failures));
        }

        self.save_all(&entries)?;
        self.notifier.info("Critical configurations saved successfully");
        Ok(())
    }

    /// Create any missing reserved entry. A freshly created entry inherits
    /// the legacy global blobs for its class, unless it already has settings.
    pub fn ensure_defaults(&self) -> Result<DefaultsReport, RepositoryError> {
        let mut slots = self.load_slots()?;
        let mut report = DefaultsReport::default();
        let pc_id = EntityType::PlayerCharacter.default_entry_id();
        let adversary_id = EntityType::Adversary.default_entry_id();

        if !slots.iter().any(|slot| slot.is_entry(pc_id)) {
            slots.retain(|slot| slot.id() != Some(pc_id));
            slots.insert(
                0,
                Slot::Entry(ConfigurationEntry::reserved_default(EntityType::PlayerCharacter)),
            );
            report.created.push(EntityType::PlayerCharacter);
        }

        if !slots.iter().any(|slot| slot.is_entry(adversary_id)) {
            slots.retain(|slot| slot.id() != Some(adversary_id));
            let after_pc = slots
                .iter()
                .position(|slot| slot.id() == Some(pc_id))
                .map_or(0, |i| i + 1);
            slots.insert(
                after_pc,
                Slot::Entry(ConfigurationEntry::reserved_default(EntityType::Adversary)),
            );
            report.created.push(EntityType::Adversary);
        }

        if report.created.is_empty() {
            return Ok(report);
        }

        self.save_slots(&slots)?;
        for entity_type in report.created.clone() {
            let migrated = self.migrate_legacy(entity_type)?;
            report
                .migrated
                .extend(migrated.into_iter().map(|c| (entity_type, c)));
        }

        tracing::info!(
            created = report.created.len(),
            migrated = report.migrated.len(),
            "Bootstrapped default configurations"
        );
        Ok(report)
    }

    /// Copy the legacy `{pc, adversary}` blobs into a reserved entry's bundle.
    fn migrate_legacy(
        &self,
        entity_type: EntityType,
    ) -> Result<Vec<SettingCategory>, RepositoryError> {
        let id = entity_type.default_entry_id();
        let mut bundles = self.raw_bundles();
        if bundles
            .get(id)
            .and_then(Value::as_object)
            .is_some_and(|b| !b.is_empty())
        {
            debug_log!("Entry {} already has settings, skipping migration", id);
            return Ok(Vec::new());
        }

        let mut bundle = Map::new();
        let mut migrated = Vec::new();
        for category in SettingCategory::ALL {
            let Some(value) = self.legacy_value(category, entity_type) else {
                continue;
            };
            bundle.insert(category.key().to_string(), value);
            migrated.push(category);
        }

        if migrated.is_empty() {
            return Ok(migrated);
        }

        bundles.insert(id.to_string(), Value::Object(bundle));
        self.store
            .set(keys::CONFIG_SETTINGS, Value::Object(bundles))
            .map_err(|source| RepositoryError::SaveSettings {
                id: id.to_string(),
                category: migrated[0],
                source,
            })?;
        Ok(migrated)
    }

    fn legacy_value(&self, category: SettingCategory, entity_type: EntityType) -> Option<Value> {
        let blob = self.store.get(keys::global(category)).ok().flatten()?;
        let class = blob.get(entity_type.class_key()).or_else(|| match entity_type {
            EntityType::PlayerCharacter => blob.get("duality"),
            EntityType::Adversary => None,
        })?;
        (!class.is_null()).then(|| class.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-entry settings
    // ─────────────────────────────────────────────────────────────────────────

    fn raw_bundles(&self) -> Map<String, Value> {
        match self.store.get(keys::CONFIG_SETTINGS) {
            Ok(Some(Value::Object(map))) => map,
            Ok(None | Some(Value::Null)) => Map::new(),
            Ok(Some(_)) => {
                tracing::error!("Per-entry settings are not an object, ignoring");
                Map::new()
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to read per-entry settings");
                Map::new()
            }
        }
    }

    /// Raw stored value for one category of one entry.
    pub fn category_value(&self, id: &str, category: SettingCategory) -> Option<Value> {
        let bundles = self.raw_bundles();
        let value = bundles.get(id)?.get(category.key())?;
        (!value.is_null()).then(|| value.clone())
    }

    /// Typed settings for one category of one entry, `None` when unset.
    pub fn category_settings<T: CategorySettings>(&self, id: &str) -> Option<T> {
        let value = self.category_value(id, T::CATEGORY)?;
        match serde_json::from_value(value) {
            Ok(settings) => Some(settings),
            Err(err) => {
                tracing::warn!(
                    id,
                    category = T::CATEGORY.key(),
                    error = %err,
                    "Unreadable entry settings, falling back"
                );
                None
            }
        }
    }

    /// All four categories of one entry.
    pub fn bundle(&self, id: &str) -> SettingBundle {
        SettingBundle {
            text: self.category_settings::<TextSettings>(id),
            fx: self.category_settings::<FxSettings>(id),
            sound: self.category_settings::<SoundSettings>(id),
            art: self.category_settings::<ArtSettings>(id),
        }
    }

    /// Store one category for one entry, leaving the others untouched.
    pub fn save_category_settings<T: CategorySettings>(
        &self,
        id: &str,
        settings: T,
    ) -> Result<(), RepositoryError> {
        let value = serde_json::to_value(settings.normalized()).map_err(|source| {
            RepositoryError::Encode {
                category: T::CATEGORY,
                source,
            }
        })?;
        self.write_category(id, T::CATEGORY, Some(value))
    }

    /// Drop one category so the entry inherits the global value again.
    pub fn clear_category_settings(
        &self,
        id: &str,
        category: SettingCategory,
    ) -> Result<(), RepositoryError> {
        self.write_category(id, category, None)
    }

    fn write_category(
        &self,
        id: &str,
        category: SettingCategory,
        value: Option<Value>,
    ) -> Result<(), RepositoryError> {
        let mut bundles = self.raw_bundles();
        let slot = bundles
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(bundle) = slot {
            match value {
                Some(value) => {
                    bundle.insert(category.key().to_string(), value);
                }
                None => {
                    bundle.remove(category.key());
                }
            }
        }

        self.store
            .set(keys::CONFIG_SETTINGS, Value::Object(bundles))
            .map_err(|source| {
                tracing::error!(id, category = category.key(), error = ?source, "Failed to save settings");
                self.notifier.error("Failed to save settings");
                RepositoryError::SaveSettings {
                    id: id.to_string(),
                    category,
                    source,
                }
            })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Global fallback layer
    // ─────────────────────────────────────────────────────────────────────────

    /// The legacy per-class blobs, used as the second resolution layer.
    pub fn global_defaults(&self) -> GlobalDefaults {
        GlobalDefaults {
            text: self.global_pair(),
            fx: self.global_pair(),
            sound: self.global_pair(),
            art: self.global_pair(),
        }
    }

    fn global_pair<T: CategorySettings>(&self) -> ClassPair<T> {
        let key = keys::global(T::CATEGORY);
        match self.store.get_as::<ClassPair<T>>(key) {
            Ok(pair) => pair.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(key, error = ?err, "Unreadable global settings, using built-in defaults");
                ClassPair::default()
            }
        }
    }

    /// Overwrite the global value for one class.
    pub fn save_global<T: CategorySettings>(
        &self,
        entity_type: EntityType,
        settings: T,
    ) -> Result<(), RepositoryError> {
        let key = keys::global(T::CATEGORY);
        let mut pair = self.global_pair::<T>();
        match entity_type {
            EntityType::PlayerCharacter => pair.pc = Some(settings.normalized()),
            EntityType::Adversary => pair.adversary = Some(settings.normalized()),
        }
        self.store
            .set_as(key, &pair)
            .map_err(|source| RepositoryError::SaveSettings {
                id: entity_type.class_key().to_string(),
                category: T::CATEGORY,
                source,
            })
    }
}
