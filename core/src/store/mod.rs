//! Settings persistence
//!
//! The host owns a flat key/value settings space. Everything this crate
//! persists goes through [`SettingsStore`], so the repository and resolver
//! can be exercised against [`MemoryStore`] and deployed against
//! [`JsonFileStore`] (or a host bridge) without changes.

mod error;
mod file;

pub use error::StoreError;
pub use file::JsonFileStore;

use std::collections::HashMap;
use std::sync::RwLock;

use crit_types::{
    ArtSettings, CategorySettings, ClassPair, FxSettings, SoundSettings, TextSettings,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Setting keys owned by the critical module.
pub mod keys {
    use crit_types::SettingCategory;

    /// Ordered list of configuration entries
    pub const CONFIGURATIONS: &str = "criticalConfigurations";
    /// Per-entry setting bundles, keyed by entry id then category
    pub const CONFIG_SETTINGS: &str = "critConfigSettings";
    pub const TEXT: &str = "critTextSettings";
    pub const FX: &str = "critFXSettings";
    pub const SOUND: &str = "critSoundSettings";
    pub const ART: &str = "critArtSettings";
    pub const DEBUG_MODE: &str = "debugmode";

    /// Key of the legacy `{pc, adversary}` blob for a category.
    pub fn global(category: SettingCategory) -> &'static str {
        match category {
            SettingCategory::Text => TEXT,
            SettingCategory::Fx => FX,
            SettingCategory::Sound => SOUND,
            SettingCategory::Art => ART,
        }
    }
}

/// Injectable key/value settings backend.
pub trait SettingsStore: Send + Sync {
    /// Raw value for `key`, `None` when never written.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value for `key`.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Typed access on top of the raw JSON contract.
pub trait SettingsStoreExt: SettingsStore {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value)
    }
}

impl<S: SettingsStore + ?Sized> SettingsStoreExt for S {}

/// Write the default shape of every key that has never been written.
///
/// Existing values are left untouched, so this is safe to call on every start.
pub fn register_defaults(store: &dyn SettingsStore) -> Result<(), StoreError> {
    let defaults = [
        (keys::CONFIGURATIONS, Value::Array(Vec::new())),
        (keys::CONFIG_SETTINGS, Value::Object(Default::default())),
        (keys::TEXT, default_pair::<TextSettings>()?),
        (keys::FX, default_pair::<FxSettings>()?),
        (keys::SOUND, default_pair::<SoundSettings>()?),
        (keys::ART, default_pair::<ArtSettings>()?),
        (keys::DEBUG_MODE, Value::Bool(false)),
    ];

    for (key, value) in defaults {
        if store.get(key)?.is_none() {
            tracing::debug!(key, "Registering default setting");
            store.set(key, value)?;
        }
    }
    Ok(())
}

fn default_pair<T: CategorySettings>() -> Result<Value, StoreError> {
    let key = keys::global(T::CATEGORY);
    serde_json::to_value(ClassPair::<T>::hard_defaults()).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Global debug flag as stored, `false` when unset or unreadable.
pub fn debug_mode(store: &dyn SettingsStore) -> bool {
    store
        .get(keys::DEBUG_MODE)
        .ok()
        .flatten()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local store, used for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw values.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Snapshot of every key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .read()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
