//! Three-layer settings lookup
//!
//! entry settings → global class blob → built-in default, per category.

use crit_types::{
    ArtSettings, CategorySettings, ClassPair, ConfigurationEntry, EntityType, FxSettings,
    SettingBundle, SoundSettings, TextSettings,
};
use serde::Serialize;

/// The legacy `{pc, adversary}` blobs for all four categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalDefaults {
    pub text: ClassPair<TextSettings>,
    pub fx: ClassPair<FxSettings>,
    pub sound: ClassPair<SoundSettings>,
    pub art: ClassPair<ArtSettings>,
}

impl GlobalDefaults {
    /// The shape a freshly registered store holds.
    pub fn hard_defaults() -> Self {
        Self {
            text: ClassPair::hard_defaults(),
            fx: ClassPair::hard_defaults(),
            sound: ClassPair::hard_defaults(),
            art: ClassPair::hard_defaults(),
        }
    }
}

/// Which layer a resolved category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Entry,
    Global,
    BuiltIn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layered<T> {
    pub value: T,
    pub layer: Layer,
}

/// Final settings for one selected entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSettings {
    pub entry_id: String,
    pub entity_type: EntityType,
    pub text: Layered<TextSettings>,
    pub fx: Layered<FxSettings>,
    pub sound: Layered<SoundSettings>,
    pub art: Layered<ArtSettings>,
}

fn pick<T: CategorySettings>(
    bundle: &SettingBundle,
    global: &ClassPair<T>,
    entity_type: EntityType,
) -> Layered<T> {
    if let Some(value) = T::from_bundle(bundle) {
        return Layered {
            value: value.clone(),
            layer: Layer::Entry,
        };
    }
    if let Some(value) = global.get(entity_type) {
        return Layered {
            value: value.clone(),
            layer: Layer::Global,
        };
    }
    Layered {
        value: T::hard_default(entity_type),
        layer: Layer::BuiltIn,
    }
}

/// Resolve every category of `entry` independently.
///
/// A category that is present but empty at a layer still counts as present.
pub fn resolve_settings(
    entry: &ConfigurationEntry,
    bundle: &SettingBundle,
    globals: &GlobalDefaults,
) -> ResolvedSettings {
    let class = entry.entity_type;
    ResolvedSettings {
        entry_id: entry.id.clone(),
        entity_type: class,
        text: pick(bundle, &globals.text, class),
        fx: pick(bundle, &globals.fx, class),
        sound: pick(bundle, &globals.sound, class),
        art: pick(bundle, &globals.art, class),
    }
}
