//! Per-category presentation settings (text, fx, sound, art)
//!
//! Every struct defaults each field at deserialization time, so a partial
//! blob written by an older form still yields a complete settings value.

use serde::{Deserialize, Serialize};

use crate::EntityType;
use crate::serde_helpers;

/// Module asset root used by the bundled default media.
pub const ASSET_ROOT: &str = "modules/daggerheart-critical/assets";

/// Default volume percentage for sounds.
pub const DEFAULT_VOLUME: u8 = 90;

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

/// The four independent setting categories attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingCategory {
    Text,
    Fx,
    Sound,
    Art,
}

impl SettingCategory {
    pub const ALL: [SettingCategory; 4] = [Self::Text, Self::Fx, Self::Sound, Self::Art];

    /// Key used inside the per-entry bundle map.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Fx => "fx",
            Self::Sound => "sound",
            Self::Art => "art",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Category-specific settings that can live in a [`SettingBundle`].
pub trait CategorySettings: Clone + Serialize + serde::de::DeserializeOwned {
    const CATEGORY: SettingCategory;

    /// Built-in value used when neither the entry nor the global blob has one.
    fn hard_default(entity_type: EntityType) -> Self;

    fn from_bundle(bundle: &SettingBundle) -> Option<&Self>;

    fn store_in(self, bundle: &mut SettingBundle);

    /// Canonical form written on save.
    fn normalized(self) -> Self {
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text
// ─────────────────────────────────────────────────────────────────────────────

string_enum! {
    /// Symbolic font size, mapped to rem by [`FontSize::rem`].
    FontSize {
        Small => "small",
        #[default]
        Normal => "normal",
        Medium => "medium",
        Large => "large",
        ExtraLarge => "extra-large",
        Huge => "huge",
        Massive => "massive",
        Giant => "giant",
    }
}

impl FontSize {
    pub fn rem(&self) -> u8 {
        match self {
            Self::Small => 4,
            Self::Normal | Self::Medium => 8,
            Self::Large => 12,
            Self::ExtraLarge => 16,
            Self::Huge => 20,
            Self::Massive => 24,
            Self::Giant => 32,
        }
    }
}

string_enum! {
    LetterSpacing {
        Tight => "tight",
        #[default]
        Normal => "normal",
        Wide => "wide",
        ExtraWide => "extra-wide",
    }
}

impl LetterSpacing {
    pub fn css(&self) -> &'static str {
        match self {
            Self::Tight => "-0.05em",
            Self::Normal => "normal",
            Self::Wide => "0.15em",
            Self::ExtraWide => "0.3em",
        }
    }
}

string_enum! {
    /// Background treatment behind the overlay text.
    Fill {
        #[default]
        None => "none",
        Box => "box",
        Band => "band",
        Full => "full",
    }
}

string_enum! {
    /// Size of an image/video shown instead of text.
    ImageSize {
        Small => "small",
        #[default]
        Normal => "normal",
        Large => "large",
        ExtraLarge => "extra-large",
    }
}

impl ImageSize {
    /// Max height as a viewport-height percentage.
    pub fn viewport_percent(&self) -> u8 {
        match self {
            Self::Small => 25,
            Self::Normal => 40,
            Self::Large => 60,
            Self::ExtraLarge => 80,
        }
    }
}

/// Overlay text (or media) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextSettings {
    pub content: String,
    pub font_family: String,
    pub font_size: FontSize,
    pub letter_spacing: LetterSpacing,
    /// Fixed text color; `None` falls back to the entity class color.
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    pub background_color: String,
    pub fill: Fill,
    #[serde(deserialize_with = "serde_helpers::bool")]
    pub use_player_color: bool,
    #[serde(deserialize_with = "serde_helpers::bool")]
    pub use_image: bool,
    pub image_path: String,
    pub image_size: ImageSize,
    /// Display duration override in ms (0 = default behavior)
    #[serde(deserialize_with = "serde_helpers::u32")]
    pub duration: u32,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            content: "CRITICAL".to_string(),
            font_family: "Bangers".to_string(),
            font_size: FontSize::Large,
            letter_spacing: LetterSpacing::Wide,
            color: None,
            background_color: "#000000".to_string(),
            fill: Fill::None,
            use_player_color: false,
            use_image: false,
            image_path: format!("{ASSET_ROOT}/critical-img-demo/molten_voltage.webp"),
            image_size: ImageSize::Normal,
            duration: 0,
        }
    }
}

impl TextSettings {
    /// Class color used when no fixed color is configured.
    pub fn class_color(entity_type: EntityType) -> &'static str {
        match entity_type {
            EntityType::PlayerCharacter => "#ffcc00",
            EntityType::Adversary => "#ff0000",
        }
    }
}

impl CategorySettings for TextSettings {
    const CATEGORY: SettingCategory = SettingCategory::Text;

    fn hard_default(entity_type: EntityType) -> Self {
        Self {
            color: Some(Self::class_color(entity_type).to_string()),
            ..Self::default()
        }
    }

    fn from_bundle(bundle: &SettingBundle) -> Option<&Self> {
        bundle.text.as_ref()
    }

    fn store_in(self, bundle: &mut SettingBundle) {
        bundle.text = Some(self);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Visual FX
// ─────────────────────────────────────────────────────────────────────────────

string_enum! {
    FxKind {
        #[default]
        None => "none",
        Shake => "shake",
        Shatter => "shatter",
        Border => "border",
        Pulsate => "pulsate",
        Confetti => "confetti",
    }
}

/// Effect strength: a number (pulsate scale step, confetti level) or a name
/// (shake: mild / heavy / extreme).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Intensity {
    Level(f64),
    Named(String),
}

impl Intensity {
    /// Numeric level, parsing string-encoded numbers.
    pub fn level(&self) -> Option<f64> {
        match self {
            Self::Level(n) => Some(*n),
            Self::Named(s) => s.trim().parse().ok(),
        }
        .filter(|f: &f64| f.is_finite())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(s) => Some(s.as_str()),
            Self::Level(_) => None,
        }
    }
}

/// Options for a visual effect. Which fields matter depends on the kind;
/// unset fields fall back to per-effect defaults when the effect is planned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FxOptions {
    #[serde(
        deserialize_with = "serde_helpers::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Intensity>,
    #[serde(
        deserialize_with = "serde_helpers::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub count: Option<u32>,
    #[serde(
        deserialize_with = "serde_helpers::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub thickness: Option<u32>,
    #[serde(
        deserialize_with = "serde_helpers::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<String>,
    #[serde(
        deserialize_with = "serde_helpers::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub iterations: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxSettings {
    #[serde(rename = "type")]
    pub kind: FxKind,
    pub options: FxOptions,
}

impl FxSettings {
    pub fn new(kind: FxKind, options: FxOptions) -> Self {
        Self { kind, options }
    }
}

impl CategorySettings for FxSettings {
    const CATEGORY: SettingCategory = SettingCategory::Fx;

    fn hard_default(_entity_type: EntityType) -> Self {
        Self::default()
    }

    fn from_bundle(bundle: &SettingBundle) -> Option<&Self> {
        bundle.fx.as_ref()
    }

    fn store_in(self, bundle: &mut SettingBundle) {
        bundle.fx = Some(self);
    }

    fn normalized(mut self) -> Self {
        if self.kind == FxKind::Border && self.options.color.is_none() {
            self.options.color = Some("#ff0000".to_string());
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sound
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoundSettings {
    #[serde(deserialize_with = "serde_helpers::bool")]
    pub enabled: bool,
    /// A single file, or a folder when `multi_sound` is set
    pub sound_path: String,
    #[serde(deserialize_with = "serde_helpers::bool")]
    pub multi_sound: bool,
    /// Volume percentage (0-100)
    #[serde(deserialize_with = "serde_helpers::volume")]
    pub volume: u8,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_path: String::new(),
            multi_sound: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl SoundSettings {
    /// Playback gain in 0.0..=1.0
    pub fn gain(&self) -> f32 {
        f32::from(self.volume.min(100)) / 100.0
    }

    pub fn is_playable(&self) -> bool {
        self.enabled && !self.sound_path.is_empty()
    }
}

impl CategorySettings for SoundSettings {
    const CATEGORY: SettingCategory = SettingCategory::Sound;

    fn hard_default(entity_type: EntityType) -> Self {
        let file = match entity_type {
            EntityType::PlayerCharacter => "pc-orchestral-win.mp3",
            EntityType::Adversary => "adv-critical-tension-impact.mp3",
        };
        Self {
            sound_path: format!("{ASSET_ROOT}/sfx/{file}"),
            ..Self::default()
        }
    }

    fn from_bundle(bundle: &SettingBundle) -> Option<&Self> {
        bundle.sound.as_ref()
    }

    fn store_in(self, bundle: &mut SettingBundle) {
        bundle.sound = Some(self);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Art
// ─────────────────────────────────────────────────────────────────────────────

string_enum! {
    ArtSize {
        VerySmall => "very-small",
        Small => "small",
        #[default]
        Normal => "normal",
        Large => "large",
    }
}

impl ArtSize {
    /// Max height as a viewport-height percentage.
    pub fn viewport_percent(&self) -> u8 {
        match self {
            Self::VerySmall => 15,
            Self::Small => 25,
            Self::Normal => 40,
            Self::Large => 60,
        }
    }
}

/// Anchor value forced on save so offsets are relative to screen center.
pub const ART_ANCHOR: &str = "middle";

fn default_anchor() -> String {
    ART_ANCHOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtSettings {
    pub image_path: String,
    #[serde(default = "default_anchor")]
    pub position: String,
    #[serde(default = "default_anchor")]
    pub position_y: String,
    pub art_size: ArtSize,
    #[serde(deserialize_with = "serde_helpers::i32")]
    pub offset_x: i32,
    #[serde(deserialize_with = "serde_helpers::i32")]
    pub offset_y: i32,
    #[serde(deserialize_with = "serde_helpers::u32")]
    pub duration: u32,
}

impl Default for ArtSettings {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            position: default_anchor(),
            position_y: default_anchor(),
            art_size: ArtSize::Normal,
            offset_x: 0,
            offset_y: 0,
            duration: 0,
        }
    }
}

impl ArtSettings {
    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty()
    }
}

impl CategorySettings for ArtSettings {
    const CATEGORY: SettingCategory = SettingCategory::Art;

    fn hard_default(_entity_type: EntityType) -> Self {
        Self::default()
    }

    fn from_bundle(bundle: &SettingBundle) -> Option<&Self> {
        bundle.art.as_ref()
    }

    fn store_in(self, bundle: &mut SettingBundle) {
        bundle.art = Some(self);
    }

    fn normalized(self) -> Self {
        Self {
            position: default_anchor(),
            position_y: default_anchor(),
            ..self
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bundles
// ─────────────────────────────────────────────────────────────────────────────

/// Up to four category settings attached to one configuration entry.
/// A missing category falls back to the global value for the entry's class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<FxSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<SoundSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art: Option<ArtSettings>,
}

impl SettingBundle {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.fx.is_none() && self.sound.is_none() && self.art.is_none()
    }

    pub fn has(&self, category: SettingCategory) -> bool {
        match category {
            SettingCategory::Text => self.text.is_some(),
            SettingCategory::Fx => self.fx.is_some(),
            SettingCategory::Sound => self.sound.is_some(),
            SettingCategory::Art => self.art.is_some(),
        }
    }
}

/// A legacy global blob holding one value per entity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de>"))]
pub struct ClassPair<T> {
    /// `duality` is the name the oldest sound blob used for player characters
    #[serde(alias = "duality", skip_serializing_if = "Option::is_none")]
    pub pc: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adversary: Option<T>,
}

impl<T> Default for ClassPair<T> {
    fn default() -> Self {
        Self {
            pc: None,
            adversary: None,
        }
    }
}

impl<T> ClassPair<T> {
    pub fn new(pc: T, adversary: T) -> Self {
        Self {
            pc: Some(pc),
            adversary: Some(adversary),
        }
    }

    pub fn get(&self, entity_type: EntityType) -> Option<&T> {
        match entity_type {
            EntityType::PlayerCharacter => self.pc.as_ref(),
            EntityType::Adversary => self.adversary.as_ref(),
        }
    }
}

impl<T: CategorySettings> ClassPair<T> {
    /// The shape registered for a fresh store.
    pub fn hard_defaults() -> Self {
        Self::new(
            T::hard_default(EntityType::PlayerCharacter),
            T::hard_default(EntityType::Adversary),
        )
    }
}
