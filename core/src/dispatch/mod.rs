//! Effect dispatch
//!
//! Takes resolved settings and runs the three presentation channels
//! independently: overlay, screen effect, and sound. A failure or absence in
//! one channel never blocks the others.

pub mod fx;
pub mod overlay;
pub mod particles;
pub mod sound;
pub mod task;

use std::sync::{Arc, Mutex, MutexGuard};

use crit_types::{EntityType, FxKind};
use serde::Serialize;

pub use fx::{FxEngine, FxPlan, FxSurface};
pub use overlay::{OverlayId, OverlayManager, OverlaySurface, OverlayView};
pub use sound::{PlayedSound, SoundPlayer};

use crate::debug_log;
use crate::host::{AudioPlayer, FileBrowser, Notifier};
use crate::resolve::ResolvedSettings;

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Live dispatches come from game events; previews from an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    #[default]
    Live,
    Preview,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    /// Color of the user who rolled, for player-colored text
    pub user_color: Option<String>,
    pub mode: DispatchMode,
}

impl DispatchContext {
    pub fn live(user_color: Option<String>) -> Self {
        Self {
            user_color,
            mode: DispatchMode::Live,
        }
    }

    pub fn preview() -> Self {
        Self {
            user_color: None,
            mode: DispatchMode::Preview,
        }
    }
}

/// What a single dispatch started.
#[derive(Debug)]
pub struct DispatchReport {
    pub entity_type: EntityType,
    pub overlay: OverlayId,
    pub fx: FxKind,
    pub sound: Option<PlayedSound>,
}

pub struct Dispatcher {
    overlay: OverlayManager,
    fx: FxEngine,
    sound: SoundPlayer,
}

impl Dispatcher {
    pub fn new(overlay: OverlayManager, fx: FxEngine, sound: SoundPlayer) -> Self {
        Self { overlay, fx, sound }
    }

    /// Wire a dispatcher from host services.
    pub fn from_host(
        overlay_surface: Arc<dyn OverlaySurface>,
        fx_surface: Arc<dyn FxSurface>,
        audio: Arc<dyn AudioPlayer>,
        browser: Arc<dyn FileBrowser>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            overlay: OverlayManager::new(overlay_surface, Arc::clone(&audio)),
            fx: FxEngine::new(fx_surface),
            sound: SoundPlayer::new(browser, audio, notifier),
        }
    }

    /// Run overlay, effect and sound for `settings`. Must be called inside a
    /// tokio runtime.
    pub fn dispatch(&self, settings: &ResolvedSettings, ctx: &DispatchContext) -> DispatchReport {
        let view = OverlayView::build(
            settings.entity_type,
            &settings.text.value,
            &settings.art.value,
            ctx.user_color.as_deref(),
        );
        let overlay = self.overlay.show(&view);

        let plan = FxPlan::from_settings(&settings.fx.value);
        self.fx.run(&plan);

        let sound = self.sound.play(&settings.sound.value, ctx.mode);

        debug_log!(
            "Dispatched {} for {}: overlay {}, fx {}, sound {:?}",
            settings.entry_id,
            settings.entity_type.label(),
            overlay,
            plan.kind(),
            sound.as_ref().map(|s| s.src.as_str())
        );
        DispatchReport {
            entity_type: settings.entity_type,
            overlay,
            fx: plan.kind(),
            sound,
        }
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlay
    }

    pub fn fx(&self) -> &FxEngine {
        &self.fx
    }

    pub fn sound(&self) -> &SoundPlayer {
        &self.sound
    }

    /// Close every overlay and stop every effect.
    pub fn stop_all(&self) {
        self.overlay.close_all();
        self.fx.stop_all();
    }
}
