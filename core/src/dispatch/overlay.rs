//! Full-screen critical overlay
//!
//! [`OverlayView::build`] is the pure part: it maps symbolic text and art
//! settings to concrete presentation values and decides how the overlay
//! closes. [`OverlayManager`] opens views on an [`OverlaySurface`] and owns
//! one close timer per open instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crit_types::{ArtSettings, EntityType, Fill, TextSettings};
use serde::Serialize;

use super::lock;
use super::task::TaskHandle;
use crate::debug_log;
use crate::host::{AudioPlayer, PlaybackRequest, SoundHandle};

/// Text and image overlays without a duration override
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// Upper bound for overlays waiting on a video to end
pub const MEDIA_SAFETY_TIMEOUT: Duration = Duration::from_secs(15);

/// Gain for a video's audio track
pub const VIDEO_AUDIO_VOLUME: f32 = 0.8;

/// Text color when the rolling user's color is requested but unknown
pub const FALLBACK_USER_COLOR: &str = "#ffffff";

const VIDEO_EXTENSIONS: [&str; 2] = ["webm", "mp4"];

pub type OverlayId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn of(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Image
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayMedia {
    pub path: String,
    pub kind: MediaKind,
    /// Max height, percent of viewport height
    pub max_height_vh: u8,
}

/// Character art shown alongside the text, offset from screen center.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtPlacement {
    pub image_path: String,
    pub max_height_vh: u8,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// How an overlay instance ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClosePolicy {
    After(Duration),
    /// Close when the video ends, or at `safety` if it never does
    OnMediaEnd { safety: Duration },
}

impl ClosePolicy {
    pub fn deadline(&self) -> Duration {
        match self {
            Self::After(d) => *d,
            Self::OnMediaEnd { safety } => *safety,
        }
    }
}

/// Everything a surface needs to draw one overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub entity_type: EntityType,
    pub title: String,
    pub font_family: String,
    pub font_size_rem: u8,
    pub letter_spacing: &'static str,
    pub color: String,
    pub background_color: String,
    pub fill: Fill,
    pub media: Option<OverlayMedia>,
    pub art: Option<ArtPlacement>,
    pub close: ClosePolicy,
}

impl OverlayView {
    pub fn build(
        entity_type: EntityType,
        text: &TextSettings,
        art: &ArtSettings,
        user_color: Option<&str>,
    ) -> Self {
        let color = if text.use_player_color {
            user_color.unwrap_or(FALLBACK_USER_COLOR).to_string()
        } else {
            text.color
                .clone()
                .unwrap_or_else(|| TextSettings::class_color(entity_type).to_string())
        };

        let media = (text.use_image && !text.image_path.is_empty()).then(|| OverlayMedia {
            kind: MediaKind::of(&text.image_path),
            path: text.image_path.clone(),
            max_height_vh: text.image_size.viewport_percent(),
        });

        // Art timing only counts when art is actually shown.
        let art_ms = if art.has_image() { art.duration } else { 0 };
        let art = art.has_image().then(|| ArtPlacement {
            image_path: art.image_path.clone(),
            max_height_vh: art.art_size.viewport_percent(),
            offset_x: art.offset_x,
            offset_y: art.offset_y,
        });

        let is_video = media.as_ref().is_some_and(|m| m.kind == MediaKind::Video);
        let explicit = if text.duration > 0 { text.duration } else { art_ms };
        let close = match (explicit, is_video) {
            (ms, _) if ms > 0 => ClosePolicy::After(Duration::from_millis(u64::from(ms))),
            (_, true) => ClosePolicy::OnMediaEnd {
                safety: MEDIA_SAFETY_TIMEOUT,
            },
            (_, false) => ClosePolicy::After(DEFAULT_DURATION),
        };

        let title = if text.content.trim().is_empty() {
            TextSettings::default().content
        } else {
            text.content.clone()
        };

        Self {
            entity_type,
            title,
            font_family: text.font_family.clone(),
            font_size_rem: text.font_size.rem(),
            letter_spacing: text.letter_spacing.css(),
            color,
            background_color: text.background_color.clone(),
            fill: text.fill,
            media,
            art,
            close,
        }
    }

    /// Path of the video whose audio track should play, if any.
    pub fn video_path(&self) -> Option<&str> {
        self.media
            .as_ref()
            .filter(|m| m.kind == MediaKind::Video)
            .map(|m| m.path.as_str())
    }
}

/// Where overlays are drawn.
pub trait OverlaySurface: Send + Sync {
    fn open(&self, id: OverlayId, view: &OverlayView);
    fn close(&self, id: OverlayId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Timer,
    MediaEnded,
    Dismissed,
}

struct OpenOverlay {
    policy: ClosePolicy,
    timer: Option<TaskHandle>,
    sound: Option<Box<dyn SoundHandle>>,
}

struct OverlayState {
    surface: Arc<dyn OverlaySurface>,
    open: Mutex<HashMap<OverlayId, OpenOverlay>>,
}

impl OverlayState {
    fn finish(&self, id: OverlayId, reason: CloseReason) -> bool {
        let Some(mut overlay) = lock(&self.open).remove(&id) else {
            return false;
        };
        if let Some(mut sound) = overlay.sound.take() {
            sound.stop();
        }
        if let Some(timer) = overlay.timer.take() {
            match reason {
                // Called from inside the timer task itself
                CloseReason::Timer => timer.detach(),
                _ => timer.cancel(),
            }
        }
        self.surface.close(id);
        debug_log!("Overlay {} closed ({:?})", id, reason);
        true
    }
}

/// Opens independent, self-closing overlay instances.
pub struct OverlayManager {
    state: Arc<OverlayState>,
    audio: Arc<dyn AudioPlayer>,
    next_id: AtomicU64,
}

impl OverlayManager {
    pub fn new(surface: Arc<dyn OverlaySurface>, audio: Arc<dyn AudioPlayer>) -> Self {
        Self {
            state: Arc::new(OverlayState {
                surface,
                open: Mutex::new(HashMap::new()),
            }),
            audio,
            next_id: AtomicU64::new(1),
        }
    }

    /// Open `view` and schedule its close. Must be called inside a tokio runtime.
    pub fn show(&self, view: &OverlayView) -> OverlayId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let sound = view.video_path().and_then(|path| {
            self.audio
                .play(&PlaybackRequest::once(path, VIDEO_AUDIO_VOLUME), false)
        });

        // Register before the surface or timer can report back
        lock(&self.state.open).insert(
            id,
            OpenOverlay {
                policy: view.close,
                timer: None,
                sound,
            },
        );
        self.state.surface.open(id, view);

        let deadline = view.close.deadline();
        let state = Arc::clone(&self.state);
        let timer = TaskHandle::spawn(async move {
            tokio::time::sleep(deadline).await;
            state.finish(id, CloseReason::Timer);
        });
        if let Some(overlay) = lock(&self.state.open).get_mut(&id) {
            overlay.timer = Some(timer);
        }

        debug_log!("Overlay {} opened, closes {:?}", id, view.close);
        id
    }

    /// The surface reports that the overlay's video finished.
    ///
    /// Ignored for overlays with an explicit duration.
    pub fn media_ended(&self, id: OverlayId) -> bool {
        let waits_for_media = lock(&self.state.open)
            .get(&id)
            .is_some_and(|o| matches!(o.policy, ClosePolicy::OnMediaEnd { .. }));
        waits_for_media && self.state.finish(id, CloseReason::MediaEnded)
    }

    /// Close early (window closed by the user, host teardown).
    pub fn close(&self, id: OverlayId) -> bool {
        self.state.finish(id, CloseReason::Dismissed)
    }

    pub fn close_all(&self) {
        let ids: Vec<OverlayId> = lock(&self.state.open).keys().copied().collect();
        for id in ids {
            self.close(id);
        }
    }

    pub fn open_count(&self) -> usize {
        lock(&self.state.open).len()
    }

    pub fn is_open(&self, id: OverlayId) -> bool {
        lock(&self.state.open).contains_key(&id)
    }
}
