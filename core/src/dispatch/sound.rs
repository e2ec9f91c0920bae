//! Critical sound selection and playback

use std::sync::{Arc, Mutex};

use crit_types::SoundSettings;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{DispatchMode, lock};
use crate::debug_log;
use crate::host::{AudioPlayer, FileBrowser, Notifier, PlaybackRequest, SoundHandle};

/// Extensions picked up from a multi-sound folder
pub const AUDIO_EXTENSIONS: [&str; 9] = [
    "aac", "flac", "m4a", "mid", "mp3", "ogg", "opus", "wav", "webm",
];

pub fn is_audio_file(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

pub struct SoundPlayer {
    browser: Arc<dyn FileBrowser>,
    audio: Arc<dyn AudioPlayer>,
    notifier: Arc<dyn Notifier>,
    rng: Mutex<StdRng>,
}

impl SoundPlayer {
    pub fn new(
        browser: Arc<dyn FileBrowser>,
        audio: Arc<dyn AudioPlayer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            browser,
            audio,
            notifier,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic folder picks, for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// The concrete file to play: the configured path, or a random audio
    /// file from the configured folder in multi-sound mode.
    pub fn resolve_path(&self, settings: &SoundSettings) -> Option<String> {
        if settings.sound_path.is_empty() {
            return None;
        }
        if !settings.multi_sound {
            return Some(settings.sound_path.clone());
        }

        let files = match self.browser.browse(&settings.sound_path) {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(folder = %settings.sound_path, error = %err, "Failed to list sound folder");
                return None;
            }
        };
        let candidates: Vec<&String> = files.iter().filter(|f| is_audio_file(f)).collect();
        debug_log!(
            "{} of {} files in {} are playable",
            candidates.len(),
            files.len(),
            settings.sound_path
        );
        candidates
            .choose(&mut *lock(&self.rng))
            .map(|path| (*path).clone())
    }

    /// Play the resolved sound for every client.
    ///
    /// Nothing playable is silent during live play; previews warn.
    pub fn play(&self, settings: &SoundSettings, mode: DispatchMode) -> Option<PlayedSound> {
        if !settings.enabled {
            return None;
        }
        let Some(path) = self.resolve_path(settings) else {
            if mode == DispatchMode::Preview {
                self.notifier.warn("No sound file found for this configuration");
            }
            return None;
        };

        let request = PlaybackRequest::once(path, settings.gain());
        let handle = self.audio.play(&request, true);
        if handle.is_none() && mode == DispatchMode::Preview {
            self.notifier
                .warn(&format!("Could not play sound {}", request.src));
        }
        Some(PlayedSound {
            src: request.src,
            volume: request.volume,
            handle,
        })
    }
}

/// A sound that was handed to the audio player.
pub struct PlayedSound {
    pub src: String,
    pub volume: f32,
    pub handle: Option<Box<dyn SoundHandle>>,
}

impl std::fmt::Debug for PlayedSound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayedSound")
            .field("src", &self.src)
            .field("volume", &self.volume)
            .field("playing", &self.handle.is_some())
            .finish()
    }
}
