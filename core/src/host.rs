//! Host collaborators
//!
//! The tabletop host provides identity, notifications, file listing, audio
//! and the chat log. Each is a small trait here so the engine can run
//! against the real host, the CLI, or test doubles.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::listeners::ChatMessage;

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// User-visible toast channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.notify(NoticeLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Routes toasts to the log when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!("{message}"),
            NoticeLevel::Warn => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_gm: bool,
    /// Display color as `#rrggbb`
    #[serde(default)]
    pub color: Option<String>,
    /// Linked player character actor
    #[serde(default)]
    pub character_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Character,
    Adversary,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorInfo {
    /// Full actor reference, e.g. `Actor.abc123`
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: ActorKind,
}

/// Users and actors known to the host.
pub trait Roster: Send + Sync {
    fn users(&self) -> Vec<UserInfo>;

    fn actor(&self, reference: &str) -> Option<ActorInfo>;

    fn user(&self, id: &str) -> Option<UserInfo> {
        self.users().into_iter().find(|u| u.id == id)
    }

    /// Owner of a player character, by linked character.
    fn owner_of(&self, actor_id: &str) -> Option<UserInfo> {
        self.users()
            .into_iter()
            .find(|u| !u.is_gm && u.character_id.as_deref() == Some(actor_id))
    }
}

/// Fixed roster, loaded from a file by the CLI and built inline by tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRoster {
    pub users: Vec<UserInfo>,
    pub actors: Vec<ActorInfo>,
}

impl Roster for StaticRoster {
    fn users(&self) -> Vec<UserInfo> {
        self.users.clone()
    }

    fn actor(&self, reference: &str) -> Option<ActorInfo> {
        self.actors.iter().find(|a| a.id == reference).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// Folder enumeration, as the host file picker provides it.
pub trait FileBrowser: Send + Sync {
    /// Files (not directories) directly inside `path`, as host paths.
    fn browse(&self, path: &str) -> io::Result<Vec<String>>;
}

/// Browses a local directory tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct LocalFileBrowser {
    root: PathBuf,
}

impl LocalFileBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileBrowser for LocalFileBrowser {
    fn browse(&self, path: &str) -> io::Result<Vec<String>> {
        let dir = self.root.join(path.trim_start_matches('/'));
        let prefix = path.trim_end_matches('/');
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            });
        }
        files.sort();
        Ok(files)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audio
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    pub src: String,
    /// Gain in 0.0..=1.0
    pub volume: f32,
    pub autoplay: bool,
    pub looped: bool,
}

impl PlaybackRequest {
    pub fn once(src: impl Into<String>, volume: f32) -> Self {
        Self {
            src: src.into(),
            volume,
            autoplay: true,
            looped: false,
        }
    }
}

/// A started sound that can be stopped early.
pub trait SoundHandle: Send {
    fn stop(&mut self);
}

pub trait AudioPlayer: Send + Sync {
    /// Start playback. `broadcast` plays for every connected client.
    /// `None` means the source could not be played.
    fn play(&self, request: &PlaybackRequest, broadcast: bool) -> Option<Box<dyn SoundHandle>>;
}

/// Discards every request. Used when the host has no audio output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioPlayer for NullAudio {
    fn play(&self, request: &PlaybackRequest, _broadcast: bool) -> Option<Box<dyn SoundHandle>> {
        tracing::debug!(src = %request.src, "Audio output disabled, skipping playback");
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

/// Current chat log, consulted when a deferred event resumes.
pub trait ChatLog: Send + Sync {
    fn message(&self, id: &str) -> Option<ChatMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_browser_lists_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let sfx = dir.path().join("sfx");
        fs::create_dir_all(sfx.join("nested")).unwrap();
        fs::write(sfx.join("b.ogg"), b"").unwrap();
        fs::write(sfx.join("a.mp3"), b"").unwrap();

        let browser = LocalFileBrowser::new(dir.path());
        assert_eq!(browser.browse("sfx/").unwrap(), vec!["sfx/a.mp3", "sfx/b.ogg"]);
        assert!(browser.browse("missing").is_err());
    }

    #[test]
    fn roster_owner_lookup_skips_gm() {
        let roster: StaticRoster = serde_json::from_str(
            r##"{
                "users": [
                    {"id": "gm", "name": "GM", "isGm": true, "characterId": "Actor.pc"},
                    {"id": "u1", "name": "Ada", "color": "#00ff00", "characterId": "Actor.pc"}
                ],
                "actors": [{"id": "Actor.pc", "name": "Hero", "type": "character"}]
            }"##,
        )
        .unwrap();
        assert_eq!(roster.owner_of("Actor.pc").unwrap().id, "u1");
        assert_eq!(roster.actor("Actor.pc").unwrap().kind, ActorKind::Character);
        assert!(roster.user("nobody").is_none());
    }
}
