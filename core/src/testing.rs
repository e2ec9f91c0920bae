//! Test doubles for host collaborators and presentation surfaces

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crit_types::Rgb;
use serde_json::Value;

use crate::dispatch::fx::{FxSurface, PulsePlan};
use crate::dispatch::lock;
use crate::dispatch::overlay::{OverlayId, OverlaySurface, OverlayView};
use crate::dispatch::particles::{ConfettiPiece, Shard, Viewport};
use crate::host::{
    ActorInfo, ActorKind, AudioPlayer, ChatLog, FileBrowser, NoticeLevel, Notifier,
    PlaybackRequest, SoundHandle, StaticRoster, UserInfo,
};
use crate::listeners::ChatMessage;
use crate::store::{SettingsStore, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(NoticeLevel, String)> {
        lock(&self.notices).clone()
    }

    fn at(&self, level: NoticeLevel) -> Vec<String> {
        lock(&self.notices)
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.at(NoticeLevel::Info)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.at(NoticeLevel::Warn)
    }

    pub fn errors(&self) -> Vec<String> {
        self.at(NoticeLevel::Error)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        lock(&self.notices).push((level, message.to_string()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Audio and files
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeAudio {
    played: Mutex<Vec<(PlaybackRequest, bool)>>,
    stops: Arc<AtomicUsize>,
    unplayable: bool,
}

impl FakeAudio {
    /// Accepts requests but never produces a handle.
    pub fn unplayable() -> Self {
        Self {
            unplayable: true,
            ..Self::default()
        }
    }

    pub fn played(&self) -> Vec<(PlaybackRequest, bool)> {
        lock(&self.played).clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

struct FakeHandle {
    stops: Arc<AtomicUsize>,
}

impl SoundHandle for FakeHandle {
    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

impl AudioPlayer for FakeAudio {
    fn play(&self, request: &PlaybackRequest, broadcast: bool) -> Option<Box<dyn SoundHandle>> {
        lock(&self.played).push((request.clone(), broadcast));
        if self.unplayable {
            return None;
        }
        Some(Box::new(FakeHandle {
            stops: Arc::clone(&self.stops),
        }))
    }
}

/// One folder of files.
pub struct FakeBrowser {
    folder: String,
    files: Vec<String>,
}

impl FakeBrowser {
    pub fn with_files(folder: &str, files: &[&str]) -> Self {
        Self {
            folder: folder.to_string(),
            files: files.iter().map(|f| format!("{folder}/{f}")).collect(),
        }
    }
}

impl FileBrowser for FakeBrowser {
    fn browse(&self, path: &str) -> io::Result<Vec<String>> {
        if path.trim_end_matches('/') == self.folder {
            Ok(self.files.clone())
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surfaces
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCall {
    Open(OverlayId, Box<OverlayView>),
    Close(OverlayId),
}

#[derive(Default)]
pub struct RecordingOverlay {
    calls: Mutex<Vec<OverlayCall>>,
}

impl RecordingOverlay {
    pub fn calls(&self) -> Vec<OverlayCall> {
        lock(&self.calls).clone()
    }

    pub fn closed(&self) -> Vec<OverlayId> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                OverlayCall::Close(id) => Some(*id),
                OverlayCall::Open(..) => None,
            })
            .collect()
    }
}

impl OverlaySurface for RecordingOverlay {
    fn open(&self, id: OverlayId, view: &OverlayView) {
        lock(&self.calls).push(OverlayCall::Open(id, Box::new(view.clone())));
    }

    fn close(&self, id: OverlayId) {
        lock(&self.calls).push(OverlayCall::Close(id));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FxCall {
    Translate,
    ResetTransform,
    ShowBorder(u32, Rgb),
    HideBorder,
    StartPulse(u32),
    StopPulse,
    /// Shard count drawn this frame
    Shards(usize),
    Confetti(usize),
    ClearConfetti,
}

pub struct RecordingFx {
    viewport: Viewport,
    calls: Mutex<Vec<FxCall>>,
}

impl Default for RecordingFx {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(800.0, 600.0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingFx {
    pub fn calls(&self) -> Vec<FxCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, pred: impl Fn(&FxCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn push(&self, call: FxCall) {
        lock(&self.calls).push(call);
    }
}

impl FxSurface for RecordingFx {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn translate(&self, _dx: f32, _dy: f32) {
        self.push(FxCall::Translate);
    }

    fn reset_transform(&self) {
        self.push(FxCall::ResetTransform);
    }

    fn show_border(&self, thickness: u32, rgb: Rgb) {
        self.push(FxCall::ShowBorder(thickness, rgb));
    }

    fn hide_border(&self) {
        self.push(FxCall::HideBorder);
    }

    fn start_pulse(&self, plan: &PulsePlan) {
        self.push(FxCall::StartPulse(plan.iterations));
    }

    fn stop_pulse(&self) {
        self.push(FxCall::StopPulse);
    }

    fn draw_shards(&self, shards: &[Shard]) {
        self.push(FxCall::Shards(shards.len()));
    }

    fn draw_confetti(&self, pieces: &[ConfettiPiece]) {
        self.push(FxCall::Confetti(pieces.len()));
    }

    fn clear_confetti(&self) {
        self.push(FxCall::ClearConfetti);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store and host data
// ─────────────────────────────────────────────────────────────────────────────

/// Reads succeed with `value`; every write is rejected.
pub struct ReadOnlyStore {
    value: Option<Value>,
}

impl ReadOnlyStore {
    pub fn new(value: Option<Value>) -> Self {
        Self { value }
    }
}

impl SettingsStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.value.clone())
    }

    fn set(&self, key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Rejected {
            key: key.to_string(),
            reason: "read-only".to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeChat {
    messages: Mutex<Vec<ChatMessage>>,
}

impl FakeChat {
    pub fn insert(&self, message: ChatMessage) {
        let mut messages = lock(&self.messages);
        messages.retain(|m| m.id != message.id);
        messages.push(message);
    }

    pub fn remove(&self, id: &str) {
        lock(&self.messages).retain(|m| m.id != id);
    }
}

impl ChatLog for FakeChat {
    fn message(&self, id: &str) -> Option<ChatMessage> {
        lock(&self.messages).iter().find(|m| m.id == id).cloned()
    }
}

pub fn user(id: &str, name: &str) -> UserInfo {
    UserInfo {
        id: id.to_string(),
        name: name.to_string(),
        is_gm: false,
        color: None,
        character_id: None,
    }
}

pub fn actor(id: &str, name: &str, kind: ActorKind) -> ActorInfo {
    ActorInfo {
        id: id.to_string(),
        name: name.to_string(),
        kind,
    }
}

/// Two players (one owning `Actor.hero`), a GM, and a few actors.
pub fn table_roster() -> StaticRoster {
    let mut ada = user("u1", "Ada");
    ada.color = Some("#00ff00".into());
    ada.character_id = Some("Actor.hero".into());
    let mut gm = user("gm", "Game Master");
    gm.is_gm = true;
    StaticRoster {
        users: vec![ada, user("u2", "Bram"), gm],
        actors: vec![
            actor("Actor.hero", "Hero", ActorKind::Character),
            actor("Actor.orc", "Orc Brute", ActorKind::Adversary),
            actor("Actor.cart", "Cart", ActorKind::Other),
        ],
    }
}
