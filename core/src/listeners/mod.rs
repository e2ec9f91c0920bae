//! Host event handling
//!
//! [`CritListener`] is the single entry point for host events. It classifies
//! each event, drops duplicates, parks chat messages while a dice animation
//! plays, and hands everything that qualifies to the engine.

mod classify;
mod debounce;
mod events;
mod pending;


pub use classify::{
    Detection, TAG_TEAM_SETTING, classify_level_up, classify_message, classify_tag_team,
    is_tag_team_setting, roll_class,
};
pub use debounce::{DEBOUNCE_WINDOW, Debouncer};
pub use events::{
    ActorUpdate, ChatMessage, Die, DieResult, HostEvent, RollData, TagTeamInitiator, TagTeamState,
};
pub use pending::{DiscardReason, PENDING_TTL, PendingEvents, Resumed};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::debug_log;
use crate::dispatch::{DispatchContext, DispatchReport, lock};
use crate::engine::CritEngine;
use crate::host::{ChatLog, Roster};
use crate::store::keys;

/// What happened to one host event.
#[derive(Debug)]
pub enum ListenerOutcome {
    /// Not a qualifying event
    Ignored,
    /// Waiting for the message's animation to complete
    Deferred,
    /// Sent to the engine; `None` when no entry matched
    Fired(Option<DispatchReport>),
    /// Parked earlier, failed re-validation
    Discarded(DiscardReason),
    /// Same logical event already fired inside the window
    Debounced,
}

pub struct CritListener {
    engine: Arc<CritEngine>,
    roster: Arc<dyn Roster>,
    chat: Arc<dyn ChatLog>,
    animations_active: AtomicBool,
    pending: Mutex<PendingEvents>,
    debounce: Mutex<Debouncer>,
}

impl CritListener {
    pub fn new(engine: Arc<CritEngine>, roster: Arc<dyn Roster>, chat: Arc<dyn ChatLog>) -> Self {
        Self {
            engine,
            roster,
            chat,
            animations_active: AtomicBool::new(false),
            pending: Mutex::new(PendingEvents::new()),
            debounce: Mutex::new(Debouncer::default()),
        }
    }

    /// Whether a dice animation module is running. While set, chat messages
    /// wait for their animation-complete signal. Turning it off drops every
    /// parked message, since no completion will follow.
    pub fn set_animations_active(&self, active: bool) {
        let was = self.animations_active.swap(active, Ordering::Relaxed);
        if was && !active {
            let flushed = lock(&self.pending).flush();
            if flushed > 0 {
                tracing::debug!(flushed, "Animations turned off, dropped parked messages");
            }
        }
    }

    pub fn animations_active(&self) -> bool {
        self.animations_active.load(Ordering::Relaxed)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Handle one event. Must be called inside a tokio runtime.
    pub fn handle(&self, event: &HostEvent) -> ListenerOutcome {
        match event {
            HostEvent::MessageCreated(message) => self.on_message(message),
            HostEvent::AnimationComplete { message_id } => self.on_animation_complete(message_id),
            HostEvent::ActorUpdated(update) => match classify_level_up(update, &*self.roster) {
                Some(detection) => self.fire(detection),
                None => ListenerOutcome::Ignored,
            },
            HostEvent::SettingChanged { key, value } => self.on_setting(key, value),
        }
    }

    fn on_message(&self, message: &ChatMessage) -> ListenerOutcome {
        let Some(detection) = classify_message(message) else {
            return ListenerOutcome::Ignored;
        };
        if self.animations_active() {
            lock(&self.pending).park(&message.id, detection);
            return ListenerOutcome::Deferred;
        }
        self.fire(detection)
    }

    fn on_animation_complete(&self, message_id: &str) -> ListenerOutcome {
        let resumed = lock(&self.pending).resume(message_id, &*self.chat);
        match resumed {
            Resumed::Fire(detection) => self.fire(detection),
            Resumed::Discard(reason) => {
                debug_log!("Discarded {} ({:?})", message_id, reason);
                ListenerOutcome::Discarded(reason)
            }
            Resumed::Unknown => ListenerOutcome::Ignored,
        }
    }

    fn on_setting(&self, key: &str, value: &Value) -> ListenerOutcome {
        if key == keys::DEBUG_MODE || key.ends_with(&format!(".{}", keys::DEBUG_MODE)) {
            crate::debug_log::set_enabled(value.as_bool().unwrap_or(false));
            return ListenerOutcome::Ignored;
        }
        if !is_tag_team_setting(key) {
            return ListenerOutcome::Ignored;
        }
        let state: TagTeamState = match serde_json::from_value(value.clone()) {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(error = %err, "Unreadable tag team state");
                return ListenerOutcome::Ignored;
            }
        };
        match classify_tag_team(&state) {
            Some(detection) => self.fire(detection),
            None => ListenerOutcome::Ignored,
        }
    }

    fn fire(&self, detection: Detection) -> ListenerOutcome {
        if !lock(&self.debounce).check(&detection.key) {
            debug_log!("Debounced {}", detection.key);
            return ListenerOutcome::Debounced;
        }
        let user_color = detection
            .user_id
            .as_deref()
            .and_then(|id| self.roster.user(id))
            .and_then(|user| user.color);
        let report = self
            .engine
            .resolve_and_dispatch(&detection.trigger, &DispatchContext::live(user_color));
        ListenerOutcome::Fired(report)
    }
}
