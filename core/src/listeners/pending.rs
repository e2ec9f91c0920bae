//! Events parked while a dice animation plays
//!
//! Each parked message goes `Pending → Fired` or `Pending → Discarded` on its
//! animation-complete signal. Resuming re-reads the message from the chat
//! log and classifies it again; anything that no longer qualifies, or now
//! qualifies differently, is dropped. Messages whose signal never arrives
//! expire after [`PENDING_TTL`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::classify::{Detection, classify_message};
use crate::debug_log;
use crate::host::ChatLog;

/// How long a parked message waits for its animation-complete signal
pub const PENDING_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Parked {
    detection: Detection,
    since: Instant,
}

/// Outcome of resuming a parked message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumed {
    /// Still qualifies as it did when parked
    Fire(Detection),
    Discard(DiscardReason),
    /// Nothing was parked under that id
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    MessageGone,
    NoLongerQualifies,
    Reclassified,
    /// Waited longer than the pending window
    Expired,
}

#[derive(Debug)]
pub struct PendingEvents {
    ttl: Duration,
    parked: HashMap<String, Parked>,
}

impl Default for PendingEvents {
    fn default() -> Self {
        Self::with_ttl(PENDING_TTL)
    }
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            parked: HashMap::new(),
        }
    }

    /// Park a detection under its message id. A second park for the same
    /// id keeps the first.
    pub fn park(&mut self, message_id: &str, detection: Detection) -> bool {
        self.expire();
        if self.parked.contains_key(message_id) {
            return false;
        }
        debug_log!("Parked {} until its animation completes", message_id);
        self.parked.insert(
            message_id.to_string(),
            Parked {
                detection,
                since: Instant::now(),
            },
        );
        true
    }

    pub fn is_pending(&self, message_id: &str) -> bool {
        self.parked.contains_key(message_id)
    }

    pub fn len(&self) -> usize {
        self.parked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.is_empty()
    }

    /// Drop everything parked for longer than the window. Returns how many.
    pub fn expire(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.parked.len();
        self.parked.retain(|_, parked| parked.since.elapsed() < ttl);
        let expired = before - self.parked.len();
        if expired > 0 {
            debug_log!("Expired {} parked message(s)", expired);
        }
        expired
    }

    /// Drop everything, e.g. when no animation signal can arrive any more.
    pub fn flush(&mut self) -> usize {
        let flushed = self.parked.len();
        self.parked.clear();
        flushed
    }

    /// Leave the pending state for `message_id`, re-validating against the
    /// current chat log.
    pub fn resume(&mut self, message_id: &str, chat: &dyn ChatLog) -> Resumed {
        let parked = self.parked.remove(message_id);
        self.expire();
        let Some(parked) = parked else {
            return Resumed::Unknown;
        };
        let waited = parked.since.elapsed();
        if waited >= self.ttl {
            debug_log!("Message {} expired after {:?}", message_id, waited);
            return Resumed::Discard(DiscardReason::Expired);
        }
        debug_log!("Resuming {} after {:?}", message_id, waited);

        let Some(message) = chat.message(message_id) else {
            debug_log!("Message {} was deleted while animating", message_id);
            return Resumed::Discard(DiscardReason::MessageGone);
        };
        let Some(current) = classify_message(&message) else {
            debug_log!("Message {} no longer qualifies", message_id);
            return Resumed::Discard(DiscardReason::NoLongerQualifies);
        };
        if current.trigger.entity_type != parked.detection.trigger.entity_type
            || current.trigger.tag != parked.detection.trigger.tag
        {
            debug_log!(
                "Message {} changed from {} to {}",
                message_id,
                parked.detection.trigger,
                current.trigger
            );
            return Resumed::Discard(DiscardReason::Reclassified);
        }
        Resumed::Fire(current)
    }
}
