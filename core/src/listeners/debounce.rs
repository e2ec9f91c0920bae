//! Duplicate suppression for events reported more than once

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(5);

/// Remembers recently fired keys for a fixed window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    seen: HashMap<String, Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// `true` the first time `key` is seen within the window.
    pub fn check(&mut self, key: &str) -> bool {
        let now = Instant::now();
        let window = self.window;
        self.seen.retain(|_, at| now.duration_since(*at) < window);
        if self.seen.contains_key(key) {
            return false;
        }
        self.seen.insert(key.to_string(), now);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
