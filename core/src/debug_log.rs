//! Debug-mode diagnostics
//!
//! Usage: `debug_log!("message {}", value);`
//! Lines are emitted through `tracing` at debug level, but only while the
//! `debugmode` setting is on. Toggling never changes control flow.

use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn set_enabled(enabled: bool) {
    let was = ENABLED.swap(enabled, Ordering::Relaxed);
    if was != enabled {
        tracing::info!(enabled, "Critical debug mode toggled");
    }
}

/// Write a line to the debug log
pub fn log(msg: &str) {
    if !is_enabled() {
        return;
    }
    tracing::debug!(target: "crit_core::debug", "{}", msg);
}

/// Debug log macro - use like println!
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if $crate::debug_log::is_enabled() {
            $crate::debug_log::log(&format!($($arg)*))
        }
    };
}
