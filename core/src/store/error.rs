//! Error types for settings persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a [`super::SettingsStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read settings file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings file {path}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings file {path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("failed to encode setting '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode setting '{key}'")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("write rejected for setting '{key}': {reason}")]
    Rejected { key: String, reason: String },

    #[error("settings store lock poisoned")]
    Poisoned,
}
