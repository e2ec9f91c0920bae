//! Operator settings for the CLI, persisted with confy
//!
//! These only describe where things live. Critical configurations
//! themselves stay in the JSON settings store.

use std::path::PathBuf;

use crit_core::JsonFileStore;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "crit";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Settings file; `None` uses `<config dir>/crit/settings.json`
    pub store_path: Option<PathBuf>,
    /// Root that sound and art paths are resolved against
    pub asset_root: PathBuf,
    /// JSON file with `{ "users": [...], "actors": [...] }`
    pub roster_file: Option<PathBuf>,
    /// Start with critical debug mode on
    pub debug: bool,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            asset_root: dirs::data_dir()
                .map(|dir| dir.join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from(".")),
            roster_file: None,
            debug: false,
            viewport_width: 1920.0,
            viewport_height: 1080.0,
        }
    }
}

impl CliConfig {
    /// Loads the config, falling back to defaults. Runs before logging is
    /// set up, so a load failure comes back as a message to log later.
    pub fn load() -> (Self, Option<String>) {
        Self::or_default(confy::load(APP_NAME, CONFIG_NAME))
    }

    fn or_default<E: std::fmt::Display>(loaded: Result<Self, E>) -> (Self, Option<String>) {
        match loaded {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err.to_string())),
        }
    }

    pub fn save(&self) -> Result<(), String> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(|e| e.to_string())
    }

    pub fn config_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
    }

    /// The settings file this config points at.
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        self.store_path.clone().or_else(JsonFileStore::default_path)
    }
}
