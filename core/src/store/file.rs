//! File-backed settings store
//!
//! All keys live in one JSON object on disk. Writes go to a sibling temp
//! file that is then renamed over the original, so a crash mid-write never
//! leaves a truncated document behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use super::{SettingsStore, StoreError};

const FILE_NAME: &str = "settings.json";

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            Self::read(&path)?
        } else {
            Map::new()
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "Opened settings file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// `<config dir>/crit/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crit").join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<Map<String, Value>, StoreError> {
        let contents = fs::read_to_string(path).map_err(|source| StoreError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::NotAnObject {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(StoreError::ParseFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::WriteFile {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let encoded = serde_json::to_string_pretty(values).map_err(|source| StoreError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        let previous = values.insert(key.to_string(), value);
        if let Err(err) = self.persist(&values) {
            // Keep memory consistent with disk
            match previous {
                Some(prev) => values.insert(key.to_string(), prev),
                None => values.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}
