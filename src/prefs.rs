//! Best-effort boolean preferences.
//!
//! Reads never fail from the caller's point of view: a missing or unreadable
//! store reads as "off".

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Preference key for the snow effect.
pub const SNOW_PREFERENCE: &str = "snowEnabled";

pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}

/// Read a flag, treating absence and store failures as `false`.
pub fn load_flag(store: &dyn PreferenceStore, key: &str) -> bool {
    match store.get_bool(key) {
        Ok(value) => value.unwrap_or(false),
        Err(e) => {
            info!("Preference store unavailable, '{}' reads as off: {:#}", key, e);
            false
        }
    }
}

/// Persist a flag; failures are logged and swallowed.
pub fn save_flag(store: &dyn PreferenceStore, key: &str, value: bool) {
    if let Err(e) = store.set_bool(key, value) {
        warn!("Preference store not writable, '{}' not saved: {:#}", key, e);
    }
}

/// JSON object on disk: `~/.cardview/preferences.json`.
pub struct FilePreferences {
    file: PathBuf,
}

impl FilePreferences {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.file.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.file.display()))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("{} is not a JSON object", self.file.display()),
        }
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let map = self.read_map()?;
        // Older stores wrote the strings "true" / "false".
        Ok(match map.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => Some(s == "true"),
            _ => None,
        })
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        // A corrupt file is replaced rather than blocking the write.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), Value::Bool(value));
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(map))?;
        std::fs::write(&self.file, json)
            .with_context(|| format!("failed to write {}", self.file.display()))?;
        Ok(())
    }
}

/// Process-lifetime store, for `--no-persist` runs.
#[derive(Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, bool>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("preference lock poisoned"))?;
        Ok(values.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("preference lock poisoned"))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
