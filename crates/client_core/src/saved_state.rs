//! Per-screen restart state.
//!
//! Screens store a small serializable snapshot under their own key when they
//! are torn down and read it back before publishing their first state. The
//! handle is cheap to clone and can be mirrored to a JSON file so snapshots
//! survive a process restart.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

#[derive(Clone, Default)]
pub struct SavedStateHandle {
    entries: Arc<Mutex<HashMap<String, serde_json::Value>>>,
}

impl SavedStateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a handle from `path`. A missing file yields an empty handle.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read saved state '{}'", path.display()))?;
        let entries: HashMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("malformed saved state '{}'", path.display()))?;
        Ok(Self {
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let encoded = {
            let entries = self
                .entries
                .lock()
                .map_err(|_| anyhow::anyhow!("saved state lock poisoned"))?;
            serde_json::to_string_pretty(&*entries).context("failed to encode saved state")?
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create saved state directory '{}'", parent.display())
            })?;
        }
        fs::write(path, encoded)
            .with_context(|| format!("failed to write saved state '{}'", path.display()))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.lock().ok()?.get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key, error = %err, "discarding unreadable saved state");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, error = %err, "failed to encode saved state");
                return;
            }
        };
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), encoded);
            }
            Err(_) => warn!(key, "saved state lock poisoned; snapshot dropped"),
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
