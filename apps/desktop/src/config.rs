use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "desktop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub latency_ms: u64,
    pub saved_state_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            latency_ms: 300,
            saved_state_path: None,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    latency_ms: Option<u64>,
    saved_state_path: Option<PathBuf>,
    log_filter: Option<String>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if present, then `APP__*` overrides
/// looked up through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.latency_ms {
                    settings.latency_ms = v;
                }
                if let Some(v) = file_cfg.saved_state_path {
                    settings.saved_state_path = Some(v);
                }
                if let Some(v) = file_cfg.log_filter {
                    settings.log_filter = v;
                }
            }
            // logging is configured from these settings, so report directly
            Err(err) => eprintln!("ignoring malformed {}: {err}", path.display()),
        }
    }

    if let Some(v) = env("APP__LATENCY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.latency_ms = parsed;
        }
    }
    if let Some(v) = env("APP__SAVED_STATE_PATH") {
        settings.saved_state_path = (!v.trim().is_empty()).then(|| PathBuf::from(v));
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}
