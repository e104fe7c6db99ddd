use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "controller_sim.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimSettings {
    pub bind_addr: String,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:81".into(),
        }
    }
}

pub fn load_settings() -> SimSettings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// File values first, then `SIM__*` overrides. Unreadable files are ignored.
pub fn load_settings_from<F>(path: &Path, lookup: F) -> SimSettings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = SimSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr") {
                    settings.bind_addr = v.clone();
                }
            }
            Err(err) => tracing::warn!(path = %path.display(), %err, "ignoring unreadable config"),
        }
    }

    if let Some(v) = lookup("SIM__BIND_ADDR") {
        settings.bind_addr = v;
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
