//! Panel configuration: defaults, then `panel.toml`, then `PANEL__*`
//! environment variables. Command-line flags are applied by the apps on top.

use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    bootstrap::BootstrapPolicy,
    retry::{Backoff, RetryPolicy},
    session::SessionSettings,
    transport::{controller_endpoint, TransportConfig, DEFAULT_CONTROLLER_PORT},
};

pub const DEFAULT_CONFIG_FILE: &str = "panel.toml";
const ENV_PREFIX: &str = "PANEL__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub controller_host: String,
    pub controller_port: u16,
    pub reconnect_delay_ms: u64,
    pub reconnect_backoff: BackoffKind,
    pub reconnect_max_delay_ms: u64,
    pub reconnect_max_attempts: Option<u32>,
    pub bootstrap_poll_ms: u64,
    pub bootstrap_policy: BootstrapPolicy,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            controller_host: "127.0.0.1".into(),
            controller_port: DEFAULT_CONTROLLER_PORT,
            reconnect_delay_ms: 2_000,
            reconnect_backoff: BackoffKind::Fixed,
            reconnect_max_delay_ms: 30_000,
            reconnect_max_attempts: None,
            bootstrap_poll_ms: 400,
            bootstrap_policy: BootstrapPolicy::EveryOpen,
        }
    }
}

impl PanelSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        let initial = Duration::from_millis(self.reconnect_delay_ms);
        let backoff = match self.reconnect_backoff {
            BackoffKind::Fixed => Backoff::Fixed(initial),
            BackoffKind::Exponential => Backoff::Exponential {
                initial,
                max: Duration::from_millis(self.reconnect_max_delay_ms.max(self.reconnect_delay_ms)),
            },
        };
        RetryPolicy {
            backoff,
            max_attempts: self.reconnect_max_attempts,
        }
    }

    pub fn transport_config(&self) -> anyhow::Result<TransportConfig> {
        let endpoint = controller_endpoint(&self.controller_host, self.controller_port)
            .with_context(|| {
                format!(
                    "invalid controller address '{}:{}'",
                    self.controller_host, self.controller_port
                )
            })?;
        Ok(TransportConfig {
            endpoint,
            retry: self.retry_policy(),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            bootstrap_policy: self.bootstrap_policy,
            bootstrap_poll: Duration::from_millis(self.bootstrap_poll_ms),
            ..SessionSettings::default()
        }
    }
}

/// Reads `path` (missing file means defaults) and applies process
/// environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<PanelSettings> {
    let mut settings = read_file(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn read_file(path: &Path) -> anyhow::Result<PanelSettings> {
    match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(PanelSettings::default()),
        Err(err) => Err(err)
            .with_context(|| format!("failed to read config file '{}'", path.display())),
    }
}

/// Applies `PANEL__<FIELD>` overrides resolved through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut PanelSettings, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()));

    if let Some(v) = get("controller_host") {
        settings.controller_host = v;
    }
    if let Some(v) = get("controller_port") {
        settings.controller_port = parse_env("controller_port", &v)?;
    }
    if let Some(v) = get("reconnect_delay_ms") {
        settings.reconnect_delay_ms = parse_env("reconnect_delay_ms", &v)?;
    }
    if let Some(v) = get("reconnect_backoff") {
        settings.reconnect_backoff = parse_enum("reconnect_backoff", &v)?;
    }
    if let Some(v) = get("reconnect_max_delay_ms") {
        settings.reconnect_max_delay_ms = parse_env("reconnect_max_delay_ms", &v)?;
    }
    if let Some(v) = get("reconnect_max_attempts") {
        settings.reconnect_max_attempts = if v.trim().is_empty() {
            None
        } else {
            Some(parse_env("reconnect_max_attempts", &v)?)
        };
    }
    if let Some(v) = get("bootstrap_poll_ms") {
        settings.bootstrap_poll_ms = parse_env("bootstrap_poll_ms", &v)?;
    }
    if let Some(v) = get("bootstrap_policy") {
        settings.bootstrap_policy = parse_enum("bootstrap_policy", &v)?;
    }
    Ok(())
}

fn parse_env<T>(field: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid {ENV_PREFIX}{} value '{raw}'", field.to_ascii_uppercase()))
}

fn parse_enum<T: for<'de> Deserialize<'de>>(field: &str, raw: &str) -> anyhow::Result<T> {
    T::deserialize(serde::de::value::StrDeserializer::<serde::de::value::Error>::new(
        raw.trim(),
    ))
    .with_context(|| format!("invalid {ENV_PREFIX}{} value '{raw}'", field.to_ascii_uppercase()))
}
