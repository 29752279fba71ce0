use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::retry::Backoff;

/// Invalid client or backoff settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("backoff base sleep must be greater than zero")]
    ZeroBaseSleep,
    #[error("backoff max sleep {max:?} is below base sleep {base:?}")]
    MaxBelowBase { base: Duration, max: Duration },
    #[error("transport timeout must be greater than zero")]
    ZeroTimeout,
}

/// Backoff bounds in milliseconds (optional section in config.toml).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum wait between attempts.
    pub base_sleep_ms: u64,
    /// Ceiling for any single wait.
    pub max_sleep_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_sleep_ms: 100,
            max_sleep_ms: 5000,
        }
    }
}

impl BackoffConfig {
    pub fn to_backoff(&self) -> Result<Backoff, ConfigError> {
        Backoff::from_millis(self.base_sleep_ms, self.max_sleep_ms)
    }
}

/// Client configuration loaded from `~/.config/webutils/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request transport timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (None = libcurl default).
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    /// Only retry transport errors that are timeouts; other transport errors are fatal.
    pub timeout_only: bool,
    /// Default attempt budget per request (including the first).
    pub max_tries: u32,
    /// Default cap on concurrent requests for batch work.
    pub max_in_flight: usize,
    /// Optional backoff bounds; if missing, built-in defaults are used.
    #[serde(default)]
    pub backoff: Option<BackoffConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            connect_timeout_ms: None,
            timeout_only: true,
            max_tries: 3,
            max_in_flight: 8,
            backoff: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Backoff from the `[backoff]` section, or the default bounds.
    pub fn backoff(&self) -> Result<Backoff, ConfigError> {
        self.backoff.unwrap_or_default().to_backoff()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.backoff().map(|_| ())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("webutils")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Pretty TOML for a config, as written by `load_or_init`.
pub fn to_toml(cfg: &ClientConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClientConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ClientConfig::default();
        let toml = to_toml(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate a config file at an explicit path.
pub fn load_from_path(path: &Path) -> Result<ClientConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: ClientConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
