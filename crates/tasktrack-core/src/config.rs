//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the host location the client acts for, the production API origin,
//! the default request timeout and the session storage backend.
//!
//! Configuration is stored at `~/.config/tasktrack/config.json`. Selected
//! fields can be overridden through `TASKTRACK_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::location::{HostLocation, DEFAULT_PRODUCTION_BASE_URL};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "tasktrack";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const ENV_LOCATION: &str = "TASKTRACK_LOCATION";
const ENV_PRODUCTION_ORIGIN: &str = "TASKTRACK_PRODUCTION_ORIGIN";
const ENV_TIMEOUT_MS: &str = "TASKTRACK_TIMEOUT_MS";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// URL of the page the client acts for, e.g. `http://192.168.1.20/tasks`.
    pub location: Option<String>,
    pub production_origin: Option<String>,
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub session_store: SessionBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `TASKTRACK_*` environment overrides on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(location) = lookup(ENV_LOCATION).filter(|v| !v.is_empty()) {
            self.location = Some(location);
        }
        if let Some(origin) = lookup(ENV_PRODUCTION_ORIGIN).filter(|v| !v.is_empty()) {
            self.production_origin = Some(origin);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.request_timeout_ms = Some(ms),
                Err(_) => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_MS),
            }
        }
    }

    pub fn host_location(&self) -> HostLocation {
        self.location
            .as_deref()
            .map(HostLocation::parse)
            .unwrap_or_default()
    }

    pub fn production_origin(&self) -> &str {
        self.production_origin
            .as_deref()
            .unwrap_or(DEFAULT_PRODUCTION_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
