//! Application configuration management.
//!
//! Configuration is stored at `~/.config/erpdesk/config.json`. A few
//! settings can be overridden from the environment (or a `.env` file loaded
//! by the binary):
//!
//! - `ERPDESK_API_URL`: base URL of the profile service
//! - `ERPDESK_EXPORT_DIR`: where spreadsheet exports are written
//! - `ERPDESK_USERNAME`: username pre-filled on the login screen

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DEFAULT_BASE_URL;
use crate::store::WritePolicy;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "erpdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_API_URL: &str = "ERPDESK_API_URL";
const ENV_EXPORT_DIR: &str = "ERPDESK_EXPORT_DIR";
const ENV_USERNAME: &str = "ERPDESK_USERNAME";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub write_policy: WritePolicy,
    pub last_username: Option<String>,
}

impl Config {
    /// Load from the standard location and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from `lookup`, normally the process environment.
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = Some(url);
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR) {
            self.export_dir = Some(PathBuf::from(dir));
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.last_username = Some(username);
        }
    }

    /// `<config_dir>/erpdesk/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// Directory for local storage and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Where exports go: the configured directory, else the user's download
    /// directory, else the working directory.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
