//! Global calpick configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalPickError, CalPickResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/calpick";
static DEFAULT_USER: &str = "local";
const DEFAULT_SELECTION_DEBOUNCE_MS: u64 = 500;

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_selection_debounce_ms() -> u64 {
    DEFAULT_SELECTION_DEBOUNCE_MS
}

/// Configuration at ~/.config/calpick/config.toml
///
/// Every key can be overridden with a `CALPICK_` environment variable,
/// e.g. `CALPICK_TIMEZONE=Europe/Berlin`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalpickConfig {
    /// Where per-session selections are stored
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_user")]
    pub default_user: String,

    /// IANA zone used for month grouping
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_selection_debounce_ms")]
    pub selection_debounce_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for CalpickConfig {
    fn default() -> Self {
        CalpickConfig {
            data_dir: default_data_dir(),
            default_user: default_user(),
            timezone: default_timezone(),
            selection_debounce_ms: DEFAULT_SELECTION_DEBOUNCE_MS,
            feed_base_url: None,
            log_level: None,
        }
    }
}

impl CalpickConfig {
    pub fn config_path() -> CalPickResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalPickError::Config("Could not determine config directory".into()))?
            .join("calpick");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented file on first use.
    pub fn load() -> CalPickResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` (optional) layered under `CALPICK_*` variables.
    pub fn load_from(path: &Path) -> CalPickResult<Self> {
        let config: CalpickConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALPICK"))
            .build()
            .map_err(|e| CalPickError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalPickError::Config(e.to_string()))?;

        config.timezone()?;
        Ok(config)
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn timezone(&self) -> CalPickResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| CalPickError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    /// Write the current config to `path` as TOML.
    pub fn save(&self, path: &Path) -> CalPickResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CalPickError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| CalPickError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalPickResult<()> {
        let contents = format!(
            "\
# calpick configuration

# Where selections are stored:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# User id used when --user is not given:
# default_user = \"{DEFAULT_USER}\"

# Time zone for month grouping in previews:
# timezone = \"Europe/Berlin\"

# Quiet window before a selection change is written (milliseconds):
# selection_debounce_ms = {DEFAULT_SELECTION_DEBOUNCE_MS}

# Base URL of the filtered feed service:
# feed_base_url = \"https://feeds.example.com/filtered\"

# log_level = \"info\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalPickError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalPickError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
