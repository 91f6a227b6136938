//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/getcal/config.toml` by default. Everything is optional: the
//! `[google]` section can name the OAuth client directly, point at a Google
//! Cloud Console credentials JSON, or be omitted entirely (in which case the
//! default credentials file location is tried).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the getcal client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Google Calendar settings.
    pub google: Option<GoogleSettings>,
}

/// Google Calendar settings from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID.
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    /// Path to a Google Cloud Console credentials JSON file.
    ///
    /// Used when `client_id`/`client_secret` are not set directly.
    pub credentials_file: Option<PathBuf>,

    /// Calendar to query. Defaults to `"primary"`.
    pub calendar_id: Option<String>,

    /// Where to persist OAuth tokens.
    pub token_path: Option<PathBuf>,
}

impl AppConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("getcal")
            .join("config.toml")
    }

    /// Returns the default credentials JSON path tried when the config
    /// names no OAuth client.
    pub fn default_credentials_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("getcal")
            .join("credentials.json")
    }

    /// Loads configuration from the default path.
    ///
    /// A missing file is not an error; it yields the default (empty) config.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigurationMissing(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::ConfigurationMissing(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}
