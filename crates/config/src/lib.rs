//! Configuration loading, validation, and management for GreenBible.
//!
//! Loads configuration from `~/.greenbible/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.greenbible/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative-language API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Gemini endpoint configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Chat pipeline settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Location context settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Where history and tasks are persisted
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("gemini", &self.gemini)
            .field("chat", &self.chat)
            .field("location", &self.location)
            .field("storage", &self.storage)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL of the models collection
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_user_agent() -> String {
    "GreenGarden/1.0".into()
}
fn default_timeout_secs() -> u64 {
    20
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How many earlier messages are quoted in each prompt
    #[serde(default = "default_context_messages")]
    pub context_messages: usize,
}

fn default_context_messages() -> usize {
    5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_messages: default_context_messages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Whether the user allows location to be shared with the model
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Human-readable place name, e.g. "Austin, Texas, United States"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// BCP 47 locale tag
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_true() -> bool {
    true
}
fn default_locale() -> String {
    "en-US".into()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            label: None,
            locale: default_locale(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the data directory (default: `~/.greenbible/data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.greenbible/config.toml).
    ///
    /// Also checks environment variables:
    /// - `GREENBIBLE_API_KEY` (highest priority), then `GEMINI_API_KEY`
    /// - `GREENBIBLE_MODEL`
    /// - `GREENBIBLE_LOCALE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("GREENBIBLE_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(model) = std::env::var("GREENBIBLE_MODEL") {
            config.gemini.model = model;
        }

        if let Ok(locale) = std::env::var("GREENBIBLE_LOCALE") {
            config.location.locale = locale;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".greenbible")
    }

    /// Directory holding persisted history and tasks.
    pub fn data_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => Self::config_dir().join("data"),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gemini.timeout_secs must be > 0".into(),
            ));
        }

        if self.chat.context_messages > 50 {
            return Err(ConfigError::ValidationError(
                "chat.context_messages must be at most 50".into(),
            ));
        }

        if let Some(lat) = self.location.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ConfigError::ValidationError(
                    "location.latitude must be between -90 and 90".into(),
                ));
            }
        }

        if let Some(lon) = self.location.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ConfigError::ValidationError(
                    "location.longitude must be between -180 and 180".into(),
                ));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gemini: GeminiConfig::default(),
            chat: ChatConfig::default(),
            location: LocationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
