//! Configuration management for subwatch.
//!
//! Configuration is read from `~/.config/subwatch/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! `SUBWATCH_CLIENT_ID` and `SUBWATCH_CLIENT_SECRET` override the credentials
//! found in the file.

pub mod interval;

pub use interval::{format_interval, parse_interval};

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CLIENT_ID_ENV: &str = "SUBWATCH_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SUBWATCH_CLIENT_SECRET";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reddit: RedditConfig,
    pub polling: PollingConfig,
    pub cache: CacheConfig,
}

/// Credentials and endpoints of the remote API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub token_url: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: format!("subwatch/{}", env!("CARGO_PKG_VERSION")),
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_base: "https://oauth.reddit.com/r".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval: String,
    pub baseline_ttl: String,
    pub channel_capacity: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: "2s".to_string(),
            baseline_ttl: "2h".to_string(),
            channel_capacity: 16,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        parse_interval(&self.interval).map_err(|message| ConfigError::InvalidValue {
            field: "polling.interval",
            message,
        })
    }

    pub fn baseline_ttl(&self) -> Result<Duration, ConfigError> {
        parse_interval(&self.baseline_ttl).map_err(|message| ConfigError::InvalidValue {
            field: "polling.baseline_ttl",
            message,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_capacity: 1000 }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, applying environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/subwatch/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("subwatch").join("config.toml"))
    }

    /// Override credentials with values from `lookup` (normally the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_blank(CLIENT_ID_ENV) {
            self.reddit.client_id = Some(id);
        }
        if let Some(secret) = non_blank(CLIENT_SECRET_ENV) {
            self.reddit.client_secret = Some(secret);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval()?.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval",
                message: "must be greater than zero".to_string(),
            });
        }
        self.polling.baseline_ttl()?;

        if self.reddit.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "reddit.user_agent",
                message: "a User-Agent is required by the API".to_string(),
            });
        }
        if self.polling.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.channel_capacity",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# subwatch configuration
#
# Durations accept a unit suffix: "45s", "30m", "2h", "1d" (raw numbers are seconds).

[reddit]
# OAuth2 application credentials. Prefer the SUBWATCH_CLIENT_ID and
# SUBWATCH_CLIENT_SECRET environment variables over storing them here.
# client_id = ""
# client_secret = ""

# The API rejects requests without a descriptive User-Agent
user_agent = "subwatch/0.1.0"

token_url = "https://www.reddit.com/api/v1/access_token"
api_base = "https://oauth.reddit.com/r"

# Per-request timeout in seconds
timeout_secs = 10

[polling]
# Time between the start of two polls of the same subreddit
interval = "2s"

# How long a freshly built baseline stays in the in-memory cache
baseline_ttl = "2h"

# Number of unread batches buffered per subscriber
channel_capacity = 16

[cache]
max_capacity = 1000
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}
