//! Configuration file
//!
//! A single JSON object, e.g.
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/postline",
//!   "username": "alice",
//!   "full_name": "Alice Liddell",
//!   "post_url": "https://alice.example/"
//! }
//! ```
//!
//! Optional fields fall back to their defaults. The file is validated as a
//! whole on load; nothing is opened before validation passes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;
use crate::post::{Owner, Paginator};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `store.log` (required)
    pub data_dir: String,

    /// Namespace owner (required, no `!`)
    pub username: String,

    /// Display name stamped on every new post (required)
    pub full_name: String,

    /// Default origin URL for new posts
    #[serde(default)]
    pub post_url: String,

    /// Listing window; one slot is the "has more" sentinel
    #[serde(default = "default_page_window")]
    pub page_window: usize,

    #[serde(default = "default_feed_timeout_ms")]
    pub feed_timeout_ms: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_window() -> usize {
    11
}
fn default_feed_timeout_ms() -> u64 {
    10_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Minimal config with defaults for everything optional
    pub fn new(
        data_dir: impl Into<String>,
        username: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            username: username.into(),
            full_name: full_name.into(),
            post_url: String::new(),
            page_window: default_page_window(),
            feed_timeout_ms: default_feed_timeout_ms(),
            log_level: default_log_level(),
        }
    }

    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir is required".into()));
        }

        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username is required".into()));
        }
        if self.username.contains('!') {
            return Err(ConfigError::Invalid(format!(
                "username '{}' must not contain '!'",
                self.username
            )));
        }

        if self.full_name.trim().is_empty() {
            return Err(ConfigError::Invalid("full_name is required".into()));
        }

        if self.feed_timeout_ms == 0 {
            return Err(ConfigError::Invalid("feed_timeout_ms must be > 0".into()));
        }

        self.log_severity()?;

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn owner(&self) -> Owner {
        Owner::new(&self.username, &self.full_name, &self.post_url)
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::from_window(self.page_window)
    }

    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}
