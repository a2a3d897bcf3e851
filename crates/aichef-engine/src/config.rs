//! Configuration for the aichef client.
//!
//! Stored as JSON. Every field has a default, so a partial file (or none at
//! all) still produces a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory (relative to the working directory) holding config and logs.
pub const AICHEF_DIR: &str = ".aichef";

/// Default config file name inside [`AICHEF_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL each message is posted to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds. `None` waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Whether a new message may be sent while a reply is pending.
    #[serde(default)]
    pub submit_policy: SubmitPolicy,

    /// Label shown for assistant turns.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:5000/send_message".into()
}

fn default_assistant_name() -> String {
    "The AI Chef".into()
}

/// Policy for submits made while an exchange is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    /// Overlapping exchanges are allowed.
    #[default]
    Unguarded,
    /// Submits are ignored until the pending reply resolves.
    RejectWhileAwaiting,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: None,
            submit_policy: SubmitPolicy::default(),
            assistant_name: default_assistant_name(),
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}
