//! Configuration types for Vouch.
//!
//! Configuration is loaded by the hosting service (or the `vouch` CLI) from a
//! YAML file such as `vouch.yaml`:
//!
//! ```yaml
//! project: event-api
//! token:
//!   secret_env: VOUCH_SECRET
//!   issuer: event-api
//!   lifetime: 24h
//!   allow_clock_skew_seconds: 30
//!   strict_issued_at: true
//! ```

pub mod token;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use token::{TokenConfig, parse_duration};

/// Complete Vouch configuration loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VouchConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Token signing and verification settings.
    #[serde(default)]
    pub token: TokenConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("signing secret not configured")]
    MissingSecret,

    #[error("signing secret is {actual} bytes, at least {minimum} required")]
    SecretTooShort { actual: usize, minimum: usize },

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VouchConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}
