//! Token engine configuration.

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Configuration for token issuance and verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Environment variable containing the signing secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: Option<String>,

    /// Path to a file containing the signing secret.
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    /// Issuer written into every token and required on verification.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Token lifetime (e.g., "24h", "30m", "7d").
    #[serde(default = "default_lifetime")]
    pub lifetime: String,

    /// Tolerated clock drift when checking the issued-at claim.
    #[serde(default)]
    pub allow_clock_skew_seconds: u64,

    /// Reject tokens whose issued-at lies in the future.
    #[serde(default)]
    pub strict_issued_at: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_env: default_secret_env(),
            secret_file: None,
            issuer: default_issuer(),
            lifetime: default_lifetime(),
            allow_clock_skew_seconds: 0,
            strict_issued_at: false,
        }
    }
}

impl TokenConfig {
    /// Resolve the signing secret from environment or file.
    ///
    /// The text is wrapped as soon as it is read, so it is zeroized on drop.
    pub fn resolve_secret(&self) -> Result<SecretString, ConfigError> {
        // Try environment variable first
        if let Some(env_var) = &self.secret_env {
            if let Ok(secret) = std::env::var(env_var) {
                if !secret.is_empty() {
                    return Ok(SecretString::new(secret.into()));
                }
            }
        }

        // Try file path
        if let Some(path) = &self.secret_file {
            if path.exists() {
                let raw = SecretString::new(std::fs::read_to_string(path)?.into());
                return Ok(SecretString::new(raw.expose_secret().trim().into()));
            }
        }

        Err(ConfigError::MissingSecret)
    }

    /// Parse the configured lifetime.
    pub fn lifetime_duration(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.lifetime)
    }
}

/// Parse a duration string like "24h", "7d", "30m" or "90s".
///
/// A bare number is read as hours. The result must be positive.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim().to_lowercase();
    let invalid = || ConfigError::InvalidDuration(s.clone());

    let (digits, unit): (&str, fn(i64) -> Duration) = if let Some(d) = s.strip_suffix('d') {
        (d, Duration::days)
    } else if let Some(h) = s.strip_suffix('h') {
        (h, Duration::hours)
    } else if let Some(m) = s.strip_suffix('m') {
        (m, Duration::minutes)
    } else if let Some(sec) = s.strip_suffix('s') {
        (sec, Duration::seconds)
    } else {
        (s.as_str(), Duration::hours)
    };

    let value: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }
    // Duration::days and friends panic past roughly i64::MAX milliseconds.
    if value > i64::MAX / 1000 / 86_400 {
        return Err(invalid());
    }
    Ok(unit(value))
}

fn default_secret_env() -> Option<String> {
    Some("VOUCH_SECRET".to_string())
}

fn default_issuer() -> String {
    "vouch".to_string()
}

fn default_lifetime() -> String {
    "24h".to_string()
}
