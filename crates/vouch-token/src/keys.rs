//! Signing secret management.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox, SecretString};
use std::fmt;
use std::path::Path;
use vouch_core::{ConfigError, TokenConfig};

/// Minimum secret length in bytes (a full 512-bit HMAC-SHA512 key).
pub const MIN_SECRET_LEN: usize = 64;

/// The symmetric key used to sign and verify tokens.
///
/// The bytes are zeroized on drop and never appear in `Debug` output.
pub struct SigningSecret {
    inner: SecretBox<[u8]>,
}

impl SigningSecret {
    /// Wrap raw secret bytes, enforcing the minimum length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ConfigError> {
        let inner = SecretBox::new(bytes.into_boxed_slice());
        let actual = inner.expose_secret().len();
        if actual < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                actual,
                minimum: MIN_SECRET_LEN,
            });
        }
        Ok(Self { inner })
    }

    /// Use the UTF-8 bytes of a configured secret string.
    pub fn from_text(text: &str) -> Result<Self, ConfigError> {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    /// Load a secret from a file, ignoring surrounding whitespace.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = SecretString::new(std::fs::read_to_string(path)?.into());
        Self::from_text(text.expose_secret().trim())
    }

    /// Resolve the secret named by the token configuration (env, then file).
    pub fn from_config(config: &TokenConfig) -> Result<Self, ConfigError> {
        Self::from_text(config.resolve_secret()?.expose_secret())
    }

    /// Length of the secret in bytes.
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Generate a fresh random secret, rendered as unpadded base64url text.
///
/// The text itself is what gets configured; its bytes are the key.
pub fn generate_secret_text() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; MIN_SECRET_LEN];
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
