//! Token issuance and verification.

use crate::claims::Claims;
use crate::error::TokenError;
use crate::keys::{MIN_SECRET_LEN, SigningSecret};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha512;
use std::sync::Arc;
use tracing::{debug, info};
use vouch_core::{ConfigError, Principal, TokenConfig};

type HmacSha512 = Hmac<Sha512>;

/// The only algorithm this engine signs with or accepts.
pub const ALGORITHM: &str = "HS512";

/// JOSE header of a token.
///
/// Fields are kept as raw JSON so a header with a non-string `alg` still
/// parses and is rejected by the algorithm check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<Value>,
}

impl Header {
    fn hs512() -> Self {
        Self {
            alg: Some(Value::String(ALGORITHM.to_string())),
            typ: Some(Value::String("JWT".to_string())),
        }
    }

    /// The declared algorithm, if it is a string.
    pub fn algorithm(&self) -> Option<&str> {
        self.alg.as_ref().and_then(Value::as_str)
    }

    fn require_hs512(&self) -> Result<(), TokenError> {
        match &self.alg {
            Some(Value::String(alg)) if alg == ALGORITHM => Ok(()),
            Some(Value::String(alg)) => Err(TokenError::UnsupportedAlgorithm(alg.clone())),
            None | Some(Value::Null) => Err(TokenError::UnsupportedAlgorithm("none".to_string())),
            Some(other) => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    fn decode(segment: &str) -> Result<Self, TokenError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| TokenError::Malformed(format!("header is not base64url: {e}")))?;
        // Go through a map so only a JSON object is accepted.
        let object: serde_json::Map<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::Malformed(format!("header is not a JSON object: {e}")))?;
        serde_json::from_value(Value::Object(object))
            .map_err(|e| TokenError::Malformed(format!("invalid header: {e}")))
    }
}

/// Issuance and verification settings.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Written as `iss` on issue, required on verify.
    pub issuer: String,
    /// Validity window of issued tokens.
    pub lifetime: Duration,
    /// Slack granted to the issued-at check.
    pub allow_clock_skew_seconds: u64,
    /// Reject tokens issued in the future (beyond the skew).
    pub strict_issued_at: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            issuer: "vouch".to_string(),
            lifetime: Duration::hours(24),
            allow_clock_skew_seconds: 0,
            strict_issued_at: false,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &TokenConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            issuer: config.issuer.clone(),
            lifetime: config.lifetime_duration()?,
            allow_clock_skew_seconds: config.allow_clock_skew_seconds,
            strict_issued_at: config.strict_issued_at,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::Config("issuer must not be empty".to_string()));
        }
        if self.lifetime.num_seconds() < 1 {
            return Err(ConfigError::InvalidDuration(format!(
                "lifetime must be at least one second, got {}s",
                self.lifetime.num_seconds()
            )));
        }
        Ok(())
    }
}

/// Issues and verifies HS512-signed bearer tokens with one shared secret.
///
/// The engine holds no mutable state; clones share the same secret and can be
/// used from any number of threads.
#[derive(Debug, Clone)]
pub struct TokenEngine {
    secret: Arc<SigningSecret>,
    options: EngineOptions,
}

impl TokenEngine {
    /// Create an engine from an already loaded secret.
    pub fn new(secret: SigningSecret, options: EngineOptions) -> Result<Self, TokenError> {
        options.validate()?;
        info!(
            issuer = %options.issuer,
            lifetime_secs = options.lifetime.num_seconds(),
            strict_issued_at = options.strict_issued_at,
            "token engine ready"
        );
        Ok(Self {
            secret: Arc::new(secret),
            options,
        })
    }

    /// Resolve the secret and options from configuration.
    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        let secret = SigningSecret::from_config(config)?;
        let options = EngineOptions::from_config(config)?;
        Self::new(secret, options)
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Issue a token for `principal`, valid from `now` for the configured lifetime.
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, TokenError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::SigningFailure("signing secret is too short".to_string()));
        }

        let claims = Claims::issue(
            principal,
            &self.options.issuer,
            now.timestamp(),
            self.options.lifetime,
        )?;

        let header_json = serde_json::to_vec(&Header::hs512())
            .map_err(|e| TokenError::SigningFailure(e.to_string()))?;

        let mut token = URL_SAFE_NO_PAD.encode(header_json);
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(claims.encode()?));

        let mut mac = self.mac()?;
        mac.update(token.as_bytes());
        let signature = mac.finalize().into_bytes();

        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(signature));

        debug!(
            subject = claims.subject(),
            role = %claims.role(),
            expires_at = claims.expires_at(),
            "issued token"
        );
        Ok(token)
    }

    /// Issue a token using the current time.
    pub fn issue_now(&self, principal: &Principal) -> Result<String, TokenError> {
        self.issue(principal, Utc::now())
    }

    /// Verify a token and extract its claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let result = self.check(token, now);
        match &result {
            Ok(claims) => debug!(subject = claims.subject(), "token verified"),
            Err(e) => debug!(kind = e.kind(), "token rejected"),
        }
        result
    }

    /// Verify a token against the current time.
    pub fn verify_now(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, Utc::now())
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let segments = Segments::split(token)?;

        Header::decode(segments.header)?.require_hs512()?;

        let signature = URL_SAFE_NO_PAD
            .decode(segments.signature)
            .map_err(|_| TokenError::BadSignature)?;
        let mut mac = self.mac()?;
        mac.update(segments.signing_input.as_bytes());
        // Constant-time; also rejects tags of the wrong length.
        mac.verify_slice(&signature).map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(segments.claims)
            .map_err(|e| TokenError::MalformedClaims(format!("claims are not base64url: {e}")))?;
        let claims = Claims::decode(&payload)?;

        if claims.issuer() != self.options.issuer {
            return Err(TokenError::IssuerMismatch {
                found: claims.issuer().to_string(),
            });
        }

        let now = now.timestamp();
        if now >= claims.expires_at() {
            return Err(TokenError::Expired {
                expired_at: claims.expires_at(),
            });
        }
        if self.options.strict_issued_at {
            let skew = i64::try_from(self.options.allow_clock_skew_seconds).unwrap_or(i64::MAX);
            if claims.issued_at() > now.saturating_add(skew) {
                return Err(TokenError::NotYetIssued {
                    issued_at: claims.issued_at(),
                });
            }
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha512, TokenError> {
        HmacSha512::new_from_slice(self.secret.expose())
            .map_err(|e| TokenError::SigningFailure(e.to_string()))
    }
}

/// The three segments of a compact token, borrowed from the input.
struct Segments<'a> {
    header: &'a str,
    claims: &'a str,
    signature: &'a str,
    /// `header.claims`, exactly as received.
    signing_input: &'a str,
}

impl<'a> Segments<'a> {
    fn split(token: &'a str) -> Result<Self, TokenError> {
        let wrong_count = || TokenError::Malformed("expected three segments".to_string());

        let (signing_input, signature) = token.rsplit_once('.').ok_or_else(wrong_count)?;
        let (header, claims) = signing_input.split_once('.').ok_or_else(wrong_count)?;
        if claims.contains('.') {
            return Err(wrong_count());
        }

        Ok(Self {
            header,
            claims,
            signature,
            signing_input,
        })
    }
}

/// Decode a token without verifying it (for debugging).
///
/// Nothing returned here is trustworthy.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let segments = Segments::split(token)?;
    let header = Header::decode(segments.header)?;

    let payload = URL_SAFE_NO_PAD
        .decode(segments.claims)
        .map_err(|e| TokenError::MalformedClaims(e.to_string()))?;
    let claims: Value = serde_json::from_slice(&payload)
        .map_err(|e| TokenError::MalformedClaims(e.to_string()))?;

    let signature_len = URL_SAFE_NO_PAD
        .decode(segments.signature)
        .map(|bytes| bytes.len())
        .unwrap_or(0);

    Ok(TokenInfo {
        header,
        claims,
        signature_len,
    })
}

/// Information about a token (for inspection).
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub header: Header,
    /// Raw claims, whatever shape they have.
    pub claims: Value,
    /// Decoded signature length in bytes (0 if undecodable).
    pub signature_len: usize,
}
