//! Error types for the token crate.

use thiserror::Error;
use vouch_core::ConfigError;

/// Errors that can occur during token operations.
///
/// Everything from [`TokenError::Malformed`] down is a verification failure:
/// the presented token must be treated as unauthenticated.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Secret or engine options are unusable.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Failed to sign a token.
    #[error("failed to sign token: {0}")]
    SigningFailure(String),

    /// The principal handed to `issue` is incomplete.
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),

    /// Token is not three base64url segments with a readable header.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Header declares an algorithm other than HS512.
    #[error("unsupported algorithm: {0:?}")]
    UnsupportedAlgorithm(String),

    /// Signature does not match.
    #[error("token signature is invalid")]
    BadSignature,

    /// Claims segment does not decode to a valid claim set.
    #[error("malformed claims: {0}")]
    MalformedClaims(String),

    /// Claims were issued by someone else.
    #[error("unexpected issuer: {found}")]
    IssuerMismatch { found: String },

    /// Token has expired.
    #[error("token has expired at {expired_at}")]
    Expired { expired_at: i64 },

    /// Token claims an issue time in the future.
    #[error("token not valid before {issued_at}")]
    NotYetIssued { issued_at: i64 },
}

impl TokenError {
    /// Stable short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Configuration(_) => "configuration",
            TokenError::SigningFailure(_) => "signing_failure",
            TokenError::InvalidPrincipal(_) => "invalid_principal",
            TokenError::Malformed(_) => "malformed",
            TokenError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            TokenError::BadSignature => "bad_signature",
            TokenError::MalformedClaims(_) => "malformed_claims",
            TokenError::IssuerMismatch { .. } => "issuer_mismatch",
            TokenError::Expired { .. } => "expired",
            TokenError::NotYetIssued { .. } => "not_yet_issued",
        }
    }

    /// Whether this error rejects a presented token, as opposed to a fault
    /// on the issuing side.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            TokenError::Malformed(_)
                | TokenError::UnsupportedAlgorithm(_)
                | TokenError::BadSignature
                | TokenError::MalformedClaims(_)
                | TokenError::IssuerMismatch { .. }
                | TokenError::Expired { .. }
                | TokenError::NotYetIssued { .. }
        )
    }
}
