//! # vouch-token
//!
//! Signed bearer token handling for Vouch.
//!
//! This crate provides functionality for:
//! - Loading and generating HMAC signing secrets
//! - Issuing tokens for an authenticated [`Principal`]
//! - Verifying tokens and extracting their [`Claims`]
//!
//! ## Token format
//!
//! Tokens use the compact JWT shape, so any JWT-aware client can carry them:
//!
//! ```text
//! base64url({"alg":"HS512","typ":"JWT"}) . base64url(claims) . base64url(hmac)
//! ```
//!
//! The signature is HMAC-SHA512 over the first two segments, keyed by a
//! single process-wide secret of at least 64 bytes.
//!
//! ## Verification order
//!
//! | Step | Failure |
//! |------|---------|
//! | Split segments, decode header | [`TokenError::Malformed`] |
//! | Header declares `HS512` | [`TokenError::UnsupportedAlgorithm`] |
//! | Constant-time signature check | [`TokenError::BadSignature`] |
//! | Decode claims, check issuer | [`TokenError::MalformedClaims`], [`TokenError::IssuerMismatch`] |
//! | Expiry, optional issued-at | [`TokenError::Expired`], [`TokenError::NotYetIssued`] |

pub mod claims;
pub mod error;
pub mod keys;
pub mod token;

pub use claims::Claims;
pub use error::TokenError;
pub use keys::{MIN_SECRET_LEN, SigningSecret, generate_secret_text};
pub use token::{EngineOptions, Header, TokenEngine, TokenInfo, inspect_token_unverified};
pub use vouch_core::{Principal, Role};
