//! CLI command implementations for Vouch.

pub mod secret;
pub mod token;
