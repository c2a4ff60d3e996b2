//! Token management commands.
//!
//! `vouch token issue` - Issue a token for a principal.
//! `vouch token verify` - Verify a token is valid.
//! `vouch token inspect` - Inspect a token's contents without verifying it.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use vouch_core::{Principal, Role, TokenConfig, config::parse_duration};
use vouch_token::{EngineOptions, SigningSecret, TokenEngine, inspect_token_unverified};

/// Resolve the signing secret from a CLI value, falling back to configuration.
///
/// The CLI value can be:
/// - A path to a file containing the secret
/// - The secret itself (e.g., from the VOUCH_SECRET env var)
fn resolve_secret(secret: Option<String>, config: &TokenConfig) -> anyhow::Result<SigningSecret> {
    let Some(secret_str) = secret else {
        return SigningSecret::from_config(config).context(
            "Signing secret not provided or unusable. Pass --secret <path>, set VOUCH_SECRET, or configure token.secret_file",
        );
    };

    // If it looks like a file path and the file exists, load from file
    let path = Path::new(&secret_str);
    if path.exists() {
        return SigningSecret::load_from_file(path).with_context(|| {
            format!("Failed to load signing secret from file: {}", path.display())
        });
    }

    SigningSecret::from_text(secret_str.trim()).context("Signing secret is unusable")
}

fn build_engine(
    secret: Option<String>,
    config: &TokenConfig,
    lifetime: Option<&str>,
) -> anyhow::Result<TokenEngine> {
    let secret = resolve_secret(secret, config)?;
    let mut options = EngineOptions::from_config(config)?;
    if let Some(lifetime) = lifetime {
        options.lifetime = parse_duration(lifetime)?;
    }
    Ok(TokenEngine::new(secret, options)?)
}

/// Read a token from a file if the argument names one.
fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token.trim().to_string())
    }
}

/// Issue a new token.
pub fn issue(
    config: &TokenConfig,
    secret: Option<String>,
    principal: Principal,
    lifetime: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let engine = build_engine(secret, config, lifetime.as_deref())?;
    let token = engine.issue_now(&principal)?;

    // Output the token
    if let Some(output_path) = output {
        fs::write(&output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Subject: {}", principal.id);
        println!("  Email: {}", principal.email);
        println!("  Role: {}", principal.role);
        println!("  Expires in: {}s", engine.options().lifetime.num_seconds());
    } else {
        // Print to stdout
        println!("{}", token);
    }

    Ok(())
}

/// Verify a token is valid.
pub fn verify(config: &TokenConfig, secret: Option<String>, token: String) -> anyhow::Result<()> {
    let engine = build_engine(secret, config, None)?;
    let token_str = read_token(token)?;

    match engine.verify_now(&token_str) {
        Ok(claims) => {
            println!("✔ Token is valid");
            println!();
            println!("Token Details:");
            println!("  Issuer: {}", claims.issuer());
            println!("  Subject: {}", claims.subject());
            println!("  Email: {}", claims.email());
            println!("  Role: {}", claims.role());
            if let Some(issued) = claims.issued_at_utc() {
                println!("  Issued at: {}", issued.to_rfc3339());
            }
            if let Some(expires) = claims.expires_at_utc() {
                println!("  Expires at: {}", expires.to_rfc3339());
            }
            let remaining = claims.remaining_at(chrono::Utc::now());
            println!("  Remaining: {}s", remaining.num_seconds());
            Ok(())
        }
        Err(e) => {
            println!("✖ Token verification failed: {}", e);
            anyhow::bail!("token rejected ({})", e.kind())
        }
    }
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token_str = read_token(token)?;
    let info = inspect_token_unverified(&token_str)?;

    println!("Token Information (signature NOT verified):");
    let algorithm = match &info.header.alg {
        Some(alg) => info.header.algorithm().map_or_else(|| alg.to_string(), str::to_string),
        None => "(none)".to_string(),
    };
    println!("  Algorithm: {}", algorithm);
    println!("  Signature: {} bytes", info.signature_len);
    println!();
    println!("{}", serde_json::to_string_pretty(&info.claims)?);

    Ok(())
}

/// Parse a role given on the command line.
pub fn parse_role(s: &str) -> Result<Role, String> {
    s.parse::<Role>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vouch_token::generate_secret_text;

    fn no_secret_config() -> TokenConfig {
        TokenConfig {
            secret_env: None,
            ..TokenConfig::default()
        }
    }

    fn principal() -> Principal {
        Principal::new("u1", "a@b.c", Role::User)
    }

    #[test]
    fn test_issue_and_verify_with_secret_file() {
        let dir = tempdir().unwrap();
        let secret_path = dir.path().join("vouch.secret");
        let token_path = dir.path().join("token.jwt");
        fs::write(&secret_path, generate_secret_text()).unwrap();
        let secret_arg = secret_path.to_string_lossy().to_string();

        issue(
            &no_secret_config(),
            Some(secret_arg.clone()),
            principal(),
            Some("1h".to_string()),
            Some(token_path.clone()),
        )
        .unwrap();

        assert!(token_path.exists());
        verify(
            &no_secret_config(),
            Some(secret_arg),
            token_path.to_string_lossy().to_string(),
        )
        .unwrap();
    }

    #[test]
    fn test_verify_with_inline_secret() {
        let dir = tempdir().unwrap();
        let token_path = dir.path().join("token.jwt");
        let secret = generate_secret_text();

        issue(
            &no_secret_config(),
            Some(secret.clone()),
            principal(),
            None,
            Some(token_path.clone()),
        )
        .unwrap();

        let token = fs::read_to_string(&token_path).unwrap();
        verify(&no_secret_config(), Some(secret), token).unwrap();
    }

    #[test]
    fn test_verify_rejects_foreign_token() {
        let dir = tempdir().unwrap();
        let token_path = dir.path().join("token.jwt");

        issue(
            &no_secret_config(),
            Some(generate_secret_text()),
            principal(),
            None,
            Some(token_path.clone()),
        )
        .unwrap();

        let token = fs::read_to_string(&token_path).unwrap();
        let result = verify(&no_secret_config(), Some(generate_secret_text()), token);
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_from_config_file() {
        let dir = tempdir().unwrap();
        let secret_path = dir.path().join("configured.secret");
        let token_path = dir.path().join("token.jwt");
        fs::write(&secret_path, generate_secret_text()).unwrap();

        let config = TokenConfig {
            secret_env: None,
            secret_file: Some(secret_path),
            ..TokenConfig::default()
        };

        issue(&config, None, principal(), None, Some(token_path.clone())).unwrap();
        verify(&config, None, token_path.to_string_lossy().to_string()).unwrap();
        inspect(token_path.to_string_lossy().to_string()).unwrap();
    }

    #[test]
    fn test_missing_secret() {
        let result = issue(&no_secret_config(), None, principal(), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_secret() {
        let result = issue(
            &no_secret_config(),
            Some("short".to_string()),
            principal(),
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect("not-a-token".to_string()).is_err());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("premium").unwrap(), Role::Premium);
        assert!(parse_role("owner").is_err());
    }
}
