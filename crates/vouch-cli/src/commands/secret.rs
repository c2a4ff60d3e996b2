//! Secret management commands.
//!
//! `vouch secret generate` - Generate a new signing secret.

use std::fs;
use std::path::PathBuf;
use vouch_token::generate_secret_text;

/// Generate a new signing secret.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let secret = generate_secret_text();

    if let Some(output_path) = output {
        // Create parent directory if it doesn't exist
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&output_path, &secret)?;

        println!("✔ Generated signing secret: {}", output_path.display());
        println!();
        println!("⚠️  Keep this secret safe! Anyone holding it can issue tokens.");
        println!();
        println!("Set as environment variable:");
        println!("  export VOUCH_SECRET=$(cat {})", output_path.display());
    } else {
        // Print to stdout
        println!("{}", secret);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vouch_token::SigningSecret;

    #[test]
    fn test_generate_secret_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys").join("vouch.secret");
        generate(Some(path.clone())).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.len(), 86);
        assert!(SigningSecret::load_from_file(&path).is_ok());
    }
}
