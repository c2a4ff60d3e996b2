use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vouch_core::{Principal, Role, VouchConfig};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "vouch", version, about = "Vouch token CLI")]
struct Cli {
    /// Configuration file. Defaults to ./vouch.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signing secret management
    Secret {
        #[command(subcommand)]
        cmd: SecretCommand,
    },

    /// Token issuance and verification
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommand {
    /// Generate a new random signing secret
    Generate {
        /// Write the secret to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token for a principal
    Issue {
        /// Principal id (token subject)
        #[arg(long)]
        id: String,

        #[arg(long)]
        email: String,

        /// USER, PREMIUM or ADMIN
        #[arg(long, value_parser = commands::token::parse_role)]
        role: Role,

        /// Override the configured lifetime (e.g. "30m", "24h", "7d")
        #[arg(long)]
        lifetime: Option<String>,

        /// Secret file or secret text
        #[arg(long, env = "VOUCH_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Write the token to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Verify a token (string or file)
    Verify {
        token: String,

        /// Secret file or secret text
        #[arg(long, env = "VOUCH_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Decode a token (string or file) without checking its signature
    Inspect { token: String },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<VouchConfig> {
    match path {
        Some(path) => Ok(VouchConfig::from_file(path)?),
        None => {
            let default_path = Path::new("vouch.yaml");
            if default_path.exists() {
                Ok(VouchConfig::from_file(default_path)?)
            } else {
                Ok(VouchConfig::default())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(project = ?config.project, "configuration loaded");

    match cli.cmd {
        Command::Secret { cmd } => match cmd {
            SecretCommand::Generate { output } => commands::secret::generate(output)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Issue {
                id,
                email,
                role,
                lifetime,
                secret,
                output,
            } => commands::token::issue(
                &config.token,
                secret,
                Principal::new(id, email, role),
                lifetime,
                output,
            )?,
            TokenCommand::Verify { token, secret } => {
                commands::token::verify(&config.token, secret, token)?
            }
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },
    }

    Ok(())
}
