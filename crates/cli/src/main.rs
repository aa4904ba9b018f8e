//! TicketWave CLI - database migrations and account support tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tw-cli migrate
//!
//! # Mark an account's email as verified
//! tw-cli user verify --email fan@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user verify` - Verify an account's email by hand

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "TicketWave CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Account support tasks
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Mark an account's email as verified
    Verify {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::User { action } => match action {
            UserAction::Verify { email } => {
                commands::user::verify_email(&email).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_verify() {
        let cli = Cli::try_parse_from(["tw-cli", "user", "verify", "-e", "fan@example.com"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Commands::User { action: UserAction::Verify { ref email } } if email == "fan@example.com"
        ));
    }

    #[test]
    fn test_verify_requires_email() {
        assert!(Cli::try_parse_from(["tw-cli", "user", "verify"]).is_err());
    }
}
