//! Localiza CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! localiza-cli migrate
//!
//! # Grant a role
//! localiza-cli promote ops@example.com super_admin
//!
//! # Make someone the administrator of store 3
//! localiza-cli promote manager@example.com store_admin --store 3
//! ```
//!
//! Both commands read `LOCALIZA_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "localiza-cli")]
#[command(author, version, about = "Localiza operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Change an account's role
    Promote {
        /// Account email address
        email: String,

        /// New role (`customer`, `store_admin`, `admin`, `super_admin`)
        role: String,

        /// Store the account administers; required for `store_admin`
        #[arg(long)]
        store: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Promote { email, role, store } => {
            commands::promote::run(&email, &role, store).await?;
        }
    }
    Ok(())
}
