//! Leadbook CLI - Database migrations and bulk import.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! lb-cli migrate
//!
//! # Import buyers from a CSV file
//! lb-cli import leads.csv --owner agent-7
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use leadbook_server::models::DEMO_USER_ID;

mod commands;

#[derive(Parser)]
#[command(name = "lb-cli")]
#[command(author, version, about = "Leadbook CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import buyers from a CSV file (all rows or none)
    Import {
        /// CSV file with a header row
        file: PathBuf,

        /// Owner recorded on every imported buyer
        #[arg(short, long, default_value = DEMO_USER_ID)]
        owner: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { file, owner } => {
            commands::import::run(&file, &owner).await?;
        }
    }
    Ok(())
}
