//! Cat Collector CLI - Database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema and the session table
//! cat-cli migrate
//!
//! # Add the default toys
//! cat-cli seed
//!
//! # Add the default toys plus sample cats owned by an existing user
//! cat-cli seed --owner sylvia
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!   (`CAT_COLLECTOR_DATABASE_URL` takes precedence)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cat-cli")]
#[command(author, version, about = "Cat Collector CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert sample toys and cats
    Seed {
        /// Username that will own the sample cats (toys only when omitted)
        #[arg(short, long)]
        owner: Option<String>,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { owner } => commands::seed::run(owner.as_deref()).await?,
    }
    Ok(())
}
