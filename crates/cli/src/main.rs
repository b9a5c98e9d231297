//! Planetarium CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! planetarium migrate
//!
//! # Insert the demo catalog (domes, shows, sessions)
//! planetarium seed
//!
//! # Print the seat map of a session
//! planetarium seats --session 1
//! ```
//!
//! # Environment Variables
//!
//! - `PLANETARIUM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "planetarium")]
#[command(author, version, about = "Planetarium booking CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the demo catalog
    Seed,
    /// Print the seat map of a show session
    Seats {
        /// Show session ID
        #[arg(short, long)]
        session: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Seats { session } => commands::seats::run(session.into()).await?,
    }
    Ok(())
}
