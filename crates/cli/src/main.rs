//! Nico Rewards CLI - Database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run rewards database migrations
//! nico-rewards-cli migrate
//!
//! # Seed the demo tier ladder and redemption options for a shop
//! nico-rewards-cli seed --shop demo.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed demo tiers and redemption options

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nico-rewards-cli")]
#[command(author, version, about = "Nico Rewards CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed demo tiers and redemption options for a shop
    Seed {
        /// Shop domain to seed (e.g. demo.myshopify.com)
        #[arg(short, long, default_value = "demo.myshopify.com")]
        shop: String,
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
        Commands::Migrate => commands::migrate::rewards().await?,
        Commands::Seed { shop } => commands::seed::demo_data(&shop).await?,
    }
    Ok(())
}
