//! Verdant CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! vd-cli migrate
//!
//! # Load the starter catalog (skips names that already exist)
//! vd-cli seed products crates/cli/seed/products.yaml
//!
//! # Grant or revoke admin access for an existing account
//! vd-cli admin grant robin@example.com
//! vd-cli admin revoke robin@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed products` - Seed the product catalog from YAML
//! - `admin grant` / `admin revoke` - Toggle the admin flag

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vd-cli")]
#[command(author, version, about = "Verdant CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage admin access
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Seed products from a YAML file
    Products {
        /// Path to the catalog file
        #[arg(default_value = "crates/cli/seed/products.yaml")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an existing account admin access
    Grant {
        /// Account email address
        email: String,
    },
    /// Remove admin access from an account
    Revoke {
        /// Account email address
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                commands::seed::products(&file).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Revoke { email } => commands::admin::set_admin(&email, false).await?,
        },
    }
    Ok(())
}
