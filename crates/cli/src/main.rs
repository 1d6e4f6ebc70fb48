//! Stridewell CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run all database migrations
//! sw-cli migrate
//!
//! # Grant or revoke the stored admin role
//! sw-cli user promote --email ana@example.com
//! sw-cli user demote --email ana@example.com
//! sw-cli user list-admins
//!
//! # Load products from YAML
//! sw-cli seed products --file data/products.yaml --owner-email ana@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string (falls back to `ADMIN_DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use stridewell_core::UserRole;

mod commands;

#[derive(Parser)]
#[command(name = "sw-cli")]
#[command(author, version, about = "Stridewell CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database and session store migrations
    Migrate,
    /// Manage user roles
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Give a user the admin role
    Promote {
        /// User's email address
        #[arg(short, long)]
        email: String,
    },
    /// Return a user to the regular role
    Demote {
        /// User's email address
        #[arg(short, long)]
        email: String,
    },
    /// List users with the admin role
    ListAdmins,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML file
    Products {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,

        /// Email of the user who owns the new products
        #[arg(long)]
        owner_email: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
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
        Commands::User { action } => match action {
            UserAction::Promote { email } => {
                commands::users::set_role(&email, UserRole::Admin).await?;
            }
            UserAction::Demote { email } => {
                commands::users::set_role(&email, UserRole::User).await?;
            }
            UserAction::ListAdmins => commands::users::list_admins().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, owner_email } => {
                commands::seed::products(&file, owner_email.as_deref()).await?;
            }
        },
    }
    Ok(())
}
