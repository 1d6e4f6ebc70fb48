//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use stridewell_admin::db::RepositoryError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email address.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] stridewell_core::EmailError),

    /// No user has the given email.
    #[error("No user with email {0}")]
    UserNotFound(String),

    /// Seed file could not be read.
    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Seed file is not valid YAML for a product list.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Seed products that failed validation, by position in the file.
    #[error("{} product(s) failed validation", .0.len())]
    InvalidProducts(Vec<(usize, stridewell_core::ProductError)>),
}

/// Connect to the shared database.
///
/// Reads `DATABASE_URL`, falling back to `ADMIN_DATABASE_URL`.
///
/// # Errors
///
/// Returns `CommandError::MissingEnvVar` if neither is set, or
/// `CommandError::Database` if the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    let url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("ADMIN_DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(stridewell_admin::db::create_pool(&url).await?)
}
