//! Database operations for the back-office.
//!
//! The back-office shares the storefront's database and owns every write to
//! `products`, to user roles, and to payment deletion.
//!
//! # Tables
//!
//! - `users` / `identities` - Profiles and sign-in credentials
//! - `products` - Catalog
//! - `payments` - Recorded purchases
//! - `product_images` - Uploaded product images
//! - `admin.session` - Back-office session storage
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p stridewell-cli -- migrate
//! ```

pub mod images;
pub mod payments;
pub mod products;
pub mod stats;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use images::ImageRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use stats::StatsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, referenced product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to `Conflict` with `message`.
    pub(crate) fn from_constraint(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert typed ids to the `INT[]` bind `id = ANY($1)` expects.
pub(crate) fn id_array<T: Copy + Into<i32>>(ids: &[T]) -> Vec<i32> {
    ids.iter().map(|&id| id.into()).collect()
}
