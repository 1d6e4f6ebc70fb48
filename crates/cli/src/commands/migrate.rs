//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sw-cli migrate
//! ```
//!
//! Runs the workspace `migrations/` (users, identities, products, payments),
//! then creates the session tables for both servers: `tower_sessions.session`
//! for the storefront and `admin.session` for the back-office.

use super::{CommandError, connect};

/// Run every migration.
///
/// # Errors
///
/// Returns `CommandError` if the connection or any migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Creating storefront session table...");
    stridewell_storefront::middleware::create_session_store(&pool)
        .migrate()
        .await?;

    tracing::info!("Creating admin session table...");
    stridewell_admin::middleware::create_session_store(&pool)
        .migrate()
        .await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
