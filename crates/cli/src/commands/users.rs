//! User role commands.
//!
//! # Usage
//!
//! ```bash
//! sw-cli user promote --email ana@example.com
//! sw-cli user demote --email ana@example.com
//! sw-cli user list-admins
//! ```
//!
//! Addresses in `ADMIN_EMAILS` are admins regardless of their stored role;
//! demoting one only changes the stored role.

use stridewell_admin::db::{RepositoryError, UserRepository};
use stridewell_core::{Email, UserRole};

use super::{CommandError, connect};

/// Set the stored role of the user with `email`.
///
/// # Errors
///
/// Returns `CommandError::UserNotFound` if no profile has that email, or
/// another `CommandError` if the update fails.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    match UserRepository::new(&pool).set_role_by_email(&email, role).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Role updated");
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CommandError::UserNotFound(email.into_inner())),
        Err(e) => Err(e.into()),
    }
}

/// Log every user with the stored admin role.
///
/// # Errors
///
/// Returns `CommandError` if the query fails.
pub async fn list_admins() -> Result<(), CommandError> {
    let pool = connect().await?;
    let admins = UserRepository::new(&pool).list_admins().await?;

    if admins.is_empty() {
        tracing::info!("No admins with a stored admin role");
    }
    for admin in &admins {
        tracing::info!(
            "  {} {} (id {}, since {})",
            admin.email,
            admin.display_name(),
            admin.id,
            admin.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
