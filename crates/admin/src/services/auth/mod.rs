//! Back-office authentication.
//!
//! Admins sign in with the same email and password they use on the
//! storefront. A valid password is not enough: the profile must pass
//! [`AdminPolicy::is_admin`], otherwise no session is created.

mod error;

pub use error::AdminAuthError;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use sqlx::PgPool;
use tracing::instrument;

use stridewell_core::{AdminPolicy, Email, UserProfile};

use crate::db::UserRepository;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: UserRepository<'a>,
    policy: &'a AdminPolicy,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin auth service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: &'a AdminPolicy) -> Self {
        Self {
            users: UserRepository::new(pool),
            policy,
        }
    }

    /// Verify credentials and admin rights.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` for an unknown email or a
    /// wrong password, and `AdminAuthError::NotAdmin` when the password is
    /// right but the user may not use the back-office.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AdminAuthError> {
        let email = Email::parse(email)?;

        let hash = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;
        verify_password(password, &hash)?;

        let profile = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AdminAuthError::NotAdmin)?;

        if !self.policy.is_admin(profile.role, &profile.email) {
            tracing::warn!(user_id = %profile.id, "Non-admin attempted back-office login");
            return Err(AdminAuthError::NotAdmin);
        }

        Ok(profile)
    }

    /// Re-check that a signed-in admin still exists and is still an admin.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::NotAdmin` if the profile is gone or demoted.
    pub async fn recheck(&self, id: stridewell_core::UserId) -> Result<UserProfile, AdminAuthError> {
        let profile = self
            .users
            .get(id)
            .await?
            .ok_or(AdminAuthError::NotAdmin)?;

        if self.policy.is_admin(profile.role, &profile.email) {
            Ok(profile)
        } else {
            Err(AdminAuthError::NotAdmin)
        }
    }
}

fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AdminAuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}
