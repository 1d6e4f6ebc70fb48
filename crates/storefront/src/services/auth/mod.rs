//! Authentication service.
//!
//! Email and password sign-in. Identities and profiles are stored separately:
//! an identity that signs in without a profile gets one synthesized, with its
//! role decided by the [`AdminPolicy`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use stridewell_core::user::ProfileUpdate;
use stridewell_core::{AdminPolicy, Email, UserProfile};

use crate::db::RepositoryError;
use crate::db::users::{NewProfile, UserRepository};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration input.
#[derive(Debug, Clone, Default)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    policy: &'a AdminPolicy,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, policy: &'a AdminPolicy) -> Self {
        Self {
            users: UserRepository::new(pool),
            policy,
        }
    }

    /// Register a new identity with email and password, creating its profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration<'_>) -> Result<UserProfile, AuthError> {
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;

        let names = ProfileUpdate {
            first_name: registration.first_name,
            last_name: registration.last_name,
            avatar_url: None,
        }
        .validate()?;

        let password_hash = hash_password(registration.password)?;

        let profile = NewProfile {
            email: &email,
            role: self.policy.initial_role(&email),
            first_name: names.first_name.as_deref().filter(|s| !s.is_empty()),
            last_name: names.last_name.as_deref().filter(|s| !s.is_empty()),
        };

        self.users
            .register(&profile, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// Synthesizes the profile if the identity has none.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;

        let password_hash = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if let Some(profile) = self.users.get_by_email(&email).await? {
            return Ok(profile);
        }

        let role = self.policy.initial_role(&email);
        tracing::info!(email = %email, role = %role, "Synthesizing missing profile on sign-in");
        let profile = self
            .users
            .create_profile(&NewProfile {
                email: &email,
                role,
                first_name: None,
                last_name: None,
            })
            .await?;
        Ok(profile)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
