//! User repository: sign-in identities and profiles.

use sqlx::PgPool;

use stridewell_core::{Email, UserId, UserProfile, UserRole};

use super::RepositoryError;

const PROFILE_COLUMNS: &str =
    "id, email, role, first_name, last_name, avatar_url, created_at, updated_at";

/// Fields for a new profile.
#[derive(Debug, Clone)]
pub struct NewProfile<'a> {
    pub email: &'a Email,
    pub role: UserRole,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a profile by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let user = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get the password hash for a sign-in identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, email: &Email) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM identities WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(hash)
    }

    /// Create a sign-in identity and its profile in one transaction.
    ///
    /// A profile that already exists for the email is kept as is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the identity already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn register(
        &self,
        profile: &NewProfile<'_>,
        password_hash: &str,
    ) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO identities (email, password_hash) VALUES ($1, $2)")
            .bind(profile.email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_unique_violation(e, "email already exists"))?;

        let user = insert_profile(&mut *tx, profile).await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Create the profile for an identity that signed in without one.
    ///
    /// Concurrent first sign-ins resolve to the same row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_profile(&self, profile: &NewProfile<'_>) -> Result<UserProfile, RepositoryError> {
        insert_profile(self.pool, profile).await
    }

    /// Replace the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        first_name: Option<&str>,
        last_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<UserProfile, RepositoryError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE users SET first_name = $2, last_name = $3, avatar_url = $4
             WHERE id = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(avatar_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

async fn insert_profile<'e, E>(
    executor: E,
    profile: &NewProfile<'_>,
) -> Result<UserProfile, RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    // The no-op update makes RETURNING yield the existing row on conflict.
    let user = sqlx::query_as::<_, UserProfile>(&format!(
        "INSERT INTO users (email, role, first_name, last_name)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(profile.email)
    .bind(profile.role)
    .bind(profile.first_name)
    .bind(profile.last_name)
    .fetch_one(executor)
    .await?;
    Ok(user)
}
