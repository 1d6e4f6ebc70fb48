//! User repository: listing, editing, and deleting profiles, plus the
//! credential lookup for back-office login.

use serde::Deserialize;
use sqlx::PgPool;

use stridewell_core::catalog::contains_pattern;
use stridewell_core::{Email, PageRequest, Paginated, UserId, UserProfile, UserRole};

use super::{RepositoryError, id_array};

const PROFILE_COLUMNS: &str =
    "id, email, role, first_name, last_name, avatar_url, created_at, updated_at";

/// `$1` is the search term, `$2` the role.
const USER_FILTER: &str = "($1::text IS NULL
          OR email ILIKE $1
          OR first_name ILIKE $1
          OR last_name ILIKE $1)
     AND ($2::user_role IS NULL OR role = $2)";

/// Filters for the admin user list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub q: Option<String>,
    pub role: Option<UserRole>,
}

/// Fully resolved profile fields for an admin edit.
#[derive(Debug, Clone)]
pub struct UserEdit {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Email,
    pub role: UserRole,
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

    /// Users matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Paginated<UserProfile>, RepositoryError> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {USER_FILTER}"))
                .bind(filter.q.as_deref().map(contains_pattern))
                .bind(filter.role)
                .fetch_one(self.pool)
                .await?;

        let users = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users
             WHERE {USER_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(filter.role)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(users, page, total))
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
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

    /// Profiles with the given ids, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, RepositoryError> {
        let users = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(id_array(ids))
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// All profiles with the admin role, by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_admins(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let users = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE role = 'admin' ORDER BY email"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// Password hash for a sign-in email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, email: &Email) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar("SELECT password_hash FROM identities WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(hash)
    }

    /// Apply an admin edit. An email change moves the sign-in identity with
    /// the profile so the user keeps their password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist,
    /// `RepositoryError::Conflict` if the new email is taken, or
    /// `RepositoryError::Database` if the update fails.
    pub async fn update(&self, id: UserId, edit: &UserEdit) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Email = sqlx::query_scalar("SELECT email FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if current != edit.email {
            sqlx::query("UPDATE identities SET email = $2 WHERE email = $1")
                .bind(&current)
                .bind(&edit.email)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::from_constraint(e, "email already exists"))?;
        }

        let user = sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE users SET first_name = $2, last_name = $3, email = $4, role = $5
             WHERE id = $1
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(edit.first_name.as_deref())
        .bind(edit.last_name.as_deref())
        .bind(&edit.email)
        .bind(edit.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "email already exists"))?;

        tx.commit().await?;
        Ok(user)
    }

    /// Set the role of the profile with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no profile has that email.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_role_by_email(
        &self,
        email: &Email,
        role: UserRole,
    ) -> Result<UserProfile, RepositoryError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE users SET role = $2 WHERE email = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(email)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a profile. Its payments go with it; products it owns are kept
    /// without an owner. The sign-in identity is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist, or
    /// `RepositoryError::Conflict` if the delete is blocked by a constraint.
    pub async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "user is still referenced"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
