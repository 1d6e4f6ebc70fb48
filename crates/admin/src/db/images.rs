//! Uploaded product images.

use sqlx::PgPool;
use uuid::Uuid;

use stridewell_core::{ImageKind, UserId};

use super::RepositoryError;

/// Repository for product image uploads.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store an image that has already passed `check_image`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        kind: ImageKind,
        data: &[u8],
        original_name: Option<&str>,
        uploaded_by: UserId,
    ) -> Result<Uuid, RepositoryError> {
        let byte_size = i32::try_from(data.len())
            .map_err(|_| RepositoryError::DataCorruption("image size exceeds i32".to_string()))?;

        let id = sqlx::query_scalar(
            "INSERT INTO product_images (id, content_type, data, byte_size, original_name, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(kind.content_type())
        .bind(data)
        .bind(byte_size)
        .bind(original_name)
        .bind(uploaded_by)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }
}
