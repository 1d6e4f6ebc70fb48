//! Read access to uploaded product images.

use sqlx::PgPool;
use uuid::Uuid;

use super::RepositoryError;

/// An image as stored.
#[derive(Debug, sqlx::FromRow)]
pub struct StoredImage {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Repository for product images.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an image by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<StoredImage>, RepositoryError> {
        let image = sqlx::query_as::<_, StoredImage>(
            "SELECT content_type, data FROM product_images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(image)
    }
}
