//! Product repository: the back-office owns all catalog writes.

use serde::Deserialize;
use sqlx::PgPool;

use stridewell_core::catalog::contains_pattern;
use stridewell_core::{PageRequest, Paginated, Product, ProductDraft, ProductId, UserId};

use super::{RepositoryError, id_array};

const PRODUCT_COLUMNS: &str = "id, title, description, price, category, brand, sizes, colors, \
     images, stock, is_active, tags, owner_id, created_at, updated_at";

/// `$1` is the search term, `$2` the active flag.
const ADMIN_FILTER: &str = "($1::text IS NULL
          OR title ILIKE $1
          OR brand ILIKE $1
          OR description ILIKE $1)
     AND ($2::boolean IS NULL OR is_active = $2)";

/// Active/inactive filter for the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatusFilter {
    Active,
    Inactive,
}

impl ProductStatusFilter {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Filters for the admin product list.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub q: Option<String>,
    pub status: Option<ProductStatusFilter>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Paginated<Product>, RepositoryError> {
        let active = filter.status.map(ProductStatusFilter::is_active);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM products WHERE {ADMIN_FILTER}"
        ))
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(active)
        .fetch_one(self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE {ADMIN_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(active)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(products, page, total))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Products with the given ids, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(id_array(ids))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Insert a validated draft owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        draft: &ProductDraft,
        owner_id: Option<UserId>,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products
                 (title, description, price, category, brand, sizes, colors, images,
                  stock, is_active, tags, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.category)
        .bind(&draft.brand)
        .bind(&draft.sizes)
        .bind(&draft.colors)
        .bind(&draft.images)
        .bind(draft.stock)
        .bind(draft.is_active)
        .bind(&draft.tags)
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Replace every editable field of a product. The owner is kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET title = $2, description = $3, price = $4, category = $5, brand = $6,
                 sizes = $7, colors = $8, images = $9, stock = $10, is_active = $11,
                 tags = $12
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.category)
        .bind(&draft.brand)
        .bind(&draft.sizes)
        .bind(&draft.colors)
        .bind(&draft.images)
        .bind(draft.stock)
        .bind(draft.is_active)
        .bind(&draft.tags)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Conflict` if payments still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_constraint(
                    e,
                    "product has recorded payments; deactivate it instead",
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set `is_active` on many products. Returns the number updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_active(&self, ids: &[ProductId], active: bool) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE products SET is_active = $2 WHERE id = ANY($1)")
            .bind(id_array(ids))
            .bind(active)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
