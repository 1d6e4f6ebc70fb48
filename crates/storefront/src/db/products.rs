//! Catalog reads. Only active products are visible to shoppers.

use sqlx::PgPool;

use stridewell_core::catalog::contains_pattern;
use stridewell_core::{CatalogQuery, Paginated, Product, ProductId};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str = "id, title, description, price, category, brand, sizes, colors, \
     images, stock, is_active, tags, owner_id, created_at, updated_at";

/// Filters shared by the catalog list and its count. `$1` is the search
/// term, `$2`/`$3` category and brand, `$4`/`$5` the price range.
const CATALOG_FILTER: &str = "is_active
     AND ($1::text IS NULL
          OR title ILIKE $1
          OR description ILIKE $1
          OR brand ILIKE $1)
     AND ($2::text IS NULL OR category = $2)
     AND ($3::text IS NULL OR brand = $3)
     AND ($4::numeric IS NULL OR price >= $4)
     AND ($5::numeric IS NULL OR price <= $5)";

/// Distinct filter values for the catalog sidebar.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CatalogFacets {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching a normalized, validated query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        query: &CatalogQuery,
    ) -> Result<Paginated<Product>, RepositoryError> {
        let page = query.page_request();

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM products WHERE {CATALOG_FILTER}"
        ))
        .bind(query.q.as_deref().map(contains_pattern))
        .bind(query.category.as_deref())
        .bind(query.brand.as_deref())
        .bind(query.min_price)
        .bind(query.max_price)
        .fetch_one(self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {CATALOG_FILTER}
             ORDER BY {} LIMIT $6 OFFSET $7",
            query.sort.order_by()
        ))
        .bind(query.q.as_deref().map(contains_pattern))
        .bind(query.category.as_deref())
        .bind(query.brand.as_deref())
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(products, page, total))
    }

    /// Get an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Get products by id, active or not. Missing ids are simply absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Distinct non-blank categories and brands of active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn facets(&self) -> Result<CatalogFacets, RepositoryError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products
             WHERE is_active AND category <> '' ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        let brands = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT brand FROM products
             WHERE is_active AND brand <> '' ORDER BY brand",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(CatalogFacets { categories, brands })
    }
}
