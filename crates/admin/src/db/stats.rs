//! Dashboard aggregates.

use rust_decimal::Decimal;
use sqlx::PgPool;

use stridewell_core::stats::TOP_SELLING_COUNT;
use stridewell_core::{AdminStats, TopSellingProduct};

use super::RepositoryError;

/// Repository for dashboard statistics.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Counts, completed-sales totals, and top sellers, queried concurrently.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn admin_stats(&self) -> Result<AdminStats, RepositoryError> {
        let (total_users, total_products, (total_sales, total_revenue), top_selling_products) = tokio::try_join!(
            self.count("users"),
            self.count("products"),
            self.sales(),
            self.top_selling(),
        )?;

        Ok(AdminStats {
            total_users,
            total_products,
            total_sales,
            total_revenue,
            top_selling_products,
        })
    }

    async fn count(&self, table: &'static str) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    async fn sales(&self) -> Result<(i64, Decimal), RepositoryError> {
        let row = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(amount), 0)
             FROM payments WHERE status = 'completed'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    async fn top_selling(&self) -> Result<Vec<TopSellingProduct>, RepositoryError> {
        let products = sqlx::query_as::<_, TopSellingProduct>(
            "SELECT pr.id AS product_id, pr.title,
                    COALESCE(SUM((p.metadata->>'quantity')::bigint), COUNT(*))::bigint AS units_sold,
                    SUM(p.amount) AS revenue
             FROM payments p
             JOIN products pr ON pr.id = p.product_id
             WHERE p.status = 'completed'
             GROUP BY pr.id, pr.title
             ORDER BY units_sold DESC, revenue DESC, pr.id
             LIMIT $1",
        )
        .bind(i64::try_from(TOP_SELLING_COUNT).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
