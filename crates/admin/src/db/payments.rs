//! Payment repository for the back-office.

use serde::Deserialize;
use sqlx::PgPool;

use stridewell_core::catalog::contains_pattern;
use stridewell_core::{AdminPaymentView, PageRequest, Paginated, PaymentId, PaymentStatus};

use super::{RepositoryError, id_array};

const PAYMENT_VIEW_COLUMNS: &str = "p.id, p.user_id, p.product_id, p.amount, p.currency, \
     p.status, p.stripe_payment_intent_id, p.stripe_charge_id, p.payment_method, \
     p.description, p.metadata, p.created_at, p.updated_at, \
     pr.title AS product_title, u.email AS user_email";

const PAYMENT_VIEW_FROM: &str = "payments p
     LEFT JOIN products pr ON pr.id = p.product_id
     LEFT JOIN users u ON u.id = p.user_id";

/// `$1` is the search term, `$2` the status.
const PAYMENT_FILTER: &str = "($1::text IS NULL
          OR u.email ILIKE $1
          OR pr.title ILIKE $1)
     AND ($2::payment_status IS NULL OR p.status = $2)";

/// Filters for the admin payment list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub q: Option<String>,
    pub status: Option<PaymentStatus>,
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Payments matching `filter` with buyer email and product title, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &PaymentFilter,
        page: PageRequest,
    ) -> Result<Paginated<AdminPaymentView>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {PAYMENT_VIEW_FROM} WHERE {PAYMENT_FILTER}"
        ))
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(filter.status)
        .fetch_one(self.pool)
        .await?;

        let payments = sqlx::query_as::<_, AdminPaymentView>(&format!(
            "SELECT {PAYMENT_VIEW_COLUMNS} FROM {PAYMENT_VIEW_FROM}
             WHERE {PAYMENT_FILTER}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(filter.status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(payments, page, total))
    }

    /// Payments with the given ids, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[PaymentId]) -> Result<Vec<AdminPaymentView>, RepositoryError> {
        let payments = sqlx::query_as::<_, AdminPaymentView>(&format!(
            "SELECT {PAYMENT_VIEW_COLUMNS} FROM {PAYMENT_VIEW_FROM}
             WHERE p.id = ANY($1)
             ORDER BY p.id"
        ))
        .bind(id_array(ids))
        .fetch_all(self.pool)
        .await?;
        Ok(payments)
    }

    /// Delete a payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: PaymentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
