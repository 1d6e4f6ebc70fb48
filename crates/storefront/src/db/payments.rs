//! Payment repository: recording, history, receipts, and webhook transitions.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use stridewell_core::catalog::contains_pattern;
use stridewell_core::stats::rank_brands;
use stridewell_core::{
    PageRequest, Paginated, Payment, PaymentStatus, PaymentWithProduct, Product, ProductId,
    UserId, UserStats,
};

use super::RepositoryError;

const PAYMENT_COLUMNS: &str = "p.id, p.user_id, p.product_id, p.amount, p.currency, p.status, \
     p.stripe_payment_intent_id, p.stripe_charge_id, p.payment_method, p.description, \
     p.metadata, p.created_at, p.updated_at";

/// A payment row to insert.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub stripe_payment_intent_id: Option<String>,
    pub payment_method: Option<String>,
    pub description: String,
    pub metadata: serde_json::Value,
}

/// Filters for a shopper's payment history.
#[derive(Debug, Clone, Default)]
pub struct PaymentHistoryFilter {
    pub status: Option<PaymentStatus>,
    /// Substring of the product title.
    pub q: Option<String>,
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

    /// Record `checkout_ref` as used inside an open transaction.
    ///
    /// A concurrent transaction claiming the same reference waits for this one
    /// and then fails, so a cart submitted twice is recorded once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference was already
    /// committed, or `RepositoryError::Database` if the insert fails.
    pub async fn claim_checkout(
        tx: &mut Transaction<'_, Postgres>,
        checkout_ref: Uuid,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO checkouts (checkout_ref, user_id) VALUES ($1, $2)")
            .bind(checkout_ref)
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                RepositoryError::from_unique_violation(e, "this cart has already been checked out")
            })?;
        Ok(())
    }

    /// Insert payments inside an open transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if an insert fails; the caller's
    /// transaction is then rolled back on drop.
    pub async fn insert_all(
        tx: &mut Transaction<'_, Postgres>,
        payments: &[NewPayment],
    ) -> Result<Vec<Payment>, RepositoryError> {
        let mut inserted = Vec::with_capacity(payments.len());
        for payment in payments {
            let row = sqlx::query_as::<_, Payment>(
                "INSERT INTO payments
                     (user_id, product_id, amount, currency, status,
                      stripe_payment_intent_id, payment_method, description, metadata)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING id, user_id, product_id, amount, currency, status,
                           stripe_payment_intent_id, stripe_charge_id, payment_method,
                           description, metadata, created_at, updated_at",
            )
            .bind(payment.user_id)
            .bind(payment.product_id)
            .bind(payment.amount)
            .bind(&payment.currency)
            .bind(payment.status)
            .bind(payment.stripe_payment_intent_id.as_deref())
            .bind(payment.payment_method.as_deref())
            .bind(&payment.description)
            .bind(&payment.metadata)
            .fetch_one(&mut **tx)
            .await?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    /// A shopper's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        filter: &PaymentHistoryFilter,
        page: PageRequest,
    ) -> Result<Paginated<PaymentWithProduct>, RepositoryError> {
        let where_clause = "p.user_id = $1
             AND ($2::payment_status IS NULL OR p.status = $2)
             AND ($3::text IS NULL OR pr.title ILIKE $3)";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM payments p
             LEFT JOIN products pr ON pr.id = p.product_id
             WHERE {where_clause}"
        ))
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.q.as_deref().map(contains_pattern))
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PaymentWithProduct>(&format!(
            "SELECT {PAYMENT_COLUMNS}, pr.title AS product_title
             FROM payments p
             LEFT JOIN products pr ON pr.id = p.product_id
             WHERE {where_clause}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $4 OFFSET $5"
        ))
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(Paginated::new(rows, page, total))
    }

    /// A shopper's payments for one payment intent (the checkout receipt).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_intent_for_user(
        &self,
        user_id: UserId,
        intent_id: &str,
    ) -> Result<Vec<PaymentWithProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentWithProduct>(&format!(
            "SELECT {PAYMENT_COLUMNS}, pr.title AS product_title
             FROM payments p
             LEFT JOIN products pr ON pr.id = p.product_id
             WHERE p.user_id = $1 AND p.stripe_payment_intent_id = $2
             ORDER BY p.id"
        ))
        .bind(user_id)
        .bind(intent_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Purchase summary over a shopper's completed payments.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn user_stats(&self, user_id: UserId) -> Result<UserStats, RepositoryError> {
        let (total_products, total_purchases, total_spent): (i64, i64, Decimal) = sqlx::query_as(
            "SELECT COUNT(DISTINCT product_id), COUNT(*), COALESCE(SUM(amount), 0)
             FROM payments
             WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        let brands: Vec<String> = sqlx::query_scalar(
            "SELECT pr.brand FROM payments p
             JOIN products pr ON pr.id = p.product_id
             WHERE p.user_id = $1 AND p.status = 'completed'",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(UserStats {
            total_products,
            total_purchases,
            total_spent,
            favorite_brands: rank_brands(brands.iter().map(String::as_str)),
        })
    }

    /// Distinct products the shopper has completed payments for, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purchased_products(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT pr.id, pr.title, pr.description, pr.price, pr.category, pr.brand,
                    pr.sizes, pr.colors, pr.images, pr.stock, pr.is_active, pr.tags,
                    pr.owner_id, pr.created_at, pr.updated_at
             FROM products pr
             JOIN (
                 SELECT product_id, MAX(created_at) AS last_purchased
                 FROM payments
                 WHERE user_id = $1 AND status = 'completed'
                 GROUP BY product_id
             ) bought ON bought.product_id = pr.id
             ORDER BY bought.last_purchased DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// Move every payment of an intent from `from` to `to`.
    ///
    /// Rows in any other status are left untouched, so replayed or
    /// out-of-order webhook deliveries are harmless. Returns the number of
    /// rows updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the transition is not
    /// allowed, or `RepositoryError::Database` if the update fails.
    pub async fn transition_by_intent(
        &self,
        intent_id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        charge_id: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        if !from.can_transition_to(to) {
            return Err(RepositoryError::DataCorruption(format!(
                "payment status cannot move from {from} to {to}"
            )));
        }

        let result = sqlx::query(
            "UPDATE payments
             SET status = $3, stripe_charge_id = COALESCE($4, stripe_charge_id)
             WHERE stripe_payment_intent_id = $1 AND status = $2",
        )
        .bind(intent_id)
        .bind(from)
        .bind(to)
        .bind(charge_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
