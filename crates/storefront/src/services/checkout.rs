//! Checkout: turn cart lines into recorded payments in one transaction.
//!
//! Every line is repriced from the catalog; the prices stored in the cart are
//! never trusted. In stripe mode a single `PaymentIntent` covers the whole
//! checkout and the rows stay `pending` until the webhook settles them. In
//! direct mode the rows are written `completed` with no charge.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use stridewell_core::{
    CartLine, Currency, MoneyError, Payment, PaymentStatus, Product, ProductId, UserId,
    to_minor_units,
};

use crate::config::CheckoutMode;
use crate::db::payments::NewPayment;
use crate::db::{PaymentRepository, ProductRepository, RepositoryError};
use crate::services::stripe::{CreatePaymentIntent, StripeClient, StripeError};

/// `payment_method` recorded for direct-mode payments.
pub const MANUAL_PAYMENT_METHOD: &str = "manual";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),

    #[error("size {size:?} is not offered for product {product_id}")]
    InvalidSize {
        product_id: ProductId,
        size: Option<String>,
    },

    #[error("only {available} of product {product_id} in stock (requested {requested})")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: i32,
    },

    #[error("invalid amount: {0}")]
    Money(#[from] MoneyError),

    #[error("payment provider error: {0}")]
    Stripe(#[from] StripeError),

    #[error("stripe checkout is not configured")]
    StripeNotConfigured,

    #[error("this cart has already been checked out")]
    AlreadySubmitted,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A cart line priced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub title: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl PricedLine {
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn description(&self) -> String {
        match &self.size {
            Some(size) => format!("Purchase of {} (size {size})", self.title),
            None => format!("Purchase of {}", self.title),
        }
    }
}

/// The outcome of a committed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub checkout_ref: Uuid,
    pub total: Decimal,
    pub currency: String,
    pub payments: Vec<Payment>,
    /// Stripe mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    /// Stripe mode only; the client confirms the payment with it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Reprice `lines` against `products`.
///
/// # Errors
///
/// Returns `CheckoutError` if the cart is empty, or a line's product is
/// missing or inactive, has no such size, or has too little stock.
pub fn price_lines(
    lines: &[CartLine],
    products: &HashMap<ProductId, Product>,
) -> Result<Vec<PricedLine>, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    lines
        .iter()
        .map(|line| {
            let product = products
                .get(&line.product_id)
                .filter(|p| p.is_active)
                .ok_or(CheckoutError::ProductUnavailable(line.product_id))?;

            if !product.accepts_size(line.size.as_deref()) {
                return Err(CheckoutError::InvalidSize {
                    product_id: product.id,
                    size: line.size.clone(),
                });
            }
            if !product.is_purchasable(line.quantity) {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            Ok(PricedLine {
                product_id: product.id,
                title: product.title.clone(),
                size: line.size.clone(),
                quantity: line.quantity,
                unit_price: product.price,
            })
        })
        .collect()
}

/// Stripe idempotency key for a checkout.
///
/// The amount is part of the key so that retrying after a price change
/// creates a fresh intent instead of being rejected for mismatched parameters.
fn idempotency_key(checkout_ref: Uuid, amount: i64) -> String {
    format!("checkout-{checkout_ref}-{amount}")
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    mode: CheckoutMode,
    stripe: Option<&'a StripeClient>,
    currency: &'a Currency,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        mode: CheckoutMode,
        stripe: Option<&'a StripeClient>,
        currency: &'a Currency,
    ) -> Self {
        Self {
            pool,
            mode,
            stripe,
            currency,
        }
    }

    /// Check out `lines` for `user_id`.
    ///
    /// Nothing is written unless every line is valid, and either all payment
    /// rows are committed or none are. `checkout_ref` identifies this exact
    /// submission: a second checkout with the same reference fails with
    /// `AlreadySubmitted`, and in stripe mode it reuses the same
    /// `PaymentIntent`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` for invalid lines, a resubmitted reference, a
    /// Stripe failure, or a database failure.
    #[instrument(skip(self, lines), fields(user_id = %user_id, lines = lines.len()))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        lines: &[CartLine],
        checkout_ref: Uuid,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<ProductId, Product> = ProductRepository::new(self.pool)
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let priced = price_lines(lines, &products)?;
        let total: Decimal = priced.iter().map(PricedLine::amount).sum();

        let (status, intent, payment_method) = match self.mode {
            CheckoutMode::Stripe => {
                let stripe = self.stripe.ok_or(CheckoutError::StripeNotConfigured)?;
                let mut metadata = BTreeMap::new();
                metadata.insert("user_id".to_string(), user_id.to_string());
                metadata.insert("checkout_ref".to_string(), checkout_ref.to_string());
                metadata.insert("line_count".to_string(), priced.len().to_string());

                let amount = to_minor_units(total)?;
                let intent = stripe
                    .create_payment_intent(&CreatePaymentIntent {
                        amount,
                        currency: self.currency.as_str().to_string(),
                        description: Some(format!("Stridewell order {checkout_ref}")),
                        metadata,
                        idempotency_key: Some(idempotency_key(checkout_ref, amount)),
                    })
                    .await?;
                (PaymentStatus::Pending, Some(intent), None)
            }
            CheckoutMode::Direct => (
                PaymentStatus::Completed,
                None,
                Some(MANUAL_PAYMENT_METHOD.to_string()),
            ),
        };

        let rows: Vec<NewPayment> = priced
            .iter()
            .map(|line| NewPayment {
                user_id,
                product_id: line.product_id,
                amount: line.amount(),
                currency: self.currency.as_str().to_string(),
                status,
                stripe_payment_intent_id: intent.as_ref().map(|i| i.id.clone()),
                payment_method: payment_method.clone(),
                description: line.description(),
                metadata: serde_json::json!({
                    "quantity": line.quantity,
                    "size": line.size,
                    "checkout_ref": checkout_ref,
                }),
            })
            .collect();

        let mut tx = self.pool.begin().await?;
        match PaymentRepository::claim_checkout(&mut tx, checkout_ref, user_id).await {
            Ok(()) => {}
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(checkout_ref = %checkout_ref, "Duplicate checkout submission rejected");
                return Err(CheckoutError::AlreadySubmitted);
            }
            Err(e) => return Err(e.into()),
        }
        let payments = match PaymentRepository::insert_all(&mut tx, &rows).await {
            Ok(payments) => payments,
            Err(e) => {
                if let Some(intent) = &intent {
                    tracing::warn!(
                        payment_intent_id = %intent.id,
                        "Recording payments failed after PaymentIntent was created; it will never be confirmed"
                    );
                }
                return Err(e.into());
            }
        };
        tx.commit().await?;

        tracing::info!(
            checkout_ref = %checkout_ref,
            total = %total,
            payments = payments.len(),
            status = %status,
            "Checkout recorded"
        );

        Ok(CheckoutReceipt {
            checkout_ref,
            total,
            currency: self.currency.as_str().to_string(),
            payments,
            payment_intent_id: intent.as_ref().map(|i| i.id.clone()),
            client_secret: intent.and_then(|i| i.client_secret),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i32, price: i64, stock: i32, sizes: &[&str]) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            title: format!("Shoe {id}"),
            description: String::new(),
            price: Decimal::new(price, 2),
            category: "Shoes".into(),
            brand: "Stride".into(),
            sizes: sizes.iter().map(ToString::to_string).collect(),
            colors: vec![],
            images: vec![],
            stock,
            is_active: true,
            tags: vec![],
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(id: i32, size: Option<&str>, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            size: size.map(String::from),
            quantity,
            title: "stale title".into(),
            unit_price: Decimal::ONE,
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    #[test]
    fn test_price_lines_uses_catalog_prices() {
        let products = catalog(vec![product(1, 459_900, 10, &["42"]), product(2, 19_900, 5, &[])]);
        let priced = price_lines(&[line(1, Some("42"), 2), line(2, None, 3)], &products).unwrap();

        assert_eq!(priced[0].unit_price, Decimal::new(459_900, 2));
        assert_eq!(priced[0].title, "Shoe 1");
        assert_eq!(priced[0].amount(), Decimal::new(919_800, 2));
        assert_eq!(priced[1].amount(), Decimal::new(59_700, 2));
        assert_eq!(priced[0].description(), "Purchase of Shoe 1 (size 42)");
        assert_eq!(priced[1].description(), "Purchase of Shoe 2");
    }

    #[test]
    fn test_price_lines_rejects_empty_cart() {
        assert!(matches!(
            price_lines(&[], &HashMap::new()),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_price_lines_rejects_missing_and_inactive() {
        let mut inactive = product(2, 100, 5, &[]);
        inactive.is_active = false;
        let products = catalog(vec![inactive]);

        assert!(matches!(
            price_lines(&[line(1, None, 1)], &products),
            Err(CheckoutError::ProductUnavailable(id)) if id == ProductId::new(1)
        ));
        assert!(matches!(
            price_lines(&[line(2, None, 1)], &products),
            Err(CheckoutError::ProductUnavailable(_))
        ));
    }

    #[test]
    fn test_idempotency_key_tracks_reference_and_amount() {
        let checkout_ref = Uuid::nil();
        assert_eq!(
            idempotency_key(checkout_ref, 919_800),
            "checkout-00000000-0000-0000-0000-000000000000-919800"
        );
        assert_ne!(
            idempotency_key(checkout_ref, 919_800),
            idempotency_key(checkout_ref, 919_801)
        );
    }

    #[test]
    fn test_price_lines_checks_size_and_stock() {
        let products = catalog(vec![product(1, 100, 2, &["41", "42"])]);

        assert!(matches!(
            price_lines(&[line(1, Some("45"), 1)], &products),
            Err(CheckoutError::InvalidSize { .. })
        ));
        assert!(matches!(
            price_lines(&[line(1, Some("41"), 3)], &products),
            Err(CheckoutError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));
    }
}
