//! Recorded payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PaymentId, PaymentStatus, ProductId, UserId};

/// A payment row. One row is recorded per purchased cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_charge_id: Option<String>,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment joined with the purchased product's title, for payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct PaymentWithProduct {
    #[cfg_attr(feature = "postgres", sqlx(flatten))]
    #[serde(flatten)]
    pub payment: Payment,
    /// `None` once the product has been deleted.
    pub product_title: Option<String>,
}

/// A payment joined with its buyer and product, for the back-office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct AdminPaymentView {
    #[cfg_attr(feature = "postgres", sqlx(flatten))]
    #[serde(flatten)]
    pub payment: Payment,
    pub product_title: Option<String>,
    pub user_email: Option<String>,
}

impl Payment {
    /// Whether this payment counts toward revenue.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}
