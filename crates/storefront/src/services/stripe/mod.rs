//! Stripe integration: `PaymentIntent` creation and webhook verification.
//!
//! Talks to the Stripe REST API directly with `reqwest`; no SDK.

mod client;
mod error;
pub mod types;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{CreatePaymentIntent, PaymentIntent, WebhookEvent, WebhookObject};
