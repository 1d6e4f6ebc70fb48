//! Business logic services for the storefront.
//!
//! - `auth` - Email/password sign-in and profile synthesis
//! - `checkout` - Atomic checkout of cart lines
//! - `stripe` - Stripe `PaymentIntent` client and webhook verification

pub mod auth;
pub mod checkout;
pub mod stripe;
