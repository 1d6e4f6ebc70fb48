//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness check
//! GET    /health/ready                 - Readiness check (database)
//!
//! # Auth (rate limited)
//! POST   /auth/register                - Create account and sign in
//! POST   /auth/login                   - Sign in (?redirect=/local/path)
//! POST   /auth/logout                  - Sign out
//!
//! # Catalog
//! GET    /api/products                 - Active products (filters, sort, page)
//! GET    /api/products/facets          - Categories and brands
//! GET    /api/products/{id}            - Product detail
//!
//! # Images
//! GET    /images/{id}                  - Uploaded product image
//!
//! # Cart (session)
//! GET    /api/cart                     - Cart with totals
//! POST   /api/cart/items               - Add line
//! PATCH  /api/cart/items               - Set quantity (<= 0 removes)
//! DELETE /api/cart/items               - Remove line
//! DELETE /api/cart                     - Clear
//!
//! # Checkout (requires auth, rate limited)
//! POST   /api/checkout                 - Check out the cart
//! POST   /api/checkout/buy-now         - Check out a single product
//!
//! # Account (requires auth)
//! GET    /api/payments                 - Payment history
//! GET    /api/payments/intent/{id}     - Receipt for a payment intent
//! GET    /api/me                       - Profile
//! PATCH  /api/me                       - Update profile
//! GET    /api/me/stats                 - Purchase summary
//! GET    /api/me/purchases             - Purchased products
//!
//! # Webhooks
//! POST   /webhooks/stripe              - Stripe events (signature verified)
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod images;
pub mod payments;
pub mod products;
pub mod profile;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/facets", get(products::facets))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route(
            "/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::checkout))
        .route("/buy-now", post(checkout::buy_now))
        .layer(checkout_rate_limiter())
}

/// Create the payment history routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(payments::index))
        .route("/intent/{intent_id}", get(payments::by_intent))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).patch(profile::update))
        .route("/stats", get(profile::stats))
        .route("/purchases", get(profile::purchases))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api/products", product_routes())
        .route("/images/{id}", get(images::show))
        .nest("/api/cart", cart_routes())
        .nest("/api/checkout", checkout_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/me", profile_routes())
        .route("/webhooks/stripe", post(webhooks::stripe))
}
