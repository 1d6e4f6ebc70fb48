//! HTTP route handlers for the back-office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//! GET  /health/ready                  - Readiness check
//!
//! # Auth
//! POST /auth/login                    - Password login (admins only)
//! POST /auth/logout                   - Logout
//!
//! # Dashboard
//! GET  /api/dashboard                 - Store totals and top sellers
//!
//! # Products
//! GET  /api/products                  - Product listing
//! POST /api/products                  - Create product
//! GET  /api/products/{id}             - Product detail
//! PUT  /api/products/{id}             - Replace product
//! DELETE /api/products/{id}           - Delete product
//!
//! # Users
//! GET  /api/users                     - User listing
//! GET  /api/users/{id}                - User detail
//! PATCH /api/users/{id}               - Edit user
//! DELETE /api/users/{id}              - Delete user
//!
//! # Payments
//! GET  /api/payments                  - Payment listing
//! DELETE /api/payments/{id}           - Delete payment
//!
//! # Bulk
//! POST /api/bulk/{entity}/delete      - Delete selected records
//! POST /api/bulk/{entity}/export      - Download selected records
//! POST /api/bulk/products/status      - Activate or deactivate products
//!
//! # Uploads
//! POST /api/uploads/images            - Store product images, returns URLs
//!
//! # Tables
//! GET  /api/tables/{entity}           - Data table configuration
//! ```

pub mod auth;
pub mod bulk;
pub mod dashboard;
pub mod payments;
pub mod products;
pub mod tables;
pub mod uploads;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete back-office router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(products::router())
        .merge(users::router())
        .merge(payments::router())
        .merge(bulk::router())
        .merge(tables::router())
        .merge(uploads::router())
}
