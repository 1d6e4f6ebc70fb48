//! Integration tests for Stridewell.
//!
//! These tests drive running servers over HTTP. They are `#[ignore]`d so a
//! plain `cargo test` stays hermetic.
//!
//! # Running Tests
//!
//! ```bash
//! # Database, migrations, and a product to buy
//! sw-cli migrate
//! sw-cli seed products --file data/products.yaml
//!
//! # Servers (direct checkout so no Stripe account is needed)
//! CHECKOUT_MODE=direct ADMIN_EMAILS=it-admin@example.com cargo run -p stridewell-storefront
//! ADMIN_EMAILS=it-admin@example.com cargo run -p stridewell-admin
//!
//! cargo test -p stridewell-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_URL` - default `http://localhost:3000`
//! - `ADMIN_URL` - default `http://localhost:3001`
//! - `TEST_ADMIN_EMAIL` / `TEST_ADMIN_PASSWORD` - an address listed in
//!   `ADMIN_EMAILS`; registered on first use

#![allow(clippy::missing_panics_doc)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for throwaway accounts.
pub const TEST_PASSWORD: &str = "Brisk-Harbor-Lantern-42";

/// Base URL of the storefront server.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the admin server.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// An HTTP client that keeps session cookies.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh email address that no other test run uses.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}+{}@example.com", Uuid::new_v4().simple())
}

/// Register `email` on the storefront with `client`, signing it in.
///
/// Returns the new profile.
pub async fn register(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "first_name": "Test",
            "last_name": "Shopper",
        }))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Invalid register response");
    body["user"].clone()
}

/// A client signed in to the admin server.
///
/// The admin account is registered on the storefront the first time.
pub async fn admin_client() -> Client {
    let email =
        std::env::var("TEST_ADMIN_EMAIL").unwrap_or_else(|_| "it-admin@example.com".to_string());
    let password =
        std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| TEST_PASSWORD.to_string());

    // 409 when the account already exists.
    let _ = client()
        .post(format!("{}/auth/register", storefront_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to reach storefront");

    let admin = client();
    let resp = admin
        .post(format!("{}/auth/login", admin_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to reach admin");
    assert_eq!(
        resp.status(),
        StatusCode::OK,
        "admin login failed; is {email} listed in ADMIN_EMAILS?"
    );
    admin
}

/// The first active product in the storefront catalog.
pub async fn any_product(client: &Client) -> Value {
    let body: Value = client
        .get(format!("{}/api/products?limit=1", storefront_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid product list");

    body["data"]
        .get(0)
        .cloned()
        .expect("catalog is empty; run `sw-cli seed products` first")
}
