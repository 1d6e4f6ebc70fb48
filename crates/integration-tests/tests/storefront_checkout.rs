//! Integration tests for cart, checkout, and payment history.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The storefront server running with `CHECKOUT_MODE=direct`
//!
//! Run with: cargo test -p stridewell-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};
use stridewell_integration_tests::{any_product, client, register, storefront_url, unique_email};

/// The size to order for `product`, if it has any.
fn first_size(product: &Value) -> Value {
    product["sizes"].get(0).cloned().unwrap_or(Value::Null)
}

#[tokio::test]
#[ignore = "Requires running storefront server in direct checkout mode"]
async fn test_cart_merges_lines_and_totals() {
    let http = client();
    let product = any_product(&http).await;
    let item = json!({ "product_id": product["id"], "size": first_size(&product), "quantity": 1 });

    for _ in 0..2 {
        let resp = http
            .post(format!("{}/api/cart/items", storefront_url()))
            .json(&item)
            .send()
            .await
            .expect("Failed to add to cart");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart: Value = http
        .get(format!("{}/api/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid JSON");

    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["item_count"], 2);

    let resp = http
        .delete(format!("{}/api/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running storefront server in direct checkout mode"]
async fn test_checkout_requires_sign_in() {
    let resp = client()
        .post(format!("{}/api/checkout", storefront_url()))
        .send()
        .await
        .expect("Failed to reach checkout");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server in direct checkout mode"]
async fn test_empty_cart_checkout_is_rejected() {
    let http = client();
    register(&http, &unique_email("empty-cart")).await;

    let resp = http
        .post(format!("{}/api/checkout", storefront_url()))
        .send()
        .await
        .expect("Failed to reach checkout");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server in direct checkout mode"]
async fn test_checkout_records_completed_payments_and_clears_cart() {
    let http = client();
    register(&http, &unique_email("checkout")).await;
    let product = any_product(&http).await;

    http.post(format!("{}/api/cart/items", storefront_url()))
        .json(&json!({ "product_id": product["id"], "size": first_size(&product) }))
        .send()
        .await
        .expect("Failed to add to cart");

    let resp = http
        .post(format!("{}/api/checkout", storefront_url()))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let receipt: Value = resp.json().await.expect("Invalid receipt");
    assert_eq!(receipt["payments"][0]["status"], "completed");
    assert_eq!(receipt["payments"][0]["payment_method"], "manual");

    let cart: Value = http
        .get(format!("{}/api/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(cart["item_count"], 0);

    let history: Value = http
        .get(format!("{}/api/payments?status=completed", storefront_url()))
        .send()
        .await
        .expect("Failed to get history")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(history["meta"]["total_items"], 1);

    let stats: Value = http
        .get(format!("{}/api/me/stats", storefront_url()))
        .send()
        .await
        .expect("Failed to get stats")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(stats["total_purchases"], 1);
    assert_eq!(stats["total_products"], 1);
}

#[tokio::test]
#[ignore = "Requires running storefront server in direct checkout mode"]
async fn test_buy_now_rejects_zero_quantity() {
    let http = client();
    register(&http, &unique_email("buy-now")).await;
    let product = any_product(&http).await;

    let resp = http
        .post(format!("{}/api/checkout/buy-now", storefront_url()))
        .json(&json!({ "product_id": product["id"], "quantity": 0 }))
        .send()
        .await
        .expect("Failed to reach buy-now");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server in direct checkout mode"]
async fn test_profile_update_and_logout_keeps_cart() {
    let http = client();
    register(&http, &unique_email("profile")).await;

    let me: Value = http
        .patch(format!("{}/api/me", storefront_url()))
        .json(&json!({ "first_name": "Marisol", "last_name": "" }))
        .send()
        .await
        .expect("Failed to update profile")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(me["first_name"], "Marisol");
    assert_eq!(me["last_name"], Value::Null);
    assert_eq!(me["is_admin"], false);

    let product = any_product(&http).await;
    http.post(format!("{}/api/cart/items", storefront_url()))
        .json(&json!({ "product_id": product["id"], "size": first_size(&product) }))
        .send()
        .await
        .expect("Failed to add to cart");

    let resp = http
        .post(format!("{}/auth/logout", storefront_url()))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = http
        .get(format!("{}/api/me", storefront_url()))
        .send()
        .await
        .expect("Failed to get profile");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let cart: Value = http
        .get(format!("{}/api/cart", storefront_url()))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(cart["item_count"], 1);
}
