//! Integration tests for the public catalog.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The storefront server running (cargo run -p stridewell-storefront)
//!
//! Run with: cargo test -p stridewell-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;
use stridewell_integration_tests::{any_product, client, storefront_url};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", storefront_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_list_is_paginated_and_active_only() {
    let body: Value = client()
        .get(format!("{}/api/products?page=1&limit=2", storefront_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid JSON");

    let data = body["data"].as_array().expect("data array");
    assert!(data.len() <= 2);
    assert!(data.iter().all(|p| p["is_active"] == true));
    assert_eq!(body["meta"]["current_page"], 1);
    assert_eq!(body["meta"]["items_per_page"], 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_price_sort_is_ascending() {
    let body: Value = client()
        .get(format!("{}/api/products?sort=price_low&limit=50", storefront_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid JSON");

    let prices: Vec<f64> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|p| p["price"].as_str()?.parse().ok())
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]), "{prices:?}");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_inverted_price_range_is_rejected() {
    let resp = client()
        .get(format!(
            "{}/api/products?min_price=500&max_price=100",
            storefront_url()
        ))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_product_detail_and_missing_product() {
    let http = client();
    let product = any_product(&http).await;

    let resp = http
        .get(format!("{}/api/products/{}", storefront_url(), product["id"]))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = http
        .get(format!("{}/api/products/2147483647", storefront_url()))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_facets_list_categories_and_brands() {
    let body: Value = client()
        .get(format!("{}/api/products/facets", storefront_url()))
        .send()
        .await
        .expect("Failed to get facets")
        .json()
        .await
        .expect("Invalid JSON");

    assert!(body["categories"].is_array());
    assert!(body["brands"].is_array());
}
