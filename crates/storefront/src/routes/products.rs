//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use stridewell_core::{CatalogQuery, Paginated, Product, ProductId};

use crate::db::ProductRepository;
use crate::db::products::CatalogFacets;
use crate::error::{AppError, Result};
use crate::state::AppState;

const FACETS_CACHE_KEY: &str = "facets";

/// List active products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Paginated<Product>>> {
    let query = query.normalized();
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let page = ProductRepository::new(state.pool())
        .list_active(&query)
        .await?;
    Ok(Json(page))
}

/// Distinct categories and brands of active products.
#[instrument(skip(state))]
pub async fn facets(State(state): State<AppState>) -> Result<Json<CatalogFacets>> {
    let cache = state.facet_cache();
    if let Some(facets) = cache.get(FACETS_CACHE_KEY).await {
        tracing::debug!("Facet cache hit");
        return Ok(Json(facets));
    }

    let facets = ProductRepository::new(state.pool()).facets().await?;
    cache.insert(FACETS_CACHE_KEY, facets.clone()).await;
    Ok(Json(facets))
}

/// Active product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
