//! Product management route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use stridewell_core::catalog::non_empty;
use stridewell_core::{PageRequest, Paginated, Product, ProductDraft, ProductId};

use crate::db::ProductRepository;
use crate::db::products::{ProductFilter, ProductStatusFilter};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Products per page when `limit` is not given.
const DEFAULT_PAGE_SIZE: u32 = 12;

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub status: Option<ProductStatusFilter>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(index).post(create))
        .route("/api/products/{id}", get(show).put(update).delete(destroy))
}

/// All products, active or not, newest first.
///
/// GET /api/products
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Paginated<Product>>> {
    let filter = ProductFilter {
        q: non_empty(query.q),
        status: query.status,
    };
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let products = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(products))
}

/// Create a product owned by the signed-in admin.
///
/// POST /api/products
#[instrument(skip(state, admin, draft), fields(admin_id = %admin.id))]
async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(draft): Json<ProductDraft>,
) -> Result<impl IntoResponse> {
    let draft = draft.validate()?;
    let product = ProductRepository::new(state.pool())
        .create(&draft, Some(admin.id))
        .await?;

    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Product detail.
///
/// GET /api/products/{id}
#[instrument(skip(state, _admin))]
async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Replace every editable field of a product.
///
/// PUT /api/products/{id}
#[instrument(skip(state, admin, draft), fields(admin_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    let draft = draft.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &draft)
        .await?;

    tracing::info!(product_id = %id, "Product updated");
    Ok(Json(product))
}

/// Delete a product; refused with 409 while payments reference it.
///
/// DELETE /api/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
