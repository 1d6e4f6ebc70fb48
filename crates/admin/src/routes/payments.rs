//! Payment management route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::Deserialize;
use tracing::instrument;

use stridewell_core::catalog::non_empty;
use stridewell_core::{AdminPaymentView, PageRequest, Paginated, PaymentId, PaymentStatus};

use crate::db::PaymentRepository;
use crate::db::payments::PaymentFilter;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Payments per page when `limit` is not given.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query parameters for the payment list.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentsQuery {
    pub q: Option<String>,
    pub status: Option<PaymentStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(index))
        .route("/api/payments/{id}", delete(destroy))
}

/// Payments with buyer email and product title, newest first.
///
/// GET /api/payments
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<PaymentsQuery>,
) -> Result<Json<Paginated<AdminPaymentView>>> {
    let filter = PaymentFilter {
        q: non_empty(query.q),
        status: query.status,
    };
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let payments = PaymentRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(payments))
}

/// Delete a payment record.
///
/// DELETE /api/payments/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<PaymentId>,
) -> Result<StatusCode> {
    PaymentRepository::new(state.pool()).delete(id).await?;
    tracing::info!(payment_id = %id, "Payment deleted");
    Ok(StatusCode::NO_CONTENT)
}
