//! Payment history and receipt handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use stridewell_core::catalog::non_empty;
use stridewell_core::{PageRequest, Paginated, PaymentStatus, PaymentWithProduct};

use crate::db::PaymentRepository;
use crate::db::payments::PaymentHistoryFilter;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Payments per page when `limit` is not given.
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query parameters for payment history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub status: Option<PaymentStatus>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// The signed-in user's payments, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Paginated<PaymentWithProduct>>> {
    let filter = PaymentHistoryFilter {
        status: query.status,
        q: non_empty(query.q),
    };
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let payments = PaymentRepository::new(state.pool())
        .list_for_user(user.id, &filter, page)
        .await?;
    Ok(Json(payments))
}

/// Receipt for one checkout: the user's payments under a payment intent.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn by_intent(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(intent_id): Path<String>,
) -> Result<Json<Vec<PaymentWithProduct>>> {
    let payments = PaymentRepository::new(state.pool())
        .list_by_intent_for_user(user.id, &intent_id)
        .await?;

    if payments.is_empty() {
        return Err(AppError::NotFound(format!("payment intent {intent_id}")));
    }
    Ok(Json(payments))
}
