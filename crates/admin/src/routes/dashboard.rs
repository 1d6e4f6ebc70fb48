//! Dashboard route handler.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use stridewell_core::AdminStats;

use crate::db::StatsRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(index))
}

/// Store-wide totals and top sellers.
///
/// GET /api/dashboard
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<AdminStats>> {
    let stats = StatsRepository::new(state.pool()).admin_stats().await?;
    Ok(Json(stats))
}
