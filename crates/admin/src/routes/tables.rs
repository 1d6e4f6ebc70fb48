//! Data table configuration for the back-office UI.

use axum::{Json, Router, extract::Path, routing::get};

use crate::components::data_table::{DataTableConfig, table_config};
use crate::middleware::RequireAdmin;
use crate::models::Entity;
use crate::state::AppState;

/// Build the tables router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/tables/{entity}", get(show))
}

/// Columns, filters, and bulk actions for one list page.
///
/// GET /api/tables/{entity}
async fn show(
    RequireAdmin(_admin): RequireAdmin,
    Path(entity): Path<Entity>,
) -> Json<DataTableConfig> {
    Json(table_config(entity))
}
