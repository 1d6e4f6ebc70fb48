//! Bulk operations over selected table rows.
//!
//! Deletes run one record at a time so a single blocked row (a product with
//! payments, the caller's own account) does not stop the rest. The response
//! counts successes and lists each failure; any failure makes it a 207.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stridewell_core::{PaymentId, ProductId, UserId};

use crate::db::products::ProductStatusFilter;
use crate::db::{PaymentRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, Entity};
use crate::state::AppState;

/// Largest selection accepted by one bulk request.
pub const MAX_BULK_IDS: usize = 500;

/// Body of bulk delete and export requests.
#[derive(Debug, Deserialize)]
pub struct BulkIds {
    pub ids: Vec<i32>,
}

/// Body of a bulk product status update.
#[derive(Debug, Deserialize)]
pub struct BulkStatus {
    pub ids: Vec<i32>,
    pub status: ProductStatusFilter,
}

/// A record a bulk operation could not process.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: i32,
    pub error: String,
}

/// Result of a bulk delete.
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub requested: usize,
    pub succeeded: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    const fn status(&self) -> StatusCode {
        if self.failed.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::MULTI_STATUS
        }
    }
}

impl IntoResponse for BulkOutcome {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Result of a bulk status update.
#[derive(Debug, Serialize)]
pub struct StatusOutcome {
    pub requested: usize,
    pub updated: u64,
}

/// Build the bulk router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bulk/products/status", post(set_product_status))
        .route("/api/bulk/{entity}/delete", post(delete))
        .route("/api/bulk/{entity}/export", post(export))
}

/// Reject empty or oversized selections and drop duplicate ids.
fn checked_ids(mut ids: Vec<i32>) -> Result<Vec<i32>> {
    if ids.is_empty() {
        return Err(AppError::BadRequest("No records selected".to_string()));
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_BULK_IDS} records can be processed at once"
        )));
    }

    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(*id));
    Ok(ids)
}

/// Download name for an export taken on `date`.
fn export_filename(entity: Entity, date: NaiveDate) -> String {
    format!("{entity}_export_{}.json", date.format("%Y-%m-%d"))
}

async fn delete_one(
    state: &AppState,
    admin: &CurrentAdmin,
    entity: Entity,
    id: i32,
) -> Result<()> {
    let pool = state.pool();
    match entity {
        Entity::Products => ProductRepository::new(pool).delete(ProductId::new(id)).await?,
        Entity::Users => {
            let id = UserId::new(id);
            if id == admin.id {
                return Err(AppError::Forbidden(
                    "You cannot delete your own account".to_string(),
                ));
            }
            UserRepository::new(pool).delete(id).await?;
        }
        Entity::Payments => PaymentRepository::new(pool).delete(PaymentId::new(id)).await?,
    }
    Ok(())
}

/// Delete the selected records.
///
/// POST /api/bulk/{entity}/delete
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, count = body.ids.len()))]
async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(entity): Path<Entity>,
    Json(body): Json<BulkIds>,
) -> Result<BulkOutcome> {
    let ids = checked_ids(body.ids)?;
    let mut outcome = BulkOutcome {
        requested: ids.len(),
        succeeded: 0,
        failed: Vec::new(),
    };

    for id in ids {
        match delete_one(&state, &admin, entity, id).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                if e.status().is_server_error() {
                    tracing::error!(error = %e, id, "Bulk delete failed");
                }
                outcome.failed.push(BulkFailure {
                    id,
                    error: e.public_message(),
                });
            }
        }
    }

    tracing::info!(
        succeeded = outcome.succeeded,
        failed = outcome.failed.len(),
        "Bulk delete finished"
    );
    Ok(outcome)
}

/// Activate or deactivate the selected products.
///
/// POST /api/bulk/products/status
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, count = body.ids.len()))]
async fn set_product_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<BulkStatus>,
) -> Result<Json<StatusOutcome>> {
    let ids: Vec<ProductId> = checked_ids(body.ids)?
        .into_iter()
        .map(ProductId::new)
        .collect();

    let updated = ProductRepository::new(state.pool())
        .set_active(&ids, body.status.is_active())
        .await?;

    tracing::info!(updated, active = body.status.is_active(), "Bulk status update");
    Ok(Json(StatusOutcome {
        requested: ids.len(),
        updated,
    }))
}

/// Download the selected records as JSON.
///
/// POST /api/bulk/{entity}/export
#[instrument(skip(state, _admin, body), fields(count = body.ids.len()))]
async fn export(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(entity): Path<Entity>,
    Json(body): Json<BulkIds>,
) -> Result<Response> {
    let ids = checked_ids(body.ids)?;
    let pool = state.pool();

    let json = match entity {
        Entity::Products => {
            let ids: Vec<ProductId> = ids.into_iter().map(ProductId::new).collect();
            to_json(&ProductRepository::new(pool).get_many(&ids).await?)
        }
        Entity::Users => {
            let ids: Vec<UserId> = ids.into_iter().map(UserId::new).collect();
            to_json(&UserRepository::new(pool).get_many(&ids).await?)
        }
        Entity::Payments => {
            let ids: Vec<PaymentId> = ids.into_iter().map(PaymentId::new).collect();
            to_json(&PaymentRepository::new(pool).get_many(&ids).await?)
        }
    }?;

    let filename = export_filename(entity, chrono::Utc::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        json,
    )
        .into_response())
}

fn to_json<T: Serialize>(records: &[T]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(records)
        .map_err(|e| AppError::Internal(format!("export serialization failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_ids_dedupes_in_order() {
        assert_eq!(checked_ids(vec![3, 1, 3, 2, 1]).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_checked_ids_rejects_empty_and_oversized() {
        assert!(matches!(checked_ids(vec![]), Err(AppError::BadRequest(_))));
        let too_many: Vec<i32> = (0..=i32::try_from(MAX_BULK_IDS).unwrap()).collect();
        assert!(matches!(checked_ids(too_many), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            export_filename(Entity::Products, date),
            "products_export_2026-03-09.json"
        );
        assert_eq!(
            export_filename(Entity::Payments, date),
            "payments_export_2026-03-09.json"
        );
    }

    #[test]
    fn test_outcome_status() {
        let mut outcome = BulkOutcome {
            requested: 2,
            succeeded: 2,
            failed: Vec::new(),
        };
        assert_eq!(outcome.status(), StatusCode::OK);

        outcome.succeeded = 1;
        outcome.failed.push(BulkFailure {
            id: 9,
            error: "Not found".into(),
        });
        assert_eq!(outcome.status(), StatusCode::MULTI_STATUS);
    }
}
