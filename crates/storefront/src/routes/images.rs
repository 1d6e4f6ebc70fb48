//! Serve uploaded product images.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::instrument;
use uuid::Uuid;

use crate::db::ImageRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Image ids are never reused, so responses can be cached indefinitely.
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Image bytes with their stored content type.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let image = ImageRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("image {id}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, IMMUTABLE.to_string()),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        image.data,
    ))
}
