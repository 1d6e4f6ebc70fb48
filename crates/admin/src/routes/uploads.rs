//! Product image uploads.
//!
//! The back-office posts image files here and gets back public URLs to put
//! in a product's `images`. Files are stored in the database and served by
//! the storefront.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use stridewell_core::image::{MAX_IMAGE_BYTES, MAX_IMAGES_PER_UPLOAD, check_image};
use stridewell_core::ImageKind;

use crate::db::ImageRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Multipart field names that carry files.
const FILE_FIELDS: [&str; 2] = ["file", "files"];

/// Request body ceiling: a full batch plus room for multipart framing.
const BODY_LIMIT: usize = MAX_IMAGES_PER_UPLOAD * MAX_IMAGE_BYTES + 64 * 1024;

/// A stored image.
#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub id: Uuid,
    pub url: String,
    pub content_type: &'static str,
    pub bytes: usize,
}

/// Response for an upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub images: Vec<UploadedImage>,
}

/// Build the uploads router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/uploads/images", post(upload_images))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

fn is_file_field(name: Option<&str>) -> bool {
    name.is_some_and(|n| FILE_FIELDS.contains(&n))
}

/// Store one or more images.
///
/// Every file is checked before anything is written, so a bad file in the
/// batch leaves nothing behind.
///
/// POST /api/uploads/images (multipart, fields `file` or `files`)
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
async fn upload_images(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut files: Vec<(ImageKind, Option<String>, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if !is_file_field(field.name()) {
            continue;
        }
        if files.len() == MAX_IMAGES_PER_UPLOAD {
            return Err(AppError::BadRequest(format!(
                "at most {MAX_IMAGES_PER_UPLOAD} images per upload"
            )));
        }

        let name = field.file_name().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let kind = check_image(&data)?;
        files.push((kind, name, data.to_vec()));
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("no image files in upload".to_string()));
    }

    let repo = ImageRepository::new(state.pool());
    let mut images = Vec::with_capacity(files.len());
    for (kind, name, data) in files {
        let id = repo.insert(kind, &data, name.as_deref(), admin.id).await?;
        images.push(UploadedImage {
            id,
            url: state.config().image_url(id),
            content_type: kind.content_type(),
            bytes: data.len(),
        });
    }

    tracing::info!(count = images.len(), "Product images uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { images })))
}
