//! Unified error handling for the back-office.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use stridewell_core::{ImageError, ProductError};

use crate::db::RepositoryError;
use crate::services::auth::AdminAuthError;

/// Application-level error type for the back-office.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Product input failed validation.
    #[error("Invalid product: {0}")]
    InvalidProduct(#[from] ProductError),

    /// Uploaded image rejected.
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AdminAuthError::NotAdmin => StatusCode::FORBIDDEN,
                AdminAuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AdminAuthError::PasswordHash | AdminAuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::InvalidImage(ImageError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidProduct(_) | Self::InvalidImage(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(AdminAuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AdminAuthError::NotAdmin) => "Admin access required".to_string(),
            Self::Auth(AdminAuthError::InvalidEmail(_)) => "Invalid email address".to_string(),
            Self::InvalidProduct(e) => e.to_string(),
            Self::InvalidImage(e) => e.to_string(),
            _ if self.status().is_server_error() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "Not found: product 42");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("referenced".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ProductError::NonPositivePrice.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ProductError::PriceTooPrecise.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_image_error_status_codes() {
        assert_eq!(
            get_status(ImageError::Unsupported.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ImageError::TooLarge { size: 6_000_000 }.into()),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let err = AppError::InvalidImage(ImageError::Empty);
        assert_eq!(err.public_message(), "image is empty");
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AdminAuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AdminAuthError::NotAdmin.into()),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Internal("pool exhausted".into());
        assert_eq!(err.public_message(), "Internal server error");
        let err = AppError::Database(RepositoryError::DataCorruption("bad row".into()));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
