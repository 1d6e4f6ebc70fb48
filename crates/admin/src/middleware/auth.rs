//! Authentication extractor for the back-office.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};
use crate::services::auth::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

/// Extractor that requires a signed-in admin.
///
/// The session only says who signed in. Admin rights are re-checked against
/// the database on every request, so a demotion or deletion takes effect
/// immediately.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Why [`RequireAdmin`] rejected a request.
#[derive(Debug)]
pub enum AdminRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but no longer an admin.
    Forbidden,
    /// The re-check could not be performed.
    Internal,
}

impl AdminRejection {
    /// Rejection for a request with no admin in the session.
    fn for_request(parts: &Parts) -> Self {
        let uri: &Uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        let path = uri.path();

        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin(
                uri.path_and_query()
                    .map_or_else(|| path.to_string(), ToString::to_string),
            )
        }
    }
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::RedirectToLogin(path) => {
                return Redirect::to(&format!(
                    "/auth/login?redirect={}",
                    urlencoding::encode(&path)
                ))
                .into_response();
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AdminRejection::for_request(parts))?;

        match AdminAuthService::new(state.pool(), &state.config().admin_policy)
            .recheck(admin.id)
            .await
        {
            Ok(_) => Ok(Self(admin)),
            Err(AdminAuthError::NotAdmin) => {
                tracing::warn!(user_id = %admin.id, "Session admin is no longer an admin");
                Err(AdminRejection::Forbidden)
            }
            Err(e) => {
                tracing::error!(error = %e, "Admin re-check failed");
                Err(AdminRejection::Internal)
            }
        }
    }
}

/// Store the signed-in admin in the session, cycling the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// End the admin session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
