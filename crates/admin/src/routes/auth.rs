//! Authentication route handlers for the back-office.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::auth::AdminAuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query parameters for login.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// Response for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub admin: CurrentAdmin,
    pub redirect: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Only same-site absolute paths are followed; anything else goes to the dashboard.
fn safe_redirect(target: Option<&str>) -> String {
    match target {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Sign in with the storefront email and password.
///
/// POST /auth/login
///
/// A correct password for a non-admin is answered with 403 and no session.
#[instrument(skip(state, session, body), fields(email = %body.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let profile = AdminAuthService::new(state.pool(), &state.config().admin_policy)
        .login(&body.email, &body.password)
        .await?;

    let admin = CurrentAdmin::from(&profile);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(user_id = %admin.id, "Admin logged in");

    Ok(Json(LoginResponse {
        admin,
        redirect: safe_redirect(query.redirect.as_deref()),
    }))
}

/// End the admin session.
///
/// POST /auth/logout
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
