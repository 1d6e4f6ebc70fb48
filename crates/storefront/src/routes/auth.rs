//! Authentication route handlers.
//!
//! Registration and login put a [`CurrentUser`] in the session; logout takes
//! it out again. The cart survives both.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use stridewell_core::UserProfile;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Query parameters for login.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// Response for a successful login or registration.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
    pub redirect: String,
}

/// Only same-site absolute paths are followed; anything else goes home.
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

async fn start_session(session: &Session, profile: &UserProfile) -> Result<()> {
    set_current_user(session, &CurrentUser::from(profile)).await?;
    set_sentry_user(&profile.id, Some(profile.email.as_str()));
    Ok(())
}

/// Create an account and sign in.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool(), &state.config().admin_policy);
    let profile = auth
        .register(Registration {
            email: &body.email,
            password: &body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;

    start_session(&session, &profile).await?;
    tracing::info!(user_id = %profile.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: profile,
            redirect: "/".to_string(),
        }),
    ))
}

/// Sign in with email and password.
#[instrument(skip(state, session, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().admin_policy);
    let profile = auth.login(&body.email, &body.password).await?;

    start_session(&session, &profile).await?;
    tracing::info!(user_id = %profile.id, "User logged in");

    Ok(Json(SessionResponse {
        user: profile,
        redirect: safe_redirect(query.redirect.as_deref()),
    }))
}

/// Sign out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect_allows_local_paths() {
        assert_eq!(safe_redirect(Some("/account")), "/account");
        assert_eq!(
            safe_redirect(Some("/products?brand=Stride")),
            "/products?brand=Stride"
        );
    }

    #[test]
    fn test_safe_redirect_rejects_external_targets() {
        assert_eq!(safe_redirect(None), "/");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example")), "/");
        assert_eq!(safe_redirect(Some("")), "/");
    }
}
