//! Authentication extractors.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// API requests without a session user get 401; page requests are redirected
/// to the login page with a `redirect` back to where they came from.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AuthRejection {
    /// Pick the rejection for an anonymous request.
    ///
    /// Nested routers see their path with the mount prefix stripped, so the
    /// full request URI is read from [`OriginalUri`] when present.
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

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => Redirect::to(&format!(
                "/auth/login?redirect={}",
                urlencoding::encode(&path)
            ))
            .into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Authentication required" })),
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AuthRejection::for_request(parts))?;

        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// The session id is cycled first to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (logout). The cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::{get, post},
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;

    async fn whoami(RequireAuth(user): RequireAuth) -> String {
        user.email.to_string()
    }

    fn app() -> Router {
        Router::new()
            .nest("/api/checkout", Router::new().route("/", post(whoami)))
            .nest("/api/me", Router::new().route("/stats", get(whoami)))
            .nest("/account", Router::new().route("/orders", get(whoami)))
            .layer(SessionManagerLayer::new(MemoryStore::default()))
    }

    async fn send(method: &str, uri: &str) -> Response {
        app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_nested_api_route_without_session_is_unauthorized() {
        let response = send("POST", "/api/checkout").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send("GET", "/api/me/stats").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_nested_page_route_redirects_with_full_path() {
        let response = send("GET", "/account/orders?page=2").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login?redirect=%2Faccount%2Forders%3Fpage%3D2"
        );
    }
}
