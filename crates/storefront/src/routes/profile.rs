//! Profile handlers for the signed-in user.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use stridewell_core::user::merge_field;
use stridewell_core::{Product, ProfileUpdate, UserProfile, UserStats};

use crate::db::{PaymentRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Profile as returned by `/api/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub display_name: String,
    pub is_admin: bool,
}

impl MeResponse {
    fn new(profile: UserProfile, is_admin: bool) -> Self {
        Self {
            display_name: profile.display_name(),
            profile,
            is_admin,
        }
    }
}

async fn current_profile(state: &AppState, user: &CurrentUser) -> Result<UserProfile> {
    UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))
}

/// The signed-in user's profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MeResponse>> {
    let profile = current_profile(&state, &user).await?;
    let is_admin = state
        .config()
        .admin_policy
        .is_admin(profile.role, &profile.email);
    Ok(Json(MeResponse::new(profile, is_admin)))
}

/// Update names and avatar. Absent fields are kept, blank fields cleared.
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<MeResponse>> {
    let update = update.validate().map_err(AuthError::from)?;
    let current = current_profile(&state, &user).await?;

    let first_name = merge_field(update.first_name, current.first_name);
    let last_name = merge_field(update.last_name, current.last_name);
    let avatar_url = merge_field(update.avatar_url, current.avatar_url);

    let profile = UserRepository::new(state.pool())
        .update_profile(
            user.id,
            first_name.as_deref(),
            last_name.as_deref(),
            avatar_url.as_deref(),
        )
        .await?;
    tracing::info!("Profile updated");

    let is_admin = state
        .config()
        .admin_policy
        .is_admin(profile.role, &profile.email);
    Ok(Json(MeResponse::new(profile, is_admin)))
}

/// Purchase summary.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserStats>> {
    let stats = PaymentRepository::new(state.pool())
        .user_stats(user.id)
        .await?;
    Ok(Json(stats))
}

/// Products the user has bought.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn purchases(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let products = PaymentRepository::new(state.pool())
        .purchased_products(user.id)
        .await?;
    Ok(Json(products))
}
