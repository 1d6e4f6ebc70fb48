//! User management route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use stridewell_core::catalog::non_empty;
use stridewell_core::user::merge_field;
use stridewell_core::{Email, PageRequest, Paginated, UserId, UserProfile, UserRole};

use crate::db::UserRepository;
use crate::db::users::{UserEdit, UserFilter};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Users per page when `limit` is not given.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query parameters for the user list.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub role: Option<UserRole>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Partial edit of a user. Absent fields are kept; an empty name clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(index))
        .route("/api/users/{id}", get(show).patch(update).delete(destroy))
}

/// Merge `patch` over `current`.
fn apply_patch(current: UserProfile, patch: UserPatch) -> Result<UserEdit> {
    let email = match patch.email {
        Some(raw) => Email::parse(&raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => current.email,
    };

    Ok(UserEdit {
        first_name: merge_field(patch.first_name, current.first_name),
        last_name: merge_field(patch.last_name, current.last_name),
        email,
        role: patch.role.unwrap_or(current.role),
    })
}

/// Users matching the query, newest first.
///
/// GET /api/users
#[instrument(skip(state, _admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Paginated<UserProfile>>> {
    let filter = UserFilter {
        q: non_empty(query.q),
        role: query.role,
    };
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let users = UserRepository::new(state.pool()).list(&filter, page).await?;
    Ok(Json(users))
}

/// User detail.
///
/// GET /api/users/{id}
#[instrument(skip(state, _admin))]
async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<UserProfile>> {
    UserRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// Edit names, email, or role.
///
/// PATCH /api/users/{id}
#[instrument(skip(state, admin, patch), fields(admin_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserProfile>> {
    if id == admin.id && patch.role == Some(UserRole::User) {
        return Err(AppError::Forbidden(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let users = UserRepository::new(state.pool());
    let current = users
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    let previous_role = current.role;

    let edit = apply_patch(current, patch)?;
    let user = users.update(id, &edit).await?;

    if user.role != previous_role {
        tracing::info!(user_id = %id, role = %user.role, "User role changed");
    } else {
        tracing::info!(user_id = %id, "User updated");
    }
    Ok(Json(user))
}

/// Delete a user and their payments.
///
/// DELETE /api/users/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(AppError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn profile() -> UserProfile {
        let now = Utc::now();
        UserProfile {
            id: UserId::new(7),
            email: Email::parse("ana@example.com").unwrap(),
            role: UserRole::User,
            first_name: Some("Ana".into()),
            last_name: Some("Reyes".into()),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_patch_keeps_absent_fields() {
        let edit = apply_patch(profile(), UserPatch::default()).unwrap();
        assert_eq!(edit.first_name.as_deref(), Some("Ana"));
        assert_eq!(edit.last_name.as_deref(), Some("Reyes"));
        assert_eq!(edit.email.as_str(), "ana@example.com");
        assert_eq!(edit.role, UserRole::User);
    }

    #[test]
    fn test_apply_patch_sets_and_clears() {
        let patch = UserPatch {
            first_name: Some("Ann".into()),
            last_name: Some(String::new()),
            email: Some("ann@example.com".into()),
            role: Some(UserRole::Admin),
        };
        let edit = apply_patch(profile(), patch).unwrap();
        assert_eq!(edit.first_name.as_deref(), Some("Ann"));
        assert_eq!(edit.last_name, None);
        assert_eq!(edit.email.as_str(), "ann@example.com");
        assert_eq!(edit.role, UserRole::Admin);
    }

    #[test]
    fn test_apply_patch_rejects_bad_email() {
        let patch = UserPatch {
            email: Some("not-an-email".into()),
            ..UserPatch::default()
        };
        assert!(matches!(
            apply_patch(profile(), patch),
            Err(AppError::BadRequest(_))
        ));
    }
}
