//! Admin-only user management routes
//!
//! Layered behind both the access gate and the admin role gate.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
    users::User,
};

use super::heroes::Pagination;

pub async fn list_users(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<Vec<User>>> {
    let (limit, offset) = pagination.clamp();
    let users = state
        .users()
        .list(limit, offset, pagination.search.as_deref())
        .await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = state.users().get_by_id(id).await?;
    Ok(Json(user))
}

/// Delete a user account. Admins cannot delete themselves.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if auth.id == id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    state.users().delete(id).await?;
    tracing::info!(deleted_user_id = %id, admin_id = %auth.id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
