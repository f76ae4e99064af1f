//! Admin handlers. All endpoints require the admin role via [`RequireAdmin`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pakotp_core::error::CoreError;
use pakotp_core::types::DbId;
use pakotp_db::models::session::deactivation;
use pakotp_db::models::user::UserResponse;
use pakotp_db::repositories::{SessionRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/users
///
/// List all accounts, newest first.
pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/v1/admin/users/{id}/revoke-sessions
///
/// Emergency credential revocation for one account: the same transactional
/// version-bump-plus-deactivate as "sign out everywhere", triggered by an
/// operator. Returns 204.
pub async fn revoke_user_sessions(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let target = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;

    let revoked =
        SessionRepo::revoke_all_for_user(&state.pool, target.id, deactivation::ADMIN_REVOKE)
            .await?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = target.id,
        revoked,
        "admin revoked all sessions"
    );
    Ok(StatusCode::NO_CONTENT)
}
