//! Handlers for the `/sessions` resource: the caller's device list and
//! per-device sign-out.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pakotp_core::error::CoreError;
use pakotp_core::types::{DbId, Timestamp};
use pakotp_db::models::session::deactivation;
use pakotp_db::repositories::SessionRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// One entry in the device list.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: DbId,
    pub browser: String,
    pub os: String,
    pub device_class: String,
    pub ip_address: String,
    pub is_active: bool,
    /// The session this request authenticated against.
    pub is_current: bool,
    /// Advisory: inside the soft-expiry window. Surfaced so the UI can warn
    /// before the hard cutoff signs the device out.
    pub expiring_soon: bool,
    pub created_at: Timestamp,
    pub last_accessed: Timestamp,
}

/// Response body for `POST /sessions/logout-others`.
#[derive(Debug, Serialize)]
pub struct LogoutOthersResponse {
    /// Number of sessions that were signed out.
    pub ended: u64,
}

/// GET /api/v1/sessions
///
/// List the caller's sessions, newest first. Includes deactivated rows so
/// the list doubles as a sign-in history.
pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<SessionResponse>>>> {
    let now = Utc::now();
    let sessions = SessionRepo::list_for_user(&state.pool, user.user_id).await?;

    let data = sessions
        .into_iter()
        .map(|s| SessionResponse {
            is_current: s.id == user.session_id,
            expiring_soon: s.is_active && state.config.expiry.is_expiring_soon(s.last_accessed, now),
            id: s.id,
            browser: s.browser,
            os: s.os,
            device_class: s.device_class,
            ip_address: s.ip_address,
            is_active: s.is_active,
            created_at: s.created_at,
            last_accessed: s.last_accessed,
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/sessions/{id}
///
/// End one of the caller's sessions. This is an alias of deactivation: the
/// row stays for the audit trail until the retention sweep removes it, and
/// the validator treats it exactly like any other revoked session.
///
/// A session that does not exist and a session owned by someone else both
/// return the same 404, so other users' session ids cannot be probed.
pub async fn end_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let ended = SessionRepo::deactivate(
        &state.pool,
        session_id,
        user.user_id,
        deactivation::END_SESSION,
    )
    .await?;

    if !ended {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        }));
    }

    tracing::info!(user_id = user.user_id, session_id, "session ended");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/logout-others
///
/// Sign out every other device. The current session and the user's
/// `token_version` are untouched, so the current credential stays valid.
pub async fn logout_others(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<LogoutOthersResponse>>> {
    let ended = SessionRepo::deactivate_others_for_user(
        &state.pool,
        user.user_id,
        user.session_id,
        deactivation::LOGOUT_OTHERS,
    )
    .await?;

    tracing::info!(user_id = user.user_id, ended, "other sessions signed out");
    Ok(Json(DataResponse {
        data: LogoutOthersResponse { ended },
    }))
}
