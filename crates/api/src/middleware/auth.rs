//! Credential-validating extractor for Axum handlers.
//!
//! Unlike a decode-only JWT gate, this extractor performs the full
//! stateful check on every request: signature and `exp` first, then the
//! live cross-check of `token_version` and session state through
//! [`TokenValidator`]. Rejections are uniform 401s; the specific reason is
//! logged, never surfaced.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use pakotp_core::error::CoreError;
use pakotp_core::types::DbId;

use crate::auth::jwt::decode_token;
use crate::auth::validator::Validation;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a Bearer credential in the
/// `Authorization` header, after full stateful validation.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, session_id = user.session_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's email at mint time.
    pub email: String,
    /// The user's role name (`"admin"` or `"user"`).
    pub role: String,
    /// The session this request authenticated against.
    pub session_id: DbId,
    /// Advisory: the session is inside the soft-expiry window.
    pub session_expiring_soon: bool,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = decode_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        match state
            .validator
            .validate(&state.pool, &claims, claims.sid, Utc::now())
            .await
        {
            Validation::Valid {
                session,
                expiring_soon,
            } => Ok(AuthUser {
                user_id: claims.sub,
                email: claims.email,
                role: claims.role,
                session_id: session.id,
                session_expiring_soon: expiring_soon,
            }),
            Validation::Invalid => Err(AppError::Core(CoreError::Unauthorized(
                "Session is no longer valid".into(),
            ))),
        }
    }
}
