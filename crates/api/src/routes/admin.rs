//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin` (admin role required via extractors).
///
/// ```text
/// GET  /users                        -> list_users
/// POST /users/{id}/revoke-sessions   -> revoke_user_sessions
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}/revoke-sessions", post(admin::revoke_user_sessions))
}
