//! Route definitions for the `/sessions` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Routes mounted at `/sessions` (all require auth via extractors).
///
/// ```text
/// GET    /                -> list_sessions
/// DELETE /{id}            -> end_session
/// POST   /logout-others   -> logout_others
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(sessions::list_sessions))
        .route("/{id}", delete(sessions::end_session))
        .route("/logout-others", post(sessions::logout_others))
}
