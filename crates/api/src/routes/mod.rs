pub mod admin;
pub mod auth;
pub mod health;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                        register (public, rate limited)
/// /auth/verify-email                    confirm registration code (public, rate limited)
/// /auth/login                           login (public, rate limited)
/// /auth/logout                          end the current session (requires auth)
/// /auth/logout-all                      sign out everywhere (requires auth)
/// /auth/change-password                 change password + revoke all (requires auth)
///
/// /sessions                             list the caller's sessions (GET)
/// /sessions/{id}                        end one session (DELETE)
/// /sessions/logout-others               sign out other devices (POST)
///
/// /admin/users                          list accounts (admin only)
/// /admin/users/{id}/revoke-sessions     emergency revocation (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/sessions", sessions::router())
        .nest("/admin", admin::router())
}
