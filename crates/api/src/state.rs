use std::sync::Arc;

use crate::auth::validator::TokenValidator;
use crate::config::ServerConfig;
use crate::notifications::Notifier;
use crate::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). There is no
/// cached user or session state here; every credential check goes back to
/// the database so revocation is visible immediately.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pakotp_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Stateful credential validation service.
    pub validator: Arc<TokenValidator>,
    /// Outbound email delivery (verification codes, security notices).
    pub notifier: Arc<dyn Notifier>,
    /// Throttling for the public auth endpoints.
    pub rate_limiter: Arc<dyn RateLimiter>,
}
