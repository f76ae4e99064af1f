use chrono::Duration;
use pakotp_core::expiry::ExpiryConfig;

use crate::auth::jwt::JwtConfig;

/// Default soft-expiry window in minutes (advisory "expiring soon" span).
const DEFAULT_SOFT_EXPIRY_MINS: i64 = 60;
/// Default hard-expiry window in minutes (30 days of inactivity).
const DEFAULT_HARD_EXPIRY_MINS: i64 = 43_200;
/// Default retention for stale session rows, in days.
const DEFAULT_SESSION_RETENTION_DAYS: i64 = 90;
/// Default TTL for unverified registrations, in minutes.
const DEFAULT_REGISTRATION_TTL_MINS: i64 = 60;
/// Default auth-route rate limit: attempts per window.
const DEFAULT_RATE_LIMIT_MAX_ATTEMPTS: u32 = 10;
/// Default auth-route rate limit window in seconds.
const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT signing configuration (secret, token lifetime).
    pub jwt: JwtConfig,
    /// Session soft/hard expiry windows.
    pub expiry: ExpiryConfig,
    /// Stale session rows older than this are purged by the retention sweep.
    pub session_retention_days: i64,
    /// Unverified accounts older than this are deleted; also the lifetime
    /// of a registration verification code.
    pub registration_ttl_mins: i64,
    /// Auth-route rate limit: attempts allowed per window per client.
    pub rate_limit_max_attempts: u32,
    /// Auth-route rate limit window in seconds.
    pub rate_limit_window_secs: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default   |
    /// |------------------------------|-----------|
    /// | `HOST`                       | `0.0.0.0` |
    /// | `PORT`                       | `3000`    |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`      |
    /// | `SESSION_SOFT_EXPIRY_MINS`   | `60`      |
    /// | `SESSION_HARD_EXPIRY_MINS`   | `43200`   |
    /// | `SESSION_RETENTION_DAYS`     | `90`      |
    /// | `REGISTRATION_TTL_MINS`      | `60`      |
    /// | `RATE_LIMIT_MAX_ATTEMPTS`    | `10`      |
    /// | `RATE_LIMIT_WINDOW_SECS`     | `60`      |
    ///
    /// # Panics
    ///
    /// Panics on malformed values or an inverted expiry configuration --
    /// misconfiguration should fail fast at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_i64("REQUEST_TIMEOUT_SECS", 30)
            .try_into()
            .expect("REQUEST_TIMEOUT_SECS must be non-negative");

        let soft_mins = env_i64("SESSION_SOFT_EXPIRY_MINS", DEFAULT_SOFT_EXPIRY_MINS);
        let hard_mins = env_i64("SESSION_HARD_EXPIRY_MINS", DEFAULT_HARD_EXPIRY_MINS);
        let expiry = ExpiryConfig::new(Duration::minutes(soft_mins), Duration::minutes(hard_mins))
            .expect("SESSION_SOFT_EXPIRY_MINS must be shorter than SESSION_HARD_EXPIRY_MINS");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            expiry,
            session_retention_days: env_i64(
                "SESSION_RETENTION_DAYS",
                DEFAULT_SESSION_RETENTION_DAYS,
            ),
            registration_ttl_mins: env_i64("REGISTRATION_TTL_MINS", DEFAULT_REGISTRATION_TTL_MINS),
            rate_limit_max_attempts: env_i64(
                "RATE_LIMIT_MAX_ATTEMPTS",
                i64::from(DEFAULT_RATE_LIMIT_MAX_ATTEMPTS),
            )
            .try_into()
            .expect("RATE_LIMIT_MAX_ATTEMPTS must fit in u32"),
            rate_limit_window_secs: env_i64(
                "RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            ),
        }
    }
}

/// Read an i64 env var with a default; panics on a malformed value.
fn env_i64(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid integer, got '{raw}'")),
        Err(_) => default,
    }
}
