//! Shared helpers for HTTP-level integration tests.
//!
//! `build_test_app` mirrors the router construction in `main.rs` (via the
//! shared [`build_app_router`]) so tests exercise the same middleware stack
//! that production uses.

#![allow(dead_code)] // each test binary uses a different subset of helpers

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::Duration;
use sqlx::PgPool;
use tower::ServiceExt;

use pakotp_api::auth::jwt::JwtConfig;
use pakotp_api::auth::password::hash_password;
use pakotp_api::auth::validator::TokenValidator;
use pakotp_api::config::ServerConfig;
use pakotp_api::notifications::{EmailError, Notifier, NoopNotifier};
use pakotp_api::rate_limit::{NoopRateLimiter, RateLimiter};
use pakotp_api::router::build_app_router;
use pakotp_api::state::AppState;
use pakotp_core::expiry::ExpiryConfig;
use pakotp_db::models::user::{CreateUser, User};
use pakotp_db::repositories::UserRepo;

/// Build a test `ServerConfig` with safe defaults and short expiry windows.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789".to_string(),
            token_expiry_mins: 30,
        },
        expiry: ExpiryConfig::new(Duration::minutes(10), Duration::minutes(60))
            .expect("valid test windows"),
        session_retention_days: 90,
        registration_ttl_mins: 60,
        rate_limit_max_attempts: 5,
        rate_limit_window_secs: 60,
    }
}

/// Build the application router with a no-op notifier and no rate limiting.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(NoopNotifier), Arc::new(NoopRateLimiter))
}

/// Build the application router with explicit notifier and rate limiter.
pub fn build_test_app_with(
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
    rate_limiter: Arc<dyn RateLimiter>,
) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        validator: Arc::new(TokenValidator::new(config.expiry)),
        notifier,
        rate_limiter,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Test notifiers
// ---------------------------------------------------------------------------

/// Captures outbound mail so tests can read verification codes.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    /// `(recipient, code)` pairs, in send order.
    pub codes: Mutex<Vec<(String, String)>>,
    /// `(recipient, body)` pairs, in send order.
    pub notices: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// The most recently sent verification code, if any.
    pub fn last_code(&self) -> Option<String> {
        self.codes
            .lock()
            .expect("recording notifier mutex poisoned")
            .last()
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        self.codes
            .lock()
            .expect("recording notifier mutex poisoned")
            .push((to.to_string(), code.to_string()));
        Ok(())
    }

    async fn send_security_notice(&self, to: &str, body: &str) -> Result<(), EmailError> {
        self.notices
            .lock()
            .expect("recording notifier mutex poisoned")
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Fails every send, for testing delivery-failure paths.
#[derive(Debug, Clone, Copy)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_verification_code(&self, _to: &str, _code: &str) -> Result<(), EmailError> {
        Err(EmailError::Build("simulated delivery failure".to_string()))
    }

    async fn send_security_notice(&self, _to: &str, _body: &str) -> Result<(), EmailError> {
        Err(EmailError::Build("simulated delivery failure".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Database seeding
// ---------------------------------------------------------------------------

/// Insert a verified user directly, returning the row and the plaintext
/// password used.
pub async fn create_verified_user(pool: &PgPool, email: &str) -> (User, String) {
    let password = "test_password_123";
    let hashed = hash_password(password).expect("hashing should succeed");
    let input = CreateUser {
        email: email.to_string(),
        password_hash: Some(hashed),
        role: pakotp_core::roles::ROLE_USER.to_string(),
        verification_code_hash: None,
        verification_expires_at: None,
    };
    let user = UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
    sqlx::query("UPDATE users SET email_verified = true WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .expect("verification flag update should succeed");
    let user = UserRepo::find_by_id(pool, user.id)
        .await
        .expect("lookup should succeed")
        .expect("user exists");
    (user, password.to_string())
}

/// Like [`create_verified_user`] but with the admin role.
pub async fn create_admin_user(pool: &PgPool, email: &str) -> (User, String) {
    let (user, password) = create_verified_user(pool, email).await;
    sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
        .bind(user.id)
        .bind(pakotp_core::roles::ROLE_ADMIN)
        .execute(pool)
        .await
        .expect("role update should succeed");
    let user = UserRepo::find_by_id(pool, user.id)
        .await
        .expect("lookup should succeed")
        .expect("user exists");
    (user, password)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
    extra_headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, &[]).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, Some(token), &[]).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None, &[]).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), Some(token), &[]).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(token), &[]).await
}

pub async fn post_json_with_headers(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    extra_headers: &[(&str, &str)],
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None, extra_headers).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, Some(token), &[]).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Log a user in via the API and return the parsed JSON response.
pub async fn login_user(app: Router, email: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(
        response.status(),
        axum::http::StatusCode::OK,
        "login should succeed"
    );
    body_json(response).await
}
