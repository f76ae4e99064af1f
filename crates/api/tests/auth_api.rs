//! HTTP-level integration tests for the auth endpoints: registration with
//! email verification, login, logout, sign-out-everywhere, password change,
//! and rate limiting.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Duration;
use common::{
    body_json, create_verified_user, get_auth, login_user, post_json, post_json_auth,
    post_json_with_headers, FailingNotifier, RecordingNotifier,
};
use pakotp_api::rate_limit::InMemoryRateLimiter;
use pakotp_api::notifications::NoopNotifier;
use pakotp_db::repositories::UserRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Registration and verification
// ---------------------------------------------------------------------------

/// Registration creates an unverified account and emails a 6-digit code.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_sends_code(pool: PgPool) {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = common::build_test_app_with(
        pool.clone(),
        notifier.clone(),
        Arc::new(pakotp_api::rate_limit::NoopRateLimiter),
    );

    let body = serde_json::json!({ "email": "alice@example.com", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "alice@example.com");
    assert_eq!(json["data"]["email_verified"], false);

    let code = notifier.last_code().expect("a code must have been sent");
    assert_eq!(code.len(), 6);

    let user = UserRepo::find_by_email(&pool, "alice@example.com")
        .await
        .expect("lookup should succeed")
        .expect("user row exists");
    assert!(!user.email_verified);
    assert!(user.verification_code_hash.is_some());
}

/// Registration is rejected when the email is malformed or the password is weak.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_validates_input(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "not-an-email", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "email": "alice@example.com", "password": "short" });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Registering the same email twice (any casing) returns 409.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_duplicate_email_conflicts(pool: PgPool) {
    let (_user, _pw) = create_verified_user(&pool, "alice@example.com").await;

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "email": "Alice@Example.com", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// When the verification email cannot be sent, the registration is rolled
/// back: the caller gets an error and no user row survives.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_rolls_back_on_delivery_failure(pool: PgPool) {
    let app = common::build_test_app_with(
        pool.clone(),
        Arc::new(FailingNotifier),
        Arc::new(pakotp_api::rate_limit::NoopRateLimiter),
    );

    let body = serde_json::json!({ "email": "alice@example.com", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let survivor = UserRepo::find_by_email(&pool, "alice@example.com")
        .await
        .expect("lookup should succeed");
    assert!(survivor.is_none(), "no user row may survive a failed send");
}

/// The full registration flow: register, verify with the emailed code, log in.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_verify_login_flow(pool: PgPool) {
    let notifier = Arc::new(RecordingNotifier::default());
    let limiter = Arc::new(pakotp_api::rate_limit::NoopRateLimiter);

    let app = common::build_test_app_with(pool.clone(), notifier.clone(), limiter.clone());
    let body = serde_json::json!({ "email": "alice@example.com", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Login before verification is forbidden.
    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "alice@example.com", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Verify with the code the notifier captured.
    let code = notifier.last_code().expect("a code must have been sent");
    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "alice@example.com", "code": code });
    let response = post_json(app, "/api/v1/auth/verify-email", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email_verified"], true);

    // Now login succeeds and the credential works.
    let app = common::build_test_app(pool.clone());
    let login = login_user(app, "alice@example.com", "hunter2hunter2").await;
    assert!(login["access_token"].is_string());
    assert!(login["expires_in"].is_number());

    let token = login["access_token"].as_str().unwrap();
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/sessions", token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// A wrong code is rejected with the same message as an unknown email.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_verify_email_wrong_code(pool: PgPool) {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = common::build_test_app_with(
        pool.clone(),
        notifier,
        Arc::new(pakotp_api::rate_limit::NoopRateLimiter),
    );
    let body = serde_json::json!({ "email": "alice@example.com", "password": "hunter2hunter2" });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "alice@example.com", "code": "000000" });
    let wrong = post_json(app, "/api/v1/auth/verify-email", body).await;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    let wrong_body = body_json(wrong).await;

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "email": "ghost@example.com", "code": "000000" });
    let ghost = post_json(app, "/api/v1/auth/verify-email", body).await;
    assert_eq!(ghost.status(), StatusCode::BAD_REQUEST);
    let ghost_body = body_json(ghost).await;

    // Uniform failure: the two responses are indistinguishable.
    assert_eq!(wrong_body, ghost_body);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Successful login returns a credential and user info.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let (user, password) = create_verified_user(&pool, "alice@example.com").await;
    let app = common::build_test_app(pool);

    let json = login_user(app, "alice@example.com", &password).await;

    assert!(json["access_token"].is_string());
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["email"], "alice@example.com");
    assert_eq!(json["user"]["role"], "user");
}

/// Email matching is case-insensitive.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_email_case_insensitive(pool: PgPool) {
    let (_user, password) = create_verified_user(&pool, "alice@example.com").await;
    let app = common::build_test_app(pool);

    let json = login_user(app, "ALICE@example.COM", &password).await;
    assert!(json["access_token"].is_string());
}

/// Wrong password and unknown email return the identical 401 response.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_failures_are_uniform(pool: PgPool) {
    let (_user, _password) = create_verified_user(&pool, "alice@example.com").await;

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "alice@example.com", "password": "incorrect" });
    let wrong_pw = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
    let wrong_pw_body = body_json(wrong_pw).await;

    let app = common::build_test_app(pool);
    let body = serde_json::json!({ "email": "ghost@example.com", "password": "incorrect" });
    let ghost = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(ghost.status(), StatusCode::UNAUTHORIZED);
    let ghost_body = body_json(ghost).await;

    assert_eq!(wrong_pw_body, ghost_body);
}

// ---------------------------------------------------------------------------
// Logout and global revocation
// ---------------------------------------------------------------------------

/// Logout kills the credential: the next request with it is a 401.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_invalidates_credential(pool: PgPool) {
    let (_user, password) = create_verified_user(&pool, "alice@example.com").await;

    let app = common::build_test_app(pool.clone());
    let login = login_user(app, "alice@example.com", &password).await;
    let token = login["access_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/auth/logout", serde_json::json!({}), token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/sessions", token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Sign-out-everywhere invalidates every device's credential, not just the
/// one that issued the request.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_all_invalidates_every_device(pool: PgPool) {
    let (_user, password) = create_verified_user(&pool, "alice@example.com").await;

    let app = common::build_test_app(pool.clone());
    let phone = login_user(app, "alice@example.com", &password).await;
    let phone_token = phone["access_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let laptop = login_user(app, "alice@example.com", &password).await;
    let laptop_token = laptop["access_token"].as_str().unwrap();

    // Sign out everywhere from the laptop.
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/auth/logout-all",
        serde_json::json!({}),
        laptop_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Both credentials are dead, including the phone's untouched session.
    for token in [phone_token, laptop_token] {
        let app = common::build_test_app(pool.clone());
        let response = get_auth(app, "/api/v1/sessions", token).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

/// Changing the password revokes all credentials; the new password works,
/// the old one does not.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password_revokes_everything(pool: PgPool) {
    let (_user, password) = create_verified_user(&pool, "alice@example.com").await;

    let app = common::build_test_app(pool.clone());
    let login = login_user(app, "alice@example.com", &password).await;
    let token = login["access_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({
        "current_password": password,
        "new_password": "brand-new-password-9",
    });
    let response = post_json_auth(app, "/api/v1/auth/change-password", body, token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The credential used for the change is revoked too.
    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/sessions", token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Old password no longer authenticates.
    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({ "email": "alice@example.com", "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // New password does.
    let app = common::build_test_app(pool);
    let login = login_user(app, "alice@example.com", "brand-new-password-9").await;
    assert!(login["access_token"].is_string());
}

/// A wrong current password leaves credentials and sessions untouched.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_password_requires_current(pool: PgPool) {
    let (_user, password) = create_verified_user(&pool, "alice@example.com").await;

    let app = common::build_test_app(pool.clone());
    let login = login_user(app, "alice@example.com", &password).await;
    let token = login["access_token"].as_str().unwrap();

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({
        "current_password": "not-my-password-1",
        "new_password": "brand-new-password-9",
    });
    let response = post_json_auth(app, "/api/v1/auth/change-password", body, token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The session survives the failed attempt.
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/sessions", token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Login attempts past the per-client quota get 429 before any credential
/// state is touched.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_is_rate_limited(pool: PgPool) {
    let limiter = Arc::new(InMemoryRateLimiter::new(3, Duration::seconds(60)));

    // Three attempts are allowed (wrong password: still 401, not 429).
    for _ in 0..3 {
        let app = common::build_test_app_with(
            pool.clone(),
            Arc::new(NoopNotifier),
            limiter.clone(),
        );
        let body = serde_json::json!({ "email": "ghost@example.com", "password": "nope1234" });
        let response = post_json_with_headers(
            app,
            "/api/v1/auth/login",
            body,
            &[("x-forwarded-for", "203.0.113.7")],
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The fourth is throttled.
    let app =
        common::build_test_app_with(pool.clone(), Arc::new(NoopNotifier), limiter.clone());
    let body = serde_json::json!({ "email": "ghost@example.com", "password": "nope1234" });
    let response = post_json_with_headers(
        app,
        "/api/v1/auth/login",
        body,
        &[("x-forwarded-for", "203.0.113.7")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different client address is unaffected.
    let app = common::build_test_app_with(pool, Arc::new(NoopNotifier), limiter);
    let body = serde_json::json!({ "email": "ghost@example.com", "password": "nope1234" });
    let response = post_json_with_headers(
        app,
        "/api/v1/auth/login",
        body,
        &[("x-forwarded-for", "198.51.100.2")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
