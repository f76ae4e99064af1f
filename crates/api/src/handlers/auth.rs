//! Handlers for the `/auth` resource: registration, email verification,
//! login, logout, global sign-out, and password change.
//!
//! Failure responses follow a strict leak policy: anything that could
//! confirm an account's existence to an unauthenticated caller (unknown
//! email vs. wrong password, bad vs. expired code) collapses into one
//! uniform message per flow.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use pakotp_core::device;
use pakotp_core::error::CoreError;
use pakotp_core::roles::ROLE_USER;
use pakotp_db::models::session::{deactivation, CreateSession};
use pakotp_db::models::user::{CreateUser, UserResponse};
use pakotp_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::mint_access_token;
use crate::auth::otp;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::rate_limit::{Action, Decision};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/verify-email`.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub code: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    /// Credential lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Uniform credential-failure error. Unknown email, federated-only account,
/// and wrong password all produce this exact response.
fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
}

/// Uniform verification-failure error. Unknown email, missing code, wrong
/// code, and expired code all produce this exact response.
fn invalid_code() -> AppError {
    AppError::Core(CoreError::Validation(
        "Invalid or expired verification code".into(),
    ))
}

/// Best-effort client address, used for rate limiting and session records.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| device::UNKNOWN.to_string())
}

/// Reject the request with 429 when the client is over quota.
fn check_rate_limit(state: &AppState, key: &str, action: Action) -> AppResult<()> {
    match state.rate_limiter.check(key, action, Utc::now()) {
        Decision::Allowed => Ok(()),
        Decision::Limited => Err(AppError::TooManyRequests(
            "Too many attempts. Try again later.".into(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an unverified account and email it a one-time verification code.
/// The flow requires confirmed delivery: if the notifier fails, the account
/// is rolled back and the caller gets an error, so no half-registered user
/// whose code was never sent is left behind.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    check_rate_limit(&state, &client_ip(&headers), Action::Register)?;

    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    validate_password_strength(&input.password)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    // Email is a case-insensitive key; store it normalized.
    let email = input.email.trim().to_lowercase();
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "An account with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let (code, code_hash) = otp::generate_code();
    let code_expires = Utc::now() + Duration::minutes(state.config.registration_ttl_mins);

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: email.clone(),
            password_hash: Some(password_hash),
            role: ROLE_USER.to_string(),
            verification_code_hash: Some(code_hash),
            verification_expires_at: Some(code_expires),
        },
    )
    .await?;

    if let Err(e) = state.notifier.send_verification_code(&email, &code).await {
        tracing::error!(
            error = %e,
            user_id = user.id,
            "verification email failed; rolling back registration"
        );
        if let Err(del) = UserRepo::delete(&state.pool, user.id).await {
            // The unverified-account sweep will collect it.
            tracing::error!(error = %del, user_id = user.id, "registration rollback failed");
        }
        return Err(AppError::InternalError(
            "Could not send the verification email".into(),
        ));
    }

    tracing::info!(user_id = user.id, "user registered, verification pending");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(user),
        }),
    ))
}

/// POST /api/v1/auth/verify-email
///
/// Confirm a registration code. Verifying an already-verified account is a
/// no-op success.
pub async fn verify_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<VerifyEmailRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    check_rate_limit(&state, &client_ip(&headers), Action::VerifyEmail)?;

    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let email = input.email.trim().to_lowercase();
    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid_code)?;

    if user.email_verified {
        return Ok(Json(DataResponse {
            data: UserResponse::from(user),
        }));
    }

    let stored_hash = user.verification_code_hash.as_deref().ok_or_else(invalid_code)?;
    let expires_at = user.verification_expires_at.ok_or_else(invalid_code)?;
    if expires_at < Utc::now() || !otp::code_matches(input.code.trim(), stored_hash) {
        return Err(invalid_code());
    }

    UserRepo::mark_email_verified(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "email verified");

    let user = UserRepo::find_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(invalid_code)?;
    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Creates a session for the device and
/// returns a credential bound to it.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let ip = client_ip(&headers);
    check_rate_limit(&state, &ip, Action::Login)?;

    // 1. Find the account. An unknown email fails exactly like a bad password.
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    // 2. Password sign-in needs a local hash; federated accounts have none.
    let stored_hash = user.password_hash.as_deref().ok_or_else(invalid_credentials)?;

    // 3. Verify the password.
    let password_valid = verify_password(&input.password, stored_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid_credentials());
    }

    // 4. Only verified accounts may sign in.
    if !user.email_verified {
        return Err(AppError::Core(CoreError::Forbidden(
            "Email address is not verified".into(),
        )));
    }

    // 5. Create the backing session. If this fails, sign-in fails: a
    //    credential with no session row behind it would be unrevocable.
    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            device: device::parse_user_agent(user_agent),
            ip_address: ip,
        },
    )
    .await?;

    // 6. Mint the credential, embedding the current token_version and the
    //    new session id.
    let access_token = mint_access_token(&user, session.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, session_id = session.id, "user signed in");

    Ok(Json(LoginResponse {
        access_token,
        expires_in: state.config.jwt.token_expiry_mins * 60,
        user: UserResponse::from(user),
    }))
}

/// POST /api/v1/auth/logout
///
/// Deactivate the session this request authenticated against. The
/// credential dies with it. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::deactivate(
        &state.pool,
        user.session_id,
        user.user_id,
        deactivation::LOGOUT,
    )
    .await?;
    tracing::info!(user_id = user.user_id, session_id = user.session_id, "user signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout-all
///
/// Sign out everywhere: bump `token_version` and deactivate every session
/// in one transaction. Every outstanding credential -- including the one
/// authorizing this request -- is dead afterwards. Returns 204.
pub async fn logout_all(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(
        &state.pool,
        user.user_id,
        deactivation::LOGOUT_ALL,
    )
    .await?;
    tracing::info!(user_id = user.user_id, revoked, "user signed out everywhere");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/change-password
///
/// Verify the current password, install the new hash, then revoke every
/// outstanding credential. The client must sign in again.
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let account = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(invalid_credentials)?;
    let stored_hash = account.password_hash.as_deref().ok_or_else(|| {
        AppError::Core(CoreError::Forbidden(
            "Password sign-in is not enabled for this account".into(),
        ))
    })?;

    let current_valid = verify_password(&input.current_password, stored_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, account.id, &new_hash).await?;

    // A password change is a compromise signal: revoke everything, the
    // requesting session included.
    SessionRepo::revoke_all_for_user(&state.pool, account.id, deactivation::PASSWORD_CHANGE)
        .await?;

    // Best-effort notice; a delivery failure does not undo the change.
    if let Err(e) = state
        .notifier
        .send_security_notice(
            &account.email,
            "Your Pak-OTP password was changed and all devices were signed out. \
             If this was not you, reset your password immediately.",
        )
        .await
    {
        tracing::warn!(error = %e, user_id = account.id, "password-change notice failed");
    }

    tracing::info!(user_id = account.id, "password changed; all sessions revoked");
    Ok(StatusCode::NO_CONTENT)
}
