//! Access-credential minting and signature validation.
//!
//! Credentials are HS256-signed JWTs. Besides the usual identity claims
//! they carry a snapshot of the user's `token_version` and the id of the
//! session they were minted against. The signature and `exp` checks here
//! are only the first gate: a structurally valid credential still has to
//! survive [`TokenValidator`](crate::auth::validator::TokenValidator),
//! which cross-checks those snapshots against the live records on every
//! request. The credential itself cannot be revoked once issued; the
//! snapshots are what make revocation effective.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pakotp_core::types::DbId;
use pakotp_db::models::user::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every access credential.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's email at mint time.
    pub email: String,
    /// The user's role name (`"admin"` or `"user"`).
    pub role: String,
    /// Snapshot of `users.token_version` at mint time. Absent only on
    /// credentials minted before this claim existed; when present it must
    /// match the live value or the credential is dead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv: Option<i32>,
    /// Id of the session this credential was minted against. Absent on
    /// legacy credentials; the validator then falls back to the user's
    /// latest active session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<DbId>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for JWT generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Credential lifetime in minutes (default: 30 days).
    pub token_expiry_mins: i64,
}

/// Default credential expiry in minutes (30 days). The stateful session
/// check is the real gate; this only bounds how long a leaked signing
/// artifact stays decodable.
const DEFAULT_TOKEN_EXPIRY_MINS: i64 = 43_200;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default |
    /// |-------------------------|----------|---------|
    /// | `JWT_SECRET`            | **yes**  | --      |
    /// | `JWT_TOKEN_EXPIRY_MINS` | no       | `43200` |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let token_expiry_mins: i64 = std::env::var("JWT_TOKEN_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_TOKEN_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            token_expiry_mins,
        }
    }
}

/// Mint an HS256 credential for the given user, bound to a session.
///
/// Embeds the current `token_version` and the session id so every later
/// validation can detect global revocation and session death.
pub fn mint_access_token(
    user: &User,
    session_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.token_expiry_mins * 60;

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        tv: Some(user.token_version),
        sid: Some(session_id),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify the signature and `exp` of a credential, returning its [`Claims`].
///
/// A success here means only "structurally sound and not past its JWT
/// expiry"; trustworthiness is decided by the stateful validator.
pub fn decode_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
