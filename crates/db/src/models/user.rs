//! User account model and DTOs.

use pakotp_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash and the verification code hash -- NEVER
/// serialize this to API responses directly. Use [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    /// Argon2id PHC string. `None` for federated-identity accounts.
    pub password_hash: Option<String>,
    /// Bumped exactly once per global credential revocation. A credential
    /// carrying an older copy is invalid regardless of its session's state.
    pub token_version: i32,
    pub role: String,
    pub email_verified: bool,
    /// SHA-256 of the outstanding registration code, if any.
    pub verification_code_hash: Option<String>,
    pub verification_expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no secret material).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub verification_code_hash: Option<String>,
    pub verification_expires_at: Option<Timestamp>,
}
