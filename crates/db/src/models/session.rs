//! Session model and DTOs.

use pakotp_core::device::DeviceInfo;
use pakotp_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Labels recorded in `deactivated_by` when a session leaves the ACTIVE
/// state. Diagnostic only; the validator treats all deactivated sessions
/// identically.
pub mod deactivation {
    pub const LOGOUT: &str = "logout";
    pub const LOGOUT_OTHERS: &str = "logout_others";
    pub const LOGOUT_ALL: &str = "logout_all";
    pub const PASSWORD_CHANGE: &str = "password_change";
    pub const ADMIN_REVOKE: &str = "admin_revoke";
    pub const END_SESSION: &str = "end_session";
}

/// A session row from the `user_sessions` table.
///
/// One row per authenticated device/browser instance. A user has any number
/// of concurrent sessions. Device and network fields are descriptive only
/// and never feed security decisions.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub browser: String,
    pub os: String,
    pub device_class: String,
    pub ip_address: String,
    pub is_active: bool,
    pub deactivated_at: Option<Timestamp>,
    pub deactivated_by: Option<String>,
    pub created_at: Timestamp,
    /// Bumped on every successful credential validation; drives expiry.
    pub last_accessed: Timestamp,
}

/// DTO for creating a new session at sign-in.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: DbId,
    pub device: DeviceInfo,
    pub ip_address: String,
}
