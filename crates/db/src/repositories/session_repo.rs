//! Repository for the `user_sessions` table.
//!
//! Implements the session lifecycle: creation at sign-in, soft deactivation
//! (the canonical way a session ends), the transactional revoke-all that
//! also bumps the user's `token_version`, and the retention purge (the only
//! hard-deletion path).

use pakotp_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::{CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, browser, os, device_class, ip_address, is_active, \
                        deactivated_at, deactivated_by, created_at, last_accessed";

/// Provides lifecycle operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new active session, returning the created row.
    ///
    /// `created_at` and `last_accessed` both start at the database's `NOW()`.
    /// There is no uniqueness constraint per user: concurrent sessions from
    /// multiple devices are expected.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, browser, os, device_class, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(&input.device.browser)
            .bind(&input.device.os)
            .bind(&input.device.device_class)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Exact lookup by session id. Returns the row regardless of state;
    /// callers decide what an inactive row means.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recently created active session, if any.
    ///
    /// This is the fallback lookup for credentials that do not name a
    /// session; "no active session" is a legitimate `None`, not an error.
    pub async fn latest_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1 AND is_active = true
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// All sessions belonging to a user, newest first. Includes deactivated
    /// rows so the device list doubles as an audit trail.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Bump `last_accessed` to now. Returns `true` if the session was still
    /// active; `false` means it was deactivated or deleted since it was
    /// read, and the caller must not treat the credential as valid.
    pub async fn touch(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET last_accessed = NOW()
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deactivate one session owned by `user_id`.
    ///
    /// Ownership is enforced in the WHERE clause, so a caller probing
    /// another user's session id gets the same `false` as a nonexistent id
    /// and learns nothing. Idempotent: repeating the call keeps the first
    /// `deactivated_at`/`deactivated_by` and still reports `true`.
    pub async fn deactivate(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET
                is_active = false,
                deactivated_at = COALESCE(deactivated_at, NOW()),
                deactivated_by = COALESCE(deactivated_by, $3)
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deactivate every session of a user except `keep`. Used by
    /// "sign out other devices"; the kept session and the user's
    /// `token_version` are untouched, so the current credential stays valid.
    /// Returns the count of sessions deactivated.
    pub async fn deactivate_others_for_user(
        pool: &PgPool,
        user_id: DbId,
        keep: DbId,
        reason: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET
                is_active = false,
                deactivated_at = NOW(),
                deactivated_by = $3
             WHERE user_id = $1 AND id <> $2 AND is_active = true",
        )
        .bind(user_id)
        .bind(keep)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Global revocation: bump the user's `token_version` and deactivate
    /// every active session, in a single transaction.
    ///
    /// The two writes must not be observable half-done -- a validation that
    /// runs concurrently sees either the old world (old version, sessions
    /// active) or the new one, never a mix. After commit, every outstanding
    /// credential for this user fails its version check even if it names a
    /// session the UPDATE never touched. Returns the count of sessions
    /// deactivated.
    pub async fn revoke_all_for_user(
        pool: &PgPool,
        user_id: DbId,
        reason: &str,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE users SET token_version = token_version + 1, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE user_sessions SET
                is_active = false,
                deactivated_at = NOW(),
                deactivated_by = $2
             WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete stale rows: sessions deactivated before `cutoff` and
    /// sessions whose last activity predates it. Retention-sweep only;
    /// user-facing operations never remove rows. Returns the count of
    /// deleted rows.
    pub async fn purge_stale(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions
             WHERE (is_active = false AND deactivated_at < $1)
                OR last_accessed < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
