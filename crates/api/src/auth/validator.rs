//! Stateful credential validation.
//!
//! A signed credential proves nothing on its own once revocation exists:
//! the `token_version` and session snapshots inside it may be stale the
//! moment after minting. [`TokenValidator`] re-derives trustworthiness from
//! the live user and session rows on every request. Nothing is cached
//! across calls, and `now` is an argument, so tests run against a pinned
//! clock.
//!
//! Failure semantics: any storage error is an `Invalid` outcome, never a
//! `Valid` one and never an error surfaced to the caller (fail closed). A
//! user legitimately having no active session is also `Invalid`, just with
//! a different logged reason.

use pakotp_core::expiry::ExpiryConfig;
use pakotp_core::types::{DbId, Timestamp};
use pakotp_db::models::session::Session;
use pakotp_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

use crate::auth::jwt::Claims;

/// Why a credential was rejected. Logged only; externally every rejection
/// is a uniform "invalid" so responses never reveal which gate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    UnknownUser,
    NoSession,
    SessionOwnerMismatch,
    StaleTokenVersion,
    SessionInactive,
    SessionExpired,
    StoreError,
}

/// Result of a validation run.
#[derive(Debug)]
pub enum Validation {
    /// The credential is trustworthy. Carries the resolved session (as read
    /// before the `last_accessed` bump) and the advisory soft-expiry flag.
    Valid {
        session: Session,
        expiring_soon: bool,
    },
    /// The credential must not be honored.
    Invalid,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid { .. })
    }
}

/// Validates credentials against live user and session state.
pub struct TokenValidator {
    expiry: ExpiryConfig,
}

impl TokenValidator {
    pub fn new(expiry: ExpiryConfig) -> Self {
        Self { expiry }
    }

    /// Decide whether a decoded credential is still trustworthy.
    ///
    /// `candidate_session` is the session id the caller wants to
    /// authenticate against -- normally the credential's own `sid` claim.
    /// When `None`, the user's latest active session is used as a fallback.
    ///
    /// On success the resolved session's `last_accessed` is bumped.
    pub async fn validate(
        &self,
        pool: &PgPool,
        claims: &Claims,
        candidate_session: Option<DbId>,
        now: Timestamp,
    ) -> Validation {
        match self.check(pool, claims, candidate_session, now).await {
            Ok(validation) => validation,
            Err(rejection) => {
                tracing::debug!(
                    user_id = claims.sub,
                    candidate_session = ?candidate_session,
                    reason = ?rejection,
                    "credential rejected"
                );
                Validation::Invalid
            }
        }
    }

    async fn check(
        &self,
        pool: &PgPool,
        claims: &Claims,
        candidate_session: Option<DbId>,
        now: Timestamp,
    ) -> Result<Validation, Rejection> {
        let user = UserRepo::find_by_id(pool, claims.sub)
            .await
            .map_err(store_error)?
            .ok_or(Rejection::UnknownUser)?;

        // Resolve the session: exact lookup when the credential names one,
        // otherwise the most recent active session for the user. "None"
        // from either path means no valid session, not a fault.
        let session = match candidate_session {
            Some(id) => SessionRepo::find_by_id(pool, id)
                .await
                .map_err(store_error)?,
            None => SessionRepo::latest_active_for_user(pool, user.id)
                .await
                .map_err(store_error)?,
        }
        .ok_or(Rejection::NoSession)?;

        if session.user_id != user.id {
            return Err(Rejection::SessionOwnerMismatch);
        }

        // The version check runs before any session-state check. A stale
        // credential can name a session that is still active because it
        // belongs to a newer sign-in; the version mismatch is the
        // authoritative signal that this credential predates the last
        // global revocation.
        if let Some(tv) = claims.tv {
            if tv != user.token_version {
                return Err(Rejection::StaleTokenVersion);
            }
        }

        if !session.is_active {
            return Err(Rejection::SessionInactive);
        }

        // Expiry is evaluated on read. A session the retention sweep has
        // not flipped yet is still dead once its activity age crosses the
        // hard window.
        if self.expiry.is_hard_expired(session.last_accessed, now) {
            return Err(Rejection::SessionExpired);
        }

        let expiring_soon = self.expiry.is_expiring_soon(session.last_accessed, now);

        // `touch` only matches still-active rows, so a revocation that
        // landed between our read and this write surfaces here.
        if !SessionRepo::touch(pool, session.id)
            .await
            .map_err(store_error)?
        {
            return Err(Rejection::SessionInactive);
        }

        Ok(Validation::Valid {
            session,
            expiring_soon,
        })
    }
}

fn store_error(err: sqlx::Error) -> Rejection {
    tracing::warn!(error = %err, "store error during credential validation; failing closed");
    Rejection::StoreError
}
