//! Session expiry policy.
//!
//! Two pure computations over a session's `last_accessed` timestamp:
//! soft expiry ("expiring soon", advisory, used for proactive warnings)
//! and hard expiry (absolute cutoff, an access-denial condition). Both take
//! `now` as an argument so callers control the clock and tests are
//! deterministic.
//!
//! Hard expiry is evaluated on every read. A session whose `is_active` flag
//! has not yet been flipped by the retention sweep is still unusable the
//! moment its activity age crosses the hard window.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// The two windows governing session expiry.
///
/// Invariant: `soft_window < hard_window`, enforced at construction.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryConfig {
    soft_window: Duration,
    hard_window: Duration,
}

impl ExpiryConfig {
    /// Build a policy from the soft and hard windows.
    ///
    /// Fails when either window is non-positive or the soft window does not
    /// fit strictly inside the hard window.
    pub fn new(soft_window: Duration, hard_window: Duration) -> Result<Self, CoreError> {
        if soft_window <= Duration::zero() || hard_window <= Duration::zero() {
            return Err(CoreError::Validation(
                "expiry windows must be positive".into(),
            ));
        }
        if soft_window >= hard_window {
            return Err(CoreError::Validation(format!(
                "soft window ({soft_window}) must be shorter than hard window ({hard_window})"
            )));
        }
        Ok(Self {
            soft_window,
            hard_window,
        })
    }

    /// Whether the session is within `soft_window` of hitting the hard
    /// cutoff. Advisory only, never an access-denial condition by itself.
    pub fn is_expiring_soon(&self, last_accessed: Timestamp, now: Timestamp) -> bool {
        now - last_accessed > self.hard_window - self.soft_window
    }

    /// Whether the session's activity age has reached the hard cutoff.
    pub fn is_hard_expired(&self, last_accessed: Timestamp, now: Timestamp) -> bool {
        now - last_accessed >= self.hard_window
    }
}
