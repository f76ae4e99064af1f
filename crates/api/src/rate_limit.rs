//! Request throttling for the public authentication endpoints.
//!
//! Deliberately a standalone component with pluggable storage: the
//! [`RateLimiter`] trait is what handlers see, [`InMemoryRateLimiter`] is
//! the single-instance implementation. A multi-instance deployment should
//! back the trait with a shared cache instead; nothing else changes.
//!
//! This is peripheral to the session/credential lifecycle -- a limited
//! request is rejected before any credential or session state is touched.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Duration;
use pakotp_core::types::Timestamp;

/// Throttled operations. Each action gets its own counter per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Register,
    Login,
    VerifyEmail,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited,
}

/// Decides whether a client may perform an auth action right now.
///
/// `key` identifies the client (normally the peer IP address); `now` is
/// passed in so tests control the clock.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str, action: Action, now: Timestamp) -> Decision;
}

/// Permits everything. Used in tests and as an explicit opt-out.
#[derive(Debug, Clone, Copy)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _key: &str, _action: Action, _now: Timestamp) -> Decision {
        Decision::Allowed
    }
}

/// One fixed counting window per (client, action).
#[derive(Debug)]
struct Window {
    started: Timestamp,
    count: u32,
}

/// Prune dead windows once the map grows past this many entries.
const PRUNE_THRESHOLD: usize = 10_000;

/// Fixed-window in-memory rate limiter.
///
/// State lives in process memory, so it resets on restart and is not
/// shared across instances -- acceptable for a single-instance deployment,
/// and exactly why the trait exists.
pub struct InMemoryRateLimiter {
    max_attempts: u32,
    window: Duration,
    windows: Mutex<HashMap<(String, Action), Window>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str, action: Action, now: Timestamp) -> Decision {
        let mut windows = self
            .windows
            .lock()
            .expect("rate limiter mutex poisoned");

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now - w.started < window);
        }

        let entry = windows
            .entry((key.to_string(), action))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now - entry.started >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count > self.max_attempts {
            Decision::Limited
        } else {
            Decision::Allowed
        }
    }
}
