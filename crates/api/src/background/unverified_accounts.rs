//! Periodic deletion of registrations that never completed verification.
//!
//! This is the only path that deletes a user record in normal operation:
//! an account whose email was never verified past the registration TTL is
//! considered abandoned.

use std::time::Duration;

use chrono::Utc;
use pakotp_db::repositories::UserRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(900); // 15 minutes

/// Run the unverified-account cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, ttl_mins: i64, cancel: CancellationToken) {
    tracing::info!(
        ttl_mins,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Unverified-account cleanup job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Unverified-account cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::minutes(ttl_mins);
                match UserRepo::delete_unverified_before(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Cleanup: removed abandoned registrations");
                        } else {
                            tracing::debug!("Cleanup: no abandoned registrations");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Cleanup: failed to remove abandoned registrations");
                    }
                }
            }
        }
    }
}
