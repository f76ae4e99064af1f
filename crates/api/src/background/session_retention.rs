//! Periodic hard deletion of stale session rows.
//!
//! Soft deactivation is the canonical way a session ends; this sweep is
//! the only place rows are physically removed, once they are old enough to
//! be useless even as an audit trail. Expiry enforcement does NOT depend
//! on this job running -- the validator computes hard expiry on read.

use std::time::Duration;

use chrono::Utc;
use pakotp_db::repositories::SessionRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the purge runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the session retention loop.
///
/// Deletes sessions whose deactivation or last activity predates the
/// retention period. Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, retention_days: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_days,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Session retention job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::days(retention_days);
                match SessionRepo::purge_stale(&pool, cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::info!(deleted, "Session retention: purged stale rows");
                        } else {
                            tracing::debug!("Session retention: no rows to purge");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session retention: purge failed");
                    }
                }
            }
        }
    }
}
