//! Background tasks and scheduled jobs.
//!
//! Each submodule is a long-running async function meant to be spawned via
//! `tokio::spawn`; all of them take a [`CancellationToken`] and exit
//! promptly on shutdown.

pub mod session_retention;
pub mod unverified_accounts;
