//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `pakotp_db` and map errors via
//! [`AppError`](crate::error::AppError); no storage error crosses a handler
//! boundary raw.

pub mod admin;
pub mod auth;
pub mod sessions;
