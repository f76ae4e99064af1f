//! Pak-OTP domain core.
//!
//! Pure domain logic shared by the persistence and API crates: common type
//! aliases, the domain error taxonomy, role constants, the session expiry
//! policy, and best-effort device descriptor parsing. This crate performs
//! no I/O; everything here is deterministic given its inputs.

pub mod device;
pub mod error;
pub mod expiry;
pub mod roles;
pub mod types;
