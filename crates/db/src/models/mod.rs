//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row, the create DTO for inserts, and a safe `Serialize` representation
//! for API responses where the row carries secrets.

pub mod session;
pub mod user;
