//! Well-known role name constants.
//!
//! These must match the values stored in the `users.role` column.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
