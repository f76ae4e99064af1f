//! Request extractors: credential-validating authentication and RBAC.

pub mod auth;
pub mod rbac;
