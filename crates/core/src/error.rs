use crate::types::DbId;

/// Domain-level error taxonomy.
///
/// Handlers convert these into HTTP responses; the variants deliberately
/// mirror what a caller is allowed to learn. Authentication and validation
/// failures carry a uniform message so responses never reveal whether an
/// account or session exists.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
