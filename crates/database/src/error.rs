//! Storage error type shared by all query modules.

use thiserror::Error;

/// Failure modes of the auto-reply store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying sqlx failure: connection, statement, or decode.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Embedded migration could not be applied.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A lookup that the caller requires to succeed found no row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A create collided with an existing row for the same key.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// A `subject_kind` column held something other than `peer` or `chat`.
    #[error("invalid subject kind: {0}")]
    InvalidSubjectKind(String),
}

/// Result alias used throughout the query modules.
pub type Result<T> = std::result::Result<T, DatabaseError>;
