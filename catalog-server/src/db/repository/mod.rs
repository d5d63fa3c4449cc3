//! Repository Module
//!
//! SQLite access as free async functions over a `SqlitePool`, one module per
//! table group.

pub mod attribute;
pub mod category;
pub mod closure;
pub mod product;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::catalog::closure::ClosureError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Closure maintenance rejected the change or found broken rows
    #[error(transparent)]
    Hierarchy(#[from] ClosureError),

    /// Transient: pool exhausted or timed out, I/O failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("Row not found".into()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                RepoError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepoError::Validation(db.message().to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::NotFound(_) => AppError::with_message(ErrorCode::NotFound, message),
            RepoError::Duplicate(_) => AppError::with_message(ErrorCode::AlreadyExists, message),
            RepoError::Validation(_) => AppError::validation(message),
            RepoError::Hierarchy(ClosureError::UnknownCategory(id)) => {
                AppError::with_message(ErrorCode::CategoryNotFound, message).with_detail("id", id)
            }
            RepoError::Hierarchy(ClosureError::Cycle { category, parent }) => {
                AppError::with_message(ErrorCode::CategoryCycle, message)
                    .with_detail("id", category)
                    .with_detail("parentId", parent)
            }
            RepoError::Hierarchy(ClosureError::HasChildren(id)) => {
                AppError::validation(message).with_detail("id", id)
            }
            RepoError::Hierarchy(ClosureError::DuplicateCategory(id)) => {
                AppError::with_message(ErrorCode::AlreadyExists, message).with_detail("id", id)
            }
            RepoError::Hierarchy(_) => AppError::integrity(message),
            RepoError::Unavailable(_) => AppError::timeout(message),
            RepoError::Database(_) => AppError::database(message),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// `?, ?, ?` for a runtime `IN (...)` list
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
