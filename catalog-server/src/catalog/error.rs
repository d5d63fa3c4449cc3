//! Catalog core errors

use shared::UsageError;
use shared::error::AppError;
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Caller-correctable misuse, detected before any store access
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// Precondition on the stored data does not hold
    #[error("Data integrity violation: {0}")]
    Integrity(String),

    /// Backing store failure, passed through unmodified
    #[error(transparent)]
    Store(#[from] RepoError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Whether the caller may retry the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(RepoError::Unavailable(_)))
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Usage(usage) => usage.into(),
            CatalogError::Integrity(msg) => AppError::integrity(msg),
            CatalogError::Store(repo) => repo.into(),
        }
    }
}
