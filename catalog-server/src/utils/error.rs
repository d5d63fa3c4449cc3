//! Unified error handling
//!
//! Re-exports the shared error system. Handlers return [`AppResult`] and
//! rely on `From` conversions from the catalog and repository errors:
//!
//! ```ignore
//! let filter = AttributeFilter::try_from(query)?;
//! let page = state.catalog.query_attributes(&filter).await?;
//! Ok(ok(page))
//! ```

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Success envelope
pub fn ok<T>(data: T) -> ApiResponse<T> {
    ApiResponse::success(data)
}
