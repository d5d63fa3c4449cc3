//! Utilities
//!
//! - [`AppError`] / [`ApiResponse`] - error and response types (from shared::error)
//! - [`logger`] - tracing setup
//! - [`metrics`] - Prometheus request metrics

pub mod error;
pub mod logger;
pub mod metrics;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, ok};
pub use metrics::HttpMetrics;
