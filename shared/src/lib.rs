//! Shared types for the catalog service
//!
//! Common types used by the catalog server and its API clients: error
//! codes, response envelopes, data models and query DTOs.

pub mod error;
pub mod models;
pub mod query;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use query::{AttributeFilter, AttributeQuery, PaginatedResponse, UsageError};
