//! Data models
//!
//! Shared between catalog-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod attribute;
pub mod category;
pub mod product;

// Re-exports
pub use attribute::*;
pub use category::*;
pub use product::*;
