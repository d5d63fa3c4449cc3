//! Catalog core
//!
//! # Structure
//!
//! - [`closure`] - closure table model and maintenance
//! - [`classifier`] - attribute link classification against target categories
//! - [`query`] - attribute query planning, ordering and pagination
//! - [`tree`] - category forest assembly with optional counts
//! - [`store`] - [`CatalogStore`] read seam
//! - [`memory`] / [`sqlite`] - store implementations
//! - [`service`] - [`CatalogService`], the two read paths
//! - [`fixtures`] - demo catalog

pub mod classifier;
pub mod closure;
pub mod error;
pub mod fixtures;
pub mod memory;
pub mod query;
pub mod service;
pub mod sqlite;
pub mod store;
pub mod tree;

pub use classifier::{Classification, LinkClassifier, TargetSet};
pub use closure::{ClosureError, ClosureTable};
pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;
pub use query::{LinkSelection, QueryPlan};
pub use service::CatalogService;
pub use sqlite::SqliteCatalog;
pub use store::CatalogStore;
pub use tree::{TreeCounts, build_tree};
