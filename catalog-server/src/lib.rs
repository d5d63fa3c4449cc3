//! Catalog Server - hierarchy-aware category attribute resolution
//!
//! # Architecture
//!
//! - **Catalog core** (`catalog`): closure table, link classification,
//!   attribute query planning and category tree assembly
//! - **Database** (`db`): SQLite via sqlx, closure maintenance in transactions
//! - **HTTP API** (`api`): read endpoints over axum
//!
//! # Module layout
//!
//! ```text
//! catalog-server/src/
//! ├── core/          # config, state, server, startup errors
//! ├── catalog/       # closure, classifier, query, tree, stores, service
//! ├── api/           # HTTP routes and handlers
//! ├── utils/         # error re-exports, logger, metrics
//! └── db/            # pool, migrations, repositories
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod db;
pub mod utils;

pub use catalog::{CatalogError, CatalogService, CatalogStore};
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, then prepare the working and log directories and the logger
pub fn setup_environment() -> std::io::Result<Config> {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    std::fs::create_dir_all(&config.work_dir)?;
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(
        Some(&config.log_level),
        config.log_json,
        config.log_dir.as_deref(),
    );
    Ok(config)
}
