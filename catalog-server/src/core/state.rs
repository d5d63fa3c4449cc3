use std::sync::Arc;

use crate::catalog::{CatalogService, CatalogStore, SqliteCatalog, fixtures};
use crate::core::error::{Result, ServerError};
use crate::core::Config;
use crate::db::DbService;
use crate::utils::{AppError, HttpMetrics};

/// Shared handler state
///
/// Cheap to clone; the catalog service holds its store behind an `Arc` and
/// the metrics registry is shared between clones.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub catalog: CatalogService,
    pub metrics: HttpMetrics,
}

impl ServerState {
    pub fn new(config: Config, store: Arc<dyn CatalogStore>) -> Result<Self> {
        Ok(Self {
            config,
            catalog: CatalogService::new(store),
            metrics: HttpMetrics::new()?,
        })
    }

    /// Open the database, apply migrations and optionally seed demo data
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(ServerError::WorkDir)?;

        let db = DbService::new(config).await?;
        if config.seed_demo_data {
            let seeded = fixtures::seed_sqlite(&db.pool)
                .await
                .map_err(AppError::from)?;
            if !seeded {
                tracing::info!("Database already has categories, demo seed skipped");
            }
        }

        let store = SqliteCatalog::new(db.pool);
        Self::new(config.clone(), Arc::new(store))
    }
}
