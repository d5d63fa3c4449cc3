//! Catalog service
//!
//! Entry points for the two read paths:
//!
//! - [`CatalogService::query_attributes`]: query plan -> existence and closure
//!   checks -> store evaluation
//! - [`CatalogService::resolve_category_tree`]: categories + aggregates -> tree

use shared::UsageError;
use shared::models::{AttributeView, CategoryNode};
use shared::query::{AttributeFilter, PaginatedResponse};
use std::sync::Arc;

use super::error::{CatalogError, CatalogResult};
use super::query::QueryPlan;
use super::store::CatalogStore;
use super::tree::{TreeCounts, build_tree};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Category forest, optionally with attribute and rolled-up product counts
    pub async fn resolve_category_tree(
        &self,
        include_counts: bool,
    ) -> CatalogResult<Vec<CategoryNode>> {
        if !include_counts {
            let categories = self.store.list_categories().await?;
            return Ok(build_tree(&categories, None));
        }

        let (categories, attributes, products) = tokio::try_join!(
            self.store.list_categories(),
            self.store.count_links_by_category(),
            self.store.count_products_rolled_up(),
        )?;
        let counts = TreeCounts {
            attributes,
            products,
        };

        tracing::debug!(categories = categories.len(), "Category tree resolved with counts");
        Ok(build_tree(&categories, Some(&counts)))
    }

    /// One page of attributes, classified against the filter's categories
    pub async fn query_attributes(
        &self,
        filter: &AttributeFilter,
    ) -> CatalogResult<PaginatedResponse<AttributeView>> {
        let plan = QueryPlan::new(filter)?;

        tracing::debug!(
            categories = ?plan.category_ids,
            selection = ?plan.selection,
            keyword = ?plan.keyword,
            page = plan.page,
            limit = plan.limit,
            sort_by = plan.sort_by.as_str(),
            "Attribute query"
        );

        let Some(category_ids) = plan.category_ids.as_deref() else {
            return self.store.query_attributes(&plan).await;
        };

        let existing = self.store.existing_category_ids(category_ids).await?;
        let unknown: Vec<i64> = category_ids
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();
        if !unknown.is_empty() {
            return Err(UsageError::UnknownCategories(unknown).into());
        }

        let ancestors = self.store.ancestors_of(category_ids).await?;
        if let Some(id) = category_ids.iter().find(|id| !ancestors.contains(id)) {
            return Err(CatalogError::Integrity(format!(
                "category {id} has no closure self row"
            )));
        }

        self.store.query_attributes(&plan).await
    }

    /// Readiness check against the backing store
    pub async fn ping(&self) -> CatalogResult<()> {
        Ok(self.store.ping().await?)
    }
}
