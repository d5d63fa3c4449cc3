//! Catalog store seam
//!
//! Read contract the catalog core consumes. Implemented by
//! [`SqliteCatalog`](super::sqlite::SqliteCatalog) for production and
//! [`MemoryCatalog`](super::memory::MemoryCatalog) for tests and demos.

use async_trait::async_trait;
use shared::models::{Attribute, AttributeView, Category, CategoryAttribute};
use shared::query::PaginatedResponse;
use std::collections::{BTreeSet, HashMap};

use super::classifier::{LinkClassifier, TargetSet};
use super::error::CatalogResult;
use super::query::QueryPlan;
use crate::db::repository::RepoResult;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Subset of `ids` that exist
    async fn existing_category_ids(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>>;

    /// All categories, ordered by id
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;

    /// Union of the ancestors of `ids`, each id included (depth 0 rows)
    async fn ancestors_of(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>>;

    /// Union of the descendants of `ids`, each id included
    async fn descendants_of(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>>;

    /// All attributes, ordered by id
    async fn list_attributes(&self) -> RepoResult<Vec<Attribute>>;

    /// Every direct category -> attribute link
    async fn list_attribute_links(&self) -> RepoResult<Vec<CategoryAttribute>>;

    /// category_id -> number of direct attribute links; categories without links may be absent
    async fn count_links_by_category(&self) -> RepoResult<HashMap<i64, u64>>;

    /// category_id -> products in the category or any descendant; zero counts may be absent
    async fn count_products_rolled_up(&self) -> RepoResult<HashMap<i64, u64>>;

    /// Cheap liveness check
    async fn ping(&self) -> RepoResult<()>;

    /// One page of attributes for a validated plan.
    ///
    /// Category existence and closure self rows are checked by the caller.
    /// The default loads the attribute and link tables and evaluates the plan
    /// in process; stores that can push the plan down override it.
    async fn query_attributes(
        &self,
        plan: &QueryPlan,
    ) -> CatalogResult<PaginatedResponse<AttributeView>> {
        let Some(category_ids) = plan.category_ids.as_deref() else {
            let attributes = self.list_attributes().await?;
            return Ok(plan.execute(attributes, None));
        };

        let targets = TargetSet::new(category_ids.iter().copied())?;
        let (ancestors, links, attributes) = tokio::try_join!(
            self.ancestors_of(category_ids),
            self.list_attribute_links(),
            self.list_attributes(),
        )?;
        let classifier = LinkClassifier::new(&targets, &ancestors, &links);
        Ok(plan.execute(attributes, Some(&classifier)))
    }
}
