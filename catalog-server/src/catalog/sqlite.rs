//! SQLite-backed catalog store

use async_trait::async_trait;
use shared::models::{Attribute, AttributeView, Category, CategoryAttribute, CategoryCreate};
use shared::query::PaginatedResponse;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashMap};

use super::closure::{ClosureError, ClosureTable};
use super::error::CatalogResult;
use super::query::QueryPlan;
use super::store::CatalogStore;
use crate::db::repository::{self, RepoResult};

#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create_category(&self, data: CategoryCreate) -> RepoResult<Category> {
        repository::category::create(&self.pool, data).await
    }

    pub async fn move_category(&self, id: i64, new_parent: Option<i64>) -> RepoResult<Category> {
        repository::category::move_to(&self.pool, id, new_parent).await
    }

    pub async fn delete_category(&self, id: i64) -> RepoResult<()> {
        repository::category::delete(&self.pool, id).await
    }

    /// Check the stored closure against its invariants
    pub async fn verify(&self) -> RepoResult<()> {
        if let Some(id) = repository::closure::find_missing_self_rows(&self.pool)
            .await?
            .first()
        {
            return Err(ClosureError::MissingSelfRow(*id).into());
        }
        let rows = repository::closure::find_all(&self.pool).await?;
        Ok(ClosureTable::from_rows(rows).verify()?)
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn existing_category_ids(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
        repository::category::existing_ids(&self.pool, ids).await
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        repository::category::find_all(&self.pool).await
    }

    async fn ancestors_of(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
        repository::closure::ancestors_of(&self.pool, ids).await
    }

    async fn descendants_of(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
        repository::closure::descendants_of(&self.pool, ids).await
    }

    async fn list_attributes(&self) -> RepoResult<Vec<Attribute>> {
        repository::attribute::find_all(&self.pool).await
    }

    async fn list_attribute_links(&self) -> RepoResult<Vec<CategoryAttribute>> {
        repository::attribute::find_links(&self.pool).await
    }

    async fn count_links_by_category(&self) -> RepoResult<HashMap<i64, u64>> {
        repository::attribute::count_links_by_category(&self.pool).await
    }

    async fn count_products_rolled_up(&self) -> RepoResult<HashMap<i64, u64>> {
        repository::product::count_rolled_up(&self.pool).await
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Classification, filtering, ordering and the page window run in SQL
    async fn query_attributes(
        &self,
        plan: &QueryPlan,
    ) -> CatalogResult<PaginatedResponse<AttributeView>> {
        let (rows, total) = repository::attribute::query_page(&self.pool, plan).await?;
        let data = rows
            .iter()
            .map(|(attribute, link)| AttributeView::new(attribute, *link))
            .collect();
        Ok(PaginatedResponse::new(data, total, plan.page, plan.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::db::DbService;
    use crate::catalog::memory::MemoryCatalog;
    use crate::db::repository::RepoError;
    use shared::models::LinkType;
    use shared::query::{AttributeFilter, AttributeSortBy, SortOrder};

    async fn seeded() -> SqliteCatalog {
        let db = DbService::in_memory().await.unwrap();
        assert!(fixtures::seed_sqlite(&db.pool).await.unwrap());
        SqliteCatalog::new(db.pool)
    }

    #[tokio::test]
    async fn test_seed_is_idempotent_and_consistent() {
        let store = seeded().await;
        assert!(!fixtures::seed_sqlite(store.pool()).await.unwrap());
        store.verify().await.unwrap();

        let categories = store.list_categories().await.unwrap();
        assert_eq!(categories.len(), 7);
        assert_eq!(categories[fixtures::IPHONES as usize - 1].key, "iphones");

        let options = repository::attribute::find_options(store.pool(), fixtures::WARRANTY_PERIOD)
            .await
            .unwrap();
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["6 months", "12 months", "24 months"]);

        let values = repository::product::find_values(store.pool(), 2).await.unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].value.as_deref(), Some("Apple"));
    }

    #[tokio::test]
    async fn test_closure_reads() {
        let store = seeded().await;
        assert_eq!(
            store.ancestors_of(&[fixtures::IPHONES]).await.unwrap(),
            BTreeSet::from([fixtures::ELECTRONICS, fixtures::MOBILE_PHONES, fixtures::IPHONES])
        );
        assert_eq!(
            store.descendants_of(&[fixtures::MOBILE_PHONES]).await.unwrap(),
            BTreeSet::from([fixtures::MOBILE_PHONES, fixtures::ANDROID_PHONES, fixtures::IPHONES])
        );
        assert!(store.ancestors_of(&[]).await.unwrap().is_empty());
        assert_eq!(
            store.existing_category_ids(&[1, 99, 7]).await.unwrap(),
            BTreeSet::from([1, 7])
        );
    }

    #[tokio::test]
    async fn test_counts() {
        let store = seeded().await;
        let links = store.count_links_by_category().await.unwrap();
        assert_eq!(links[&fixtures::ELECTRONICS], 2);
        assert_eq!(links[&fixtures::MOBILE_PHONES], 3);
        assert!(!links.contains_key(&fixtures::IPHONES));

        let products = store.count_products_rolled_up().await.unwrap();
        assert_eq!(products[&fixtures::ELECTRONICS], 4);
        assert_eq!(products[&fixtures::LAPTOPS], 2);
        assert_eq!(products[&fixtures::BUSINESS_LAPTOPS], 1);
    }

    #[tokio::test]
    async fn test_create_under_leaf_adds_transitive_rows() {
        let store = seeded().await;
        let pro = store
            .create_category(CategoryCreate {
                name: "iPhone Pro".into(),
                key: "iphone_pro".into(),
                parent_id: Some(fixtures::IPHONES),
            })
            .await
            .unwrap();
        assert_eq!(
            store.ancestors_of(&[pro.id]).await.unwrap(),
            BTreeSet::from([
                fixtures::ELECTRONICS,
                fixtures::MOBILE_PHONES,
                fixtures::IPHONES,
                pro.id
            ])
        );
        store.verify().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_parent_and_duplicate_key() {
        let store = seeded().await;
        let err = store
            .create_category(CategoryCreate {
                name: "Ghost".into(),
                key: "ghost".into(),
                parent_id: Some(404),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Hierarchy(ClosureError::UnknownCategory(404))
        ));

        let err = store
            .create_category(CategoryCreate {
                name: "Laptops".into(),
                key: "laptops".into(),
                parent_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
        assert_eq!(store.list_categories().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_move_subtree_and_reject_cycle() {
        let store = seeded().await;
        let moved = store
            .move_category(fixtures::LAPTOPS, Some(fixtures::MOBILE_PHONES))
            .await
            .unwrap();
        assert_eq!(moved.parent_id, Some(fixtures::MOBILE_PHONES));
        store.verify().await.unwrap();
        assert_eq!(
            store.ancestors_of(&[fixtures::GAMING_LAPTOPS]).await.unwrap(),
            BTreeSet::from([
                fixtures::ELECTRONICS,
                fixtures::MOBILE_PHONES,
                fixtures::LAPTOPS,
                fixtures::GAMING_LAPTOPS
            ])
        );

        let err = store
            .move_category(fixtures::MOBILE_PHONES, Some(fixtures::GAMING_LAPTOPS))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Hierarchy(ClosureError::Cycle { .. })
        ));
        store.verify().await.unwrap();
    }

    #[tokio::test]
    async fn test_move_to_root() {
        let store = seeded().await;
        store.move_category(fixtures::LAPTOPS, None).await.unwrap();
        store.verify().await.unwrap();
        let products = store.count_products_rolled_up().await.unwrap();
        assert_eq!(products[&fixtures::ELECTRONICS], 2);
        assert_eq!(products[&fixtures::LAPTOPS], 2);
    }

    #[tokio::test]
    async fn test_delete_leaf_only() {
        let store = seeded().await;
        let err = store.delete_category(fixtures::LAPTOPS).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Hierarchy(ClosureError::HasChildren(_))
        ));
        let err = store.delete_category(fixtures::IPHONES).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        let tablets = store
            .create_category(CategoryCreate {
                name: "Tablets".into(),
                key: "tablets".into(),
                parent_id: Some(fixtures::ELECTRONICS),
            })
            .await
            .unwrap();
        store.delete_category(tablets.id).await.unwrap();
        store.verify().await.unwrap();
        assert!(store.descendants_of(&[tablets.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_reports_missing_self_row() {
        let store = seeded().await;
        sqlx::query("DELETE FROM category_closure WHERE ancestor_id = 5 AND descendant_id = 5")
            .execute(store.pool())
            .await
            .unwrap();
        let err = store.verify().await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Hierarchy(ClosureError::MissingSelfRow(5))
        ));
    }

    #[tokio::test]
    async fn test_ping() {
        let store = seeded().await;
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_sql_query_matches_in_process_evaluation() {
        let sqlite = seeded().await;
        let memory: MemoryCatalog = fixtures::memory_catalog().unwrap();

        let filters = [
            AttributeFilter::default(),
            AttributeFilter::default().keyword("model").paginate(1, 2),
            AttributeFilter::for_categories([fixtures::IPHONES]),
            AttributeFilter::for_categories([fixtures::IPHONES]).not_applicable(true),
            AttributeFilter::for_categories([fixtures::GAMING_LAPTOPS, fixtures::MOBILE_PHONES])
                .link_types([LinkType::Inherited, LinkType::Global]),
            AttributeFilter::for_categories([fixtures::ELECTRONICS, fixtures::LAPTOPS])
                .order_by(AttributeSortBy::CreatedAt, SortOrder::Desc)
                .paginate(2, 3),
            AttributeFilter::for_categories([fixtures::BUSINESS_LAPTOPS])
                .order_by(AttributeSortBy::Key, SortOrder::Asc)
                .keyword("_"),
        ];
        for filter in filters {
            let plan = QueryPlan::new(&filter).unwrap();
            let from_sql = sqlite.query_attributes(&plan).await.unwrap();
            let in_process = memory.query_attributes(&plan).await.unwrap();
            assert_eq!(from_sql, in_process, "{filter:?}");
        }
    }
}
