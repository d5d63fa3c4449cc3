//! In-memory catalog store
//!
//! Holds the whole catalog behind one `parking_lot::RwLock`. Closure
//! maintenance happens under a single write guard, so readers never see a
//! category without its self row.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{
    Attribute, AttributeCreate, Category, CategoryAttribute, CategoryCreate, Product,
    ProductCreate,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::closure::{ClosureError, ClosureTable};
use super::store::CatalogStore;
use crate::db::repository::{RepoError, RepoResult};

#[derive(Debug, Default)]
struct MemoryState {
    categories: BTreeMap<i64, Category>,
    closure: ClosureTable,
    attributes: BTreeMap<i64, Attribute>,
    links: BTreeSet<CategoryAttribute>,
    products: BTreeMap<i64, Product>,
    next_category_id: i64,
    next_attribute_id: i64,
    next_product_id: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Thread-safe in-memory [`CatalogStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category and its closure rows
    pub fn create_category(&self, data: CategoryCreate) -> RepoResult<Category> {
        let mut state = self.state.write();
        if state.categories.values().any(|c| c.key == data.key) {
            return Err(RepoError::Duplicate(format!(
                "Category key '{}' already exists",
                data.key
            )));
        }

        let id = next(&mut state.next_category_id);
        state.closure.insert(id, data.parent_id)?;
        let category = Category {
            id,
            name: data.name,
            key: data.key,
            parent_id: data.parent_id,
        };
        state.categories.insert(id, category.clone());
        Ok(category)
    }

    /// Re-parent a category together with its subtree
    pub fn move_category(&self, id: i64, new_parent: Option<i64>) -> RepoResult<Category> {
        let mut state = self.state.write();
        state.closure.move_subtree(id, new_parent)?;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or(ClosureError::UnknownCategory(id))?;
        category.parent_id = new_parent;
        Ok(category.clone())
    }

    /// Delete a leaf category, its closure rows and its attribute links
    pub fn delete_category(&self, id: i64) -> RepoResult<()> {
        let mut state = self.state.write();
        if state.closure.descendants_of(&[id]).len() > 1 {
            return Err(ClosureError::HasChildren(id).into());
        }
        if state.products.values().any(|p| p.category_id == id) {
            return Err(RepoError::Validation(format!(
                "Category {id} still has products"
            )));
        }
        state.closure.remove(id)?;
        state.categories.remove(&id);
        state.links.retain(|link| link.category_id != id);
        Ok(())
    }

    pub fn create_attribute(&self, data: AttributeCreate, now_millis: i64) -> RepoResult<Attribute> {
        let mut state = self.state.write();
        if state.attributes.values().any(|a| a.key == data.key) {
            return Err(RepoError::Duplicate(format!(
                "Attribute key '{}' already exists",
                data.key
            )));
        }
        let id = next(&mut state.next_attribute_id);
        let attribute = Attribute {
            id,
            key: data.key,
            name: data.name,
            attr_type: data.attr_type,
            created_at: now_millis,
            updated_at: now_millis,
        };
        state.attributes.insert(id, attribute.clone());
        Ok(attribute)
    }

    pub fn link_attribute(&self, category_id: i64, attribute_id: i64) -> RepoResult<()> {
        let mut state = self.state.write();
        if !state.categories.contains_key(&category_id) {
            return Err(ClosureError::UnknownCategory(category_id).into());
        }
        if !state.attributes.contains_key(&attribute_id) {
            return Err(RepoError::NotFound(format!(
                "Attribute {attribute_id} not found"
            )));
        }
        let inserted = state.links.insert(CategoryAttribute {
            category_id,
            attribute_id,
        });
        if !inserted {
            return Err(RepoError::Duplicate(format!(
                "Attribute {attribute_id} is already linked to category {category_id}"
            )));
        }
        Ok(())
    }

    pub fn create_product(&self, data: ProductCreate) -> RepoResult<Product> {
        let mut state = self.state.write();
        if !state.categories.contains_key(&data.category_id) {
            return Err(ClosureError::UnknownCategory(data.category_id).into());
        }
        if state.products.values().any(|p| p.sku == data.sku) {
            return Err(RepoError::Duplicate(format!(
                "Product SKU '{}' already exists",
                data.sku
            )));
        }
        let id = next(&mut state.next_product_id);
        let product = Product {
            id,
            name: data.name,
            sku: data.sku,
            category_id: data.category_id,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    /// Check the closure invariants
    pub fn verify(&self) -> RepoResult<()> {
        Ok(self.state.read().closure.verify()?)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn existing_category_ids(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
        let state = self.state.read();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.categories.contains_key(id))
            .collect())
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Ok(self.state.read().categories.values().cloned().collect())
    }

    async fn ancestors_of(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
        Ok(self.state.read().closure.ancestors_of(ids))
    }

    async fn descendants_of(&self, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
        Ok(self.state.read().closure.descendants_of(ids))
    }

    async fn list_attributes(&self) -> RepoResult<Vec<Attribute>> {
        Ok(self.state.read().attributes.values().cloned().collect())
    }

    async fn list_attribute_links(&self) -> RepoResult<Vec<CategoryAttribute>> {
        Ok(self.state.read().links.iter().copied().collect())
    }

    async fn count_links_by_category(&self) -> RepoResult<HashMap<i64, u64>> {
        let state = self.state.read();
        let mut counts = HashMap::new();
        for link in &state.links {
            *counts.entry(link.category_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_products_rolled_up(&self) -> RepoResult<HashMap<i64, u64>> {
        let state = self.state.read();
        let mut counts = HashMap::new();
        for product in state.products.values() {
            for ancestor in state.closure.ancestors_of(&[product.category_id]) {
                *counts.entry(ancestor).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}
