//! Category tree assembly

use shared::models::{Category, CategoryNode};
use std::collections::{HashMap, HashSet};

/// Per-category counts attached to tree nodes
#[derive(Debug, Clone, Default)]
pub struct TreeCounts {
    /// Direct attribute links of the category itself
    pub attributes: HashMap<i64, u64>,
    /// Products in the category or any descendant
    pub products: HashMap<i64, u64>,
}

/// Assemble a forest from a flat category list.
///
/// Children keep the relative order of `categories`. A node whose parent is
/// missing is logged and promoted to a root. Count fields are filled only
/// when `counts` is given; missing entries count as zero.
pub fn build_tree(categories: &[Category], counts: Option<&TreeCounts>) -> Vec<CategoryNode> {
    let by_id: HashMap<i64, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for category in categories {
        match category.parent_id {
            None => roots.push(category.id),
            Some(parent) if by_id.contains_key(&parent) => {
                children.entry(parent).or_default().push(category.id)
            }
            Some(parent) => {
                tracing::warn!(
                    category_id = category.id,
                    parent_id = parent,
                    "Orphaned node found: {} (ID: {}) references non-existent parent ID: {}",
                    category.name,
                    category.id,
                    parent
                );
                roots.push(category.id);
            }
        }
    }

    let builder = Builder {
        by_id,
        children,
        counts,
    };
    let mut visited = HashSet::new();
    let mut forest: Vec<CategoryNode> = roots
        .iter()
        .filter_map(|id| builder.node(*id, &mut visited))
        .collect();

    // Parent chains that loop never reach a root
    for category in categories {
        if !visited.contains(&category.id) {
            tracing::warn!(
                category_id = category.id,
                "Category {} (ID: {}) is part of a parent cycle; promoting to root",
                category.name,
                category.id
            );
            if let Some(node) = builder.node(category.id, &mut visited) {
                forest.push(node);
            }
        }
    }

    forest
}

struct Builder<'a> {
    by_id: HashMap<i64, &'a Category>,
    children: HashMap<i64, Vec<i64>>,
    counts: Option<&'a TreeCounts>,
}

impl Builder<'_> {
    fn node(&self, id: i64, visited: &mut HashSet<i64>) -> Option<CategoryNode> {
        if !visited.insert(id) {
            return None;
        }
        let category = self.by_id.get(&id)?;

        let children = self
            .children
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|child| self.node(*child, visited))
                    .collect()
            })
            .unwrap_or_default();

        Some(CategoryNode {
            id,
            name: category.name.clone(),
            parent_id: category.parent_id,
            children,
            attribute_count: self
                .counts
                .map(|c| c.attributes.get(&id).copied().unwrap_or(0)),
            product_count: self
                .counts
                .map(|c| c.products.get(&id).copied().unwrap_or(0)),
        })
    }
}
