//! Category closure index
//!
//! In-memory closure table keyed both by descendant and by ancestor, so
//! ancestor and descendant lookups are map reads rather than tree walks.
//! Every mutating operation either applies completely or leaves the table
//! untouched.

use shared::models::{Category, ClosureRow};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Closure maintenance and integrity errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClosureError {
    #[error("Category {0} not found")]
    UnknownCategory(i64),

    #[error("Category {0} already exists")]
    DuplicateCategory(i64),

    #[error("Category {0} still has child categories")]
    HasChildren(i64),

    #[error("Moving category {category} under {parent} would create a cycle")]
    Cycle { category: i64, parent: i64 },

    #[error("Category {0} has no self closure row")]
    MissingSelfRow(i64),

    #[error("Category {0} has more than one direct parent")]
    MultipleParents(i64),

    #[error("Closure row ({ancestor}, {descendant}, {depth}) is inconsistent")]
    InconsistentRow {
        ancestor: i64,
        descendant: i64,
        depth: i32,
    },
}

type DepthMap = BTreeMap<i64, i32>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureTable {
    /// descendant -> (ancestor -> depth)
    by_descendant: BTreeMap<i64, DepthMap>,
    /// ancestor -> (descendant -> depth)
    by_ancestor: BTreeMap<i64, DepthMap>,
}

impl ClosureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load raw rows without validation; call [`ClosureTable::verify`] to check them.
    pub fn from_rows(rows: impl IntoIterator<Item = ClosureRow>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.put(row.ancestor_id, row.descendant_id, row.depth);
        }
        table
    }

    /// Build the closure of a category forest from its parent pointers.
    ///
    /// Input order does not matter; parents are inserted before children.
    pub fn from_categories(categories: &[Category]) -> Result<Self, ClosureError> {
        let mut table = Self::new();
        let mut pending: Vec<&Category> = categories.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for category in pending {
                match category.parent_id {
                    Some(parent) if !table.contains(parent) => deferred.push(category),
                    parent => table.insert(category.id, parent)?,
                }
            }
            if deferred.len() == before {
                // Remaining nodes reference parents that never appear or form a loop
                let dangling = deferred.iter().find_map(|c| {
                    c.parent_id
                        .filter(|parent| !deferred.iter().any(|other| other.id == *parent))
                });
                return Err(match dangling {
                    Some(parent) => ClosureError::UnknownCategory(parent),
                    None => ClosureError::Cycle {
                        category: deferred[0].id,
                        parent: deferred[0].parent_id.unwrap_or(deferred[0].id),
                    },
                });
            }
            pending = deferred;
        }

        Ok(table)
    }

    fn put(&mut self, ancestor: i64, descendant: i64, depth: i32) {
        self.by_descendant
            .entry(descendant)
            .or_default()
            .insert(ancestor, depth);
        self.by_ancestor
            .entry(ancestor)
            .or_default()
            .insert(descendant, depth);
    }

    fn drop_row(&mut self, ancestor: i64, descendant: i64) {
        if let Some(ancestors) = self.by_descendant.get_mut(&descendant) {
            ancestors.remove(&ancestor);
            if ancestors.is_empty() {
                self.by_descendant.remove(&descendant);
            }
        }
        if let Some(descendants) = self.by_ancestor.get_mut(&ancestor) {
            descendants.remove(&descendant);
            if descendants.is_empty() {
                self.by_ancestor.remove(&ancestor);
            }
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.by_descendant
            .get(&id)
            .is_some_and(|ancestors| ancestors.get(&id) == Some(&0))
    }

    /// Number of closure rows
    pub fn len(&self) -> usize {
        self.by_descendant.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_descendant.is_empty()
    }

    pub fn depth(&self, ancestor: i64, descendant: i64) -> Option<i32> {
        self.by_descendant
            .get(&descendant)
            .and_then(|ancestors| ancestors.get(&ancestor))
            .copied()
    }

    /// Direct parent (the depth-1 ancestor)
    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.by_descendant
            .get(&id)?
            .iter()
            .find(|(_, depth)| **depth == 1)
            .map(|(ancestor, _)| *ancestor)
    }

    /// All rows, ordered by `(ancestor, descendant)`
    pub fn rows(&self) -> Vec<ClosureRow> {
        self.by_ancestor
            .iter()
            .flat_map(|(ancestor, descendants)| {
                descendants
                    .iter()
                    .map(move |(descendant, depth)| ClosureRow::new(*ancestor, *descendant, *depth))
            })
            .collect()
    }

    /// Union of the ancestors of `ids`, each id included
    pub fn ancestors_of(&self, ids: &[i64]) -> BTreeSet<i64> {
        ids.iter()
            .filter_map(|id| self.by_descendant.get(id))
            .flat_map(|ancestors| ancestors.keys().copied())
            .collect()
    }

    /// Union of the descendants of `ids`, each id included
    pub fn descendants_of(&self, ids: &[i64]) -> BTreeSet<i64> {
        ids.iter()
            .filter_map(|id| self.by_ancestor.get(id))
            .flat_map(|descendants| descendants.keys().copied())
            .collect()
    }

    /// Add `id` as a new leaf under `parent` (or as a root).
    pub fn insert(&mut self, id: i64, parent: Option<i64>) -> Result<(), ClosureError> {
        if self.contains(id) {
            return Err(ClosureError::DuplicateCategory(id));
        }
        let inherited: Vec<(i64, i32)> = match parent {
            Some(parent) => self
                .by_descendant
                .get(&parent)
                .filter(|_| self.contains(parent))
                .ok_or(ClosureError::UnknownCategory(parent))?
                .iter()
                .map(|(ancestor, depth)| (*ancestor, depth + 1))
                .collect(),
            None => Vec::new(),
        };

        self.put(id, id, 0);
        for (ancestor, depth) in inherited {
            self.put(ancestor, id, depth);
        }
        Ok(())
    }

    /// Remove a leaf category: every row where it is ancestor or descendant.
    pub fn remove(&mut self, id: i64) -> Result<(), ClosureError> {
        if !self.contains(id) {
            return Err(ClosureError::UnknownCategory(id));
        }
        if self.descendants_of(&[id]).len() > 1 {
            return Err(ClosureError::HasChildren(id));
        }

        let ancestors: Vec<i64> = self.ancestors_of(&[id]).into_iter().collect();
        for ancestor in ancestors {
            self.drop_row(ancestor, id);
        }
        Ok(())
    }

    /// Re-parent `id` together with its subtree.
    ///
    /// Rows linking the subtree to its old ancestors are dropped and rows
    /// linking every subtree node to the new parent's ancestors are added.
    /// Intra-subtree rows are kept.
    pub fn move_subtree(&mut self, id: i64, new_parent: Option<i64>) -> Result<(), ClosureError> {
        if !self.contains(id) {
            return Err(ClosureError::UnknownCategory(id));
        }
        let subtree: BTreeMap<i64, i32> = self.by_ancestor.get(&id).cloned().unwrap_or_default();

        let new_ancestors: Vec<(i64, i32)> = match new_parent {
            Some(parent) => {
                if !self.contains(parent) {
                    return Err(ClosureError::UnknownCategory(parent));
                }
                if subtree.contains_key(&parent) {
                    return Err(ClosureError::Cycle {
                        category: id,
                        parent,
                    });
                }
                self.by_descendant
                    .get(&parent)
                    .map(|ancestors| ancestors.iter().map(|(a, d)| (*a, *d)).collect())
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };

        let old_ancestors: Vec<i64> = self
            .ancestors_of(&[id])
            .into_iter()
            .filter(|ancestor| !subtree.contains_key(ancestor))
            .collect();

        for descendant in subtree.keys() {
            for ancestor in &old_ancestors {
                self.drop_row(*ancestor, *descendant);
            }
        }
        for (descendant, sub_depth) in &subtree {
            for (ancestor, super_depth) in &new_ancestors {
                self.put(*ancestor, *descendant, super_depth + sub_depth + 1);
            }
        }
        Ok(())
    }

    /// Check the structural invariants and report the first violation.
    pub fn verify(&self) -> Result<(), ClosureError> {
        for (descendant, ancestors) in &self.by_descendant {
            if ancestors.get(descendant) != Some(&0) {
                return Err(ClosureError::MissingSelfRow(*descendant));
            }

            let parents: Vec<i64> = ancestors
                .iter()
                .filter(|(_, depth)| **depth == 1)
                .map(|(ancestor, _)| *ancestor)
                .collect();
            if parents.len() > 1 {
                return Err(ClosureError::MultipleParents(*descendant));
            }

            for (ancestor, depth) in ancestors {
                let consistent = match (*depth, parents.first()) {
                    (0, _) => ancestor == descendant,
                    (1, _) => self.contains(*ancestor),
                    (d, Some(parent)) => self.depth(*ancestor, *parent) == Some(d - 1),
                    (_, None) => false,
                };
                let mirrored = self
                    .by_ancestor
                    .get(ancestor)
                    .and_then(|descendants| descendants.get(descendant))
                    == Some(depth);
                if !consistent || !mirrored {
                    return Err(ClosureError::InconsistentRow {
                        ancestor: *ancestor,
                        descendant: *descendant,
                        depth: *depth,
                    });
                }
            }

            // Every ancestor of the parent must also be an ancestor here
            if let Some(parent) = parents.first()
                && let Some(parent_ancestors) = self.by_descendant.get(parent)
            {
                for (ancestor, depth) in parent_ancestors {
                    if ancestors.get(ancestor) != Some(&(depth + 1)) {
                        return Err(ClosureError::InconsistentRow {
                            ancestor: *ancestor,
                            descendant: *descendant,
                            depth: depth + 1,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
