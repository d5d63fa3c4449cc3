//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity
///
/// Categories form a forest through `parent_id`; the transitive relation is
/// materialized separately as [`ClosureRow`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Unique slug, e.g. "mobile_phones"
    pub key: String,
    pub parent_id: Option<i64>,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreate {
    pub name: String,
    pub key: String,
    pub parent_id: Option<i64>,
}

/// One row of the category closure table
///
/// `(c, c, 0)` exists for every category; `(a, c, d)` exists for every
/// ancestor `a` of `c` at distance `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ClosureRow {
    pub ancestor_id: i64,
    pub descendant_id: i64,
    pub depth: i32,
}

impl ClosureRow {
    pub fn new(ancestor_id: i64, descendant_id: i64, depth: i32) -> Self {
        Self {
            ancestor_id,
            descendant_id,
            depth,
        }
    }

    /// The reflexive `(c, c, 0)` row
    pub fn is_self_reference(&self) -> bool {
        self.ancestor_id == self.descendant_id && self.depth == 0
    }
}

/// Category tree node returned by the tree endpoint
///
/// Count fields are only serialized when counts were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u64>,
}

impl CategoryNode {
    /// Total number of nodes in this subtree, self included
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }
}
