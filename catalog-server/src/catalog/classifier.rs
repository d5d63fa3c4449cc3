//! Attribute link classification
//!
//! Decides how each attribute relates to a set of target categories. Rules
//! are evaluated in a fixed order and the first match wins:
//!
//! 1. `Global`: the attribute has no category link anywhere
//! 2. `Direct`: linked to one of the targets
//! 3. `Inherited`: linked to a strict ancestor of one of the targets
//! 4. `NotApplicable`: otherwise

use shared::models::{CategoryAttribute, LinkType};
use std::collections::{BTreeSet, HashMap};

use super::error::{CatalogError, CatalogResult};

/// Non-empty set of target category IDs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet(BTreeSet<i64>);

impl TargetSet {
    /// Fails when `ids` is empty
    pub fn new(ids: impl IntoIterator<Item = i64>) -> CatalogResult<Self> {
        let ids: BTreeSet<i64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(CatalogError::Integrity(
                "classification requires at least one target category".into(),
            ));
        }
        Ok(Self(ids))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.0.iter().copied().collect()
    }
}

/// Outcome of classifying one attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Global,
    Direct,
    Inherited,
    NotApplicable,
}

impl Classification {
    /// Link type reported to callers; `None` for not-applicable
    pub fn link_type(&self) -> Option<LinkType> {
        match self {
            Self::Global => Some(LinkType::Global),
            Self::Direct => Some(LinkType::Direct),
            Self::Inherited => Some(LinkType::Inherited),
            Self::NotApplicable => None,
        }
    }
}

/// Classifies attributes against one target set
///
/// Built once per query from the full link list and the union of the
/// targets' ancestors (as returned by the closure, self rows included).
pub struct LinkClassifier<'a> {
    targets: &'a TargetSet,
    strict_ancestors: BTreeSet<i64>,
    links: HashMap<i64, Vec<i64>>,
}

impl<'a> LinkClassifier<'a> {
    pub fn new(
        targets: &'a TargetSet,
        ancestors: &BTreeSet<i64>,
        links: &[CategoryAttribute],
    ) -> Self {
        let strict_ancestors = ancestors
            .iter()
            .copied()
            .filter(|id| !targets.contains(*id))
            .collect();

        let mut by_attribute: HashMap<i64, Vec<i64>> = HashMap::new();
        for link in links {
            by_attribute
                .entry(link.attribute_id)
                .or_default()
                .push(link.category_id);
        }

        Self {
            targets,
            strict_ancestors,
            links: by_attribute,
        }
    }

    pub fn classify(&self, attribute_id: i64) -> Classification {
        let Some(categories) = self.links.get(&attribute_id) else {
            return Classification::Global;
        };

        if categories.iter().any(|id| self.targets.contains(*id)) {
            Classification::Direct
        } else if categories
            .iter()
            .any(|id| self.strict_ancestors.contains(id))
        {
            Classification::Inherited
        } else {
            Classification::NotApplicable
        }
    }
}
