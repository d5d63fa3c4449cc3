//! Attribute query planning, filtering, ordering and pagination
//!
//! Everything here is pure; the service feeds it store data.

use shared::models::{Attribute, AttributeView, LinkType};
use shared::query::{
    AttributeFilter, AttributeSortBy, MAX_CATEGORY_IDS, MAX_LIMIT, PaginatedResponse, SortOrder,
};
use shared::UsageError;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::classifier::{Classification, LinkClassifier};

/// Which classifications a category-scoped query keeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSelection {
    /// Global, direct and inherited
    Applicable,
    /// Only attributes that do not apply
    NotApplicable,
    /// Only the listed link types
    Only(BTreeSet<LinkType>),
}

impl LinkSelection {
    pub fn keeps(&self, classification: Classification) -> bool {
        match (self, classification.link_type()) {
            (Self::Applicable, link) => link.is_some(),
            (Self::NotApplicable, link) => link.is_none(),
            (Self::Only(types), Some(link)) => types.contains(&link),
            (Self::Only(_), None) => false,
        }
    }
}

/// Validated attribute query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Deduplicated category IDs in input order, `None` for an unscoped query
    pub category_ids: Option<Vec<i64>>,
    pub selection: LinkSelection,
    /// Trimmed and lowercased; `None` when blank
    pub keyword: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: AttributeSortBy,
    pub sort_order: SortOrder,
}

impl QueryPlan {
    /// Check the filter's combination rules and parameter domains.
    ///
    /// Category existence is not checked here; it needs the store.
    pub fn new(filter: &AttributeFilter) -> Result<Self, UsageError> {
        if filter.limit == 0 || filter.limit > MAX_LIMIT {
            return Err(UsageError::LimitOutOfRange(filter.limit));
        }
        if filter.page == 0 {
            return Err(UsageError::PageOutOfRange(filter.page));
        }

        let category_ids = filter
            .category_ids
            .as_ref()
            .filter(|ids| !ids.is_empty())
            .map(|ids| {
                let mut seen = BTreeSet::new();
                ids.iter()
                    .copied()
                    .filter(|id| seen.insert(*id))
                    .collect::<Vec<_>>()
            });
        if let Some(ids) = &category_ids
            && ids.len() > MAX_CATEGORY_IDS
        {
            return Err(UsageError::TooManyCategories(ids.len()));
        }

        // A present link type list needs categories even when it is empty
        if category_ids.is_none() && filter.link_types.is_some() {
            return Err(UsageError::LinkTypesRequireCategories);
        }
        let link_types: Option<BTreeSet<LinkType>> = filter
            .link_types
            .as_ref()
            .filter(|types| !types.is_empty())
            .map(|types| types.iter().copied().collect());
        let not_applicable = filter.not_applicable.unwrap_or(false);

        let selection = match (&category_ids, link_types, not_applicable) {
            (None, _, true) => return Err(UsageError::NotApplicableRequiresCategories),
            (Some(_), Some(_), true) => return Err(UsageError::LinkTypesWithNotApplicable),
            (Some(_), Some(types), false) => LinkSelection::Only(types),
            (Some(_), None, true) => LinkSelection::NotApplicable,
            (_, _, false) => LinkSelection::Applicable,
        };

        let keyword = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            category_ids,
            selection,
            keyword,
            page: filter.page,
            limit: filter.limit,
            sort_by: filter.sort_by,
            sort_order: filter.sort_order,
        })
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Case-insensitive substring match on name or key
    pub fn matches_keyword(&self, attribute: &Attribute) -> bool {
        match &self.keyword {
            None => true,
            Some(keyword) => {
                attribute.name.to_lowercase().contains(keyword)
                    || attribute.key.to_lowercase().contains(keyword)
            }
        }
    }

    /// Filter, classify, order and paginate the attribute catalog.
    ///
    /// `classifier` must be present exactly when the plan is category-scoped.
    pub fn execute(
        &self,
        attributes: Vec<Attribute>,
        classifier: Option<&LinkClassifier<'_>>,
    ) -> PaginatedResponse<AttributeView> {
        let mut rows: Vec<(Attribute, Option<LinkType>)> = attributes
            .into_iter()
            .filter(|attribute| self.matches_keyword(attribute))
            .filter_map(|attribute| match classifier {
                None => Some((attribute, None)),
                Some(classifier) => {
                    let classification = classifier.classify(attribute.id);
                    self.selection
                        .keeps(classification)
                        .then(|| (attribute, classification.link_type()))
                }
            })
            .collect();

        rows.sort_by(|(a, _), (b, _)| compare(a, b, self.sort_by, self.sort_order));

        let total = rows.len() as u64;
        let data = rows
            .into_iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .map(|(attribute, link)| AttributeView::new(&attribute, link))
            .collect();

        PaginatedResponse::new(data, total, self.page, self.limit)
    }
}

/// Order by the whitelisted field, ties broken by ascending id
pub fn compare(a: &Attribute, b: &Attribute, sort_by: AttributeSortBy, order: SortOrder) -> Ordering {
    let primary = match sort_by {
        AttributeSortBy::Id => a.id.cmp(&b.id),
        AttributeSortBy::Name => a.name.cmp(&b.name),
        AttributeSortBy::Key => a.key.cmp(&b.key),
        AttributeSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
        AttributeSortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{AttributeType, CategoryAttribute};

    use crate::catalog::classifier::TargetSet;

    fn attr(id: i64, key: &str, name: &str, created_at: i64) -> Attribute {
        Attribute {
            id,
            key: key.into(),
            name: name.into(),
            attr_type: AttributeType::ShortText,
            created_at,
            updated_at: created_at,
        }
    }

    fn catalog() -> Vec<Attribute> {
        vec![
            attr(1, "brand", "Brand", 100),
            attr(2, "model", "Model", 100),
            attr(3, "os_version", "OS Version", 300),
            attr(4, "gpu_model", "GPU Model", 200),
        ]
    }

    #[test]
    fn test_plan_combination_rules() {
        let only_links = AttributeFilter::default().link_types([LinkType::Direct]);
        assert_eq!(
            QueryPlan::new(&only_links),
            Err(UsageError::LinkTypesRequireCategories)
        );

        let only_na = AttributeFilter::default().not_applicable(true);
        assert_eq!(
            QueryPlan::new(&only_na),
            Err(UsageError::NotApplicableRequiresCategories)
        );

        let both = AttributeFilter::for_categories([5])
            .link_types(LinkType::ALL)
            .not_applicable(true);
        assert_eq!(
            QueryPlan::new(&both),
            Err(UsageError::LinkTypesWithNotApplicable)
        );
    }

    #[test]
    fn test_plan_normalizes_empty_lists() {
        let filter = AttributeFilter {
            category_ids: Some(vec![]),
            not_applicable: Some(false),
            ..Default::default()
        };
        let plan = QueryPlan::new(&filter).unwrap();
        assert_eq!(plan.category_ids, None);
        assert_eq!(plan.selection, LinkSelection::Applicable);

        let scoped = AttributeFilter {
            link_types: Some(vec![]),
            ..AttributeFilter::for_categories([5])
        };
        assert_eq!(
            QueryPlan::new(&scoped).unwrap().selection,
            LinkSelection::Applicable
        );
    }

    #[test]
    fn test_plan_rejects_blank_link_types_without_categories() {
        let filter = AttributeFilter {
            link_types: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            QueryPlan::new(&filter),
            Err(UsageError::LinkTypesRequireCategories)
        );

        let filter = AttributeFilter {
            category_ids: Some(vec![]),
            link_types: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            QueryPlan::new(&filter),
            Err(UsageError::LinkTypesRequireCategories)
        );
    }

    #[test]
    fn test_plan_caps_distinct_category_ids() {
        let at_cap = AttributeFilter::for_categories(1..=MAX_CATEGORY_IDS as i64);
        assert!(QueryPlan::new(&at_cap).is_ok());

        // Duplicates collapse before the cap applies
        let repeated =
            AttributeFilter::for_categories((1..=MAX_CATEGORY_IDS as i64).chain(1..=50));
        assert!(QueryPlan::new(&repeated).is_ok());

        let over = AttributeFilter::for_categories(1..=(MAX_CATEGORY_IDS as i64 + 1));
        assert_eq!(
            QueryPlan::new(&over),
            Err(UsageError::TooManyCategories(MAX_CATEGORY_IDS + 1))
        );
    }

    #[test]
    fn test_plan_dedups_category_ids_in_input_order() {
        let plan = QueryPlan::new(&AttributeFilter::for_categories([7, 5, 7, 6, 5])).unwrap();
        assert_eq!(plan.category_ids, Some(vec![7, 5, 6]));
    }

    #[test]
    fn test_plan_limit_and_page_domain() {
        let over = AttributeFilter::default().paginate(1, 201);
        assert_eq!(QueryPlan::new(&over), Err(UsageError::LimitOutOfRange(201)));
        let zero = AttributeFilter::default().paginate(1, 0);
        assert_eq!(QueryPlan::new(&zero), Err(UsageError::LimitOutOfRange(0)));
        let page = AttributeFilter::default().paginate(0, 20);
        assert_eq!(QueryPlan::new(&page), Err(UsageError::PageOutOfRange(0)));

        let max = AttributeFilter::default().paginate(3, 200);
        assert_eq!(QueryPlan::new(&max).unwrap().offset(), 400);
    }

    #[test]
    fn test_keyword_is_trimmed_and_case_insensitive() {
        let plan = QueryPlan::new(&AttributeFilter::default().keyword("  MoDeL ")).unwrap();
        let result = plan.execute(catalog(), None);
        let keys: Vec<_> = result.data.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["gpu_model", "model"]);
        assert!(result.data.iter().all(|a| a.link_type.is_none()));

        let blank = QueryPlan::new(&AttributeFilter::default().keyword("   ")).unwrap();
        assert_eq!(blank.keyword, None);
        assert_eq!(blank.execute(catalog(), None).total, 4);
    }

    #[test]
    fn test_sort_desc_keeps_ascending_id_tiebreak() {
        let plan = QueryPlan::new(
            &AttributeFilter::default().order_by(AttributeSortBy::CreatedAt, SortOrder::Desc),
        )
        .unwrap();
        let ids: Vec<_> = plan.execute(catalog(), None).data.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_pagination_past_end() {
        let plan = QueryPlan::new(&AttributeFilter::default().paginate(3, 2)).unwrap();
        let page = plan.execute(catalog(), None);
        assert!(page.data.is_empty());
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_scoped_selection_modes() {
        let links = vec![
            CategoryAttribute {
                category_id: 1,
                attribute_id: 2,
            },
            CategoryAttribute {
                category_id: 5,
                attribute_id: 3,
            },
            CategoryAttribute {
                category_id: 6,
                attribute_id: 4,
            },
        ];
        let targets = TargetSet::new([5]).unwrap();
        let ancestors = BTreeSet::from([1, 2, 5]);
        let classifier = LinkClassifier::new(&targets, &ancestors, &links);

        let default = QueryPlan::new(&AttributeFilter::for_categories([5])).unwrap();
        let page = default.execute(catalog(), Some(&classifier));
        let got: Vec<_> = page.data.iter().map(|a| (a.key.as_str(), a.link_type)).collect();
        assert_eq!(
            got,
            vec![
                ("brand", Some(LinkType::Global)),
                ("model", Some(LinkType::Inherited)),
                ("os_version", Some(LinkType::Direct)),
            ]
        );

        let na = QueryPlan::new(&AttributeFilter::for_categories([5]).not_applicable(true)).unwrap();
        let page = na.execute(catalog(), Some(&classifier));
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].key, "gpu_model");
        assert_eq!(page.data[0].link_type, None);

        let only = QueryPlan::new(
            &AttributeFilter::for_categories([5]).link_types([LinkType::Global, LinkType::Direct]),
        )
        .unwrap();
        let page = only.execute(catalog(), Some(&classifier));
        let keys: Vec<_> = page.data.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["brand", "os_version"]);
    }
}
