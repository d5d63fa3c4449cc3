//! Query request types
//!
//! Raw query DTOs as they arrive from the transport, the typed filter the
//! catalog core consumes, and the paginated response envelope.

use crate::error::{AppError, ErrorCode};
use crate::models::LinkType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 200;
/// Upper bound on distinct `categoryIds` in one query
pub const MAX_CATEGORY_IDS: usize = 100;

/// Whitelisted attribute sort fields
///
/// Each variant maps to a fixed column, so caller text never reaches a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeSortBy {
    Id,
    #[default]
    Name,
    Key,
    CreatedAt,
    UpdatedAt,
}

impl AttributeSortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Key => "key",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    /// Column backing this sort field
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Key => "key",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for AttributeSortBy {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "key" => Ok(Self::Key),
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            other => Err(UsageError::InvalidSortBy(other.to_string())),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(UsageError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Caller-correctable misuse of the attribute query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("linkTypes require at least one categoryId")]
    LinkTypesRequireCategories,

    #[error("notApplicable requires at least one categoryId")]
    NotApplicableRequiresCategories,

    #[error("linkTypes cannot be used together with notApplicable=true")]
    LinkTypesWithNotApplicable,

    #[error("Invalid categoryIds: {}", join_ids(.0))]
    UnknownCategories(Vec<i64>),

    #[error("Invalid categoryId: {0}")]
    MalformedCategoryId(String),

    #[error("categoryIds accepts at most {MAX_CATEGORY_IDS} ids, got {0}")]
    TooManyCategories(usize),

    #[error("Invalid linkType: {0} (expected direct, inherited or global)")]
    InvalidLinkType(String),

    #[error("Invalid sortBy: {0} (expected id, name, key, createdAt or updatedAt)")]
    InvalidSortBy(String),

    #[error("Invalid sortOrder: {0} (expected asc or desc)")]
    InvalidSortOrder(String),

    #[error("limit must be between 1 and {MAX_LIMIT}, got {0}")]
    LimitOutOfRange(u32),

    #[error("page must be at least 1, got {0}")]
    PageOutOfRange(u32),
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<UsageError> for AppError {
    fn from(err: UsageError) -> Self {
        let message = err.to_string();
        match err {
            UsageError::UnknownCategories(ids) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("categoryIds", ids)
            }
            UsageError::MalformedCategoryId(value) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("categoryIds", value)
            }
            UsageError::InvalidLinkType(value) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("linkTypes", value)
            }
            UsageError::InvalidSortBy(value) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("sortBy", value)
            }
            UsageError::InvalidSortOrder(value) => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
                    .with_detail("sortOrder", value)
            }
            UsageError::TooManyCategories(count) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
                    .with_detail("categoryIds", count)
            }
            UsageError::LimitOutOfRange(limit) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
                    .with_detail("limit", limit)
            }
            UsageError::PageOutOfRange(page) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, message)
                    .with_detail("page", page)
            }
            UsageError::LinkTypesRequireCategories
            | UsageError::NotApplicableRequiresCategories
            | UsageError::LinkTypesWithNotApplicable => {
                AppError::with_message(ErrorCode::ValidationFailed, message)
            }
        }
    }
}

/// Raw attribute query as received on `GET /api/attributes`
///
/// List parameters may repeat their key (`categoryIds=1&categoryIds=2`),
/// carry comma separated values (`categoryIds=1,2`), or mix both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeQuery {
    #[serde(default)]
    pub category_ids: Vec<String>,
    pub keyword: Option<String>,
    #[serde(default)]
    pub link_types: Vec<String>,
    pub not_applicable: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Typed attribute filter
///
/// Combination rules (categories required for link types, exclusivity of
/// `not_applicable`) and the page/limit domain are checked by the catalog
/// core, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilter {
    pub category_ids: Option<Vec<i64>>,
    pub keyword: Option<String>,
    pub link_types: Option<Vec<LinkType>>,
    pub not_applicable: Option<bool>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: AttributeSortBy,
    pub sort_order: SortOrder,
}

impl Default for AttributeFilter {
    fn default() -> Self {
        Self {
            category_ids: None,
            keyword: None,
            link_types: None,
            not_applicable: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: AttributeSortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl AttributeFilter {
    pub fn for_categories(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            category_ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn link_types(mut self, link_types: impl IntoIterator<Item = LinkType>) -> Self {
        self.link_types = Some(link_types.into_iter().collect());
        self
    }

    pub fn not_applicable(mut self, not_applicable: bool) -> Self {
        self.not_applicable = Some(not_applicable);
        self
    }

    pub fn paginate(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    pub fn order_by(mut self, sort_by: AttributeSortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

/// Every comma separated item across all values of a repeated key
fn split_list(values: &[String]) -> impl Iterator<Item = &str> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl TryFrom<AttributeQuery> for AttributeFilter {
    type Error = UsageError;

    /// A key that appears at all yields `Some`, even when every value is blank.
    fn try_from(query: AttributeQuery) -> Result<Self, Self::Error> {
        let category_ids = if query.category_ids.is_empty() {
            None
        } else {
            let ids = split_list(&query.category_ids)
                .map(|s| {
                    s.parse::<i64>()
                        .map_err(|_| UsageError::MalformedCategoryId(s.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(ids)
        };

        let link_types = if query.link_types.is_empty() {
            None
        } else {
            let types = split_list(&query.link_types)
                .map(|s| s.parse::<LinkType>().map_err(UsageError::InvalidLinkType))
                .collect::<Result<Vec<_>, _>>()?;
            Some(types)
        };

        let sort_by = query
            .sort_by
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        let sort_order = query
            .sort_order
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            category_ids,
            keyword: query.keyword,
            link_types,
            not_applicable: query.not_applicable,
            page: query.page.unwrap_or(DEFAULT_PAGE),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
            sort_by,
            sort_order,
        })
    }
}

/// Raw category tree query
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTreeQuery {
    #[serde(default)]
    pub include_counts: bool,
}

/// Paginated response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Page rows
    pub data: Vec<T>,
    /// Rows matching the filter before pagination
    pub total: u64,
    /// Current page (1-based)
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Number of pages
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            total.div_ceil(limit as u64) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl fmt::Display for AttributeSortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let filter = AttributeFilter::try_from(AttributeQuery::default()).unwrap();
        assert_eq!(filter, AttributeFilter::default());
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 20);
        assert_eq!(filter.sort_by, AttributeSortBy::Name);
        assert_eq!(filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_query_parses_lists() {
        let query = AttributeQuery {
            category_ids: vec!["5, 7,".into()],
            link_types: vec!["direct,global".into()],
            sort_by: Some("createdAt".into()),
            sort_order: Some("desc".into()),
            ..Default::default()
        };
        let filter = AttributeFilter::try_from(query).unwrap();
        assert_eq!(filter.category_ids, Some(vec![5, 7]));
        assert_eq!(
            filter.link_types,
            Some(vec![LinkType::Direct, LinkType::Global])
        );
        assert_eq!(filter.sort_by, AttributeSortBy::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_query_merges_repeated_and_comma_separated_values() {
        let query = AttributeQuery {
            category_ids: vec!["1".into(), "5,6".into(), " 7 ".into()],
            link_types: vec!["direct".into(), "inherited, global".into()],
            ..Default::default()
        };
        let filter = AttributeFilter::try_from(query).unwrap();
        assert_eq!(filter.category_ids, Some(vec![1, 5, 6, 7]));
        assert_eq!(
            filter.link_types,
            Some(vec![LinkType::Direct, LinkType::Inherited, LinkType::Global])
        );
    }

    #[test]
    fn test_query_keeps_present_but_blank_lists() {
        let query = AttributeQuery {
            link_types: vec!["".into()],
            ..Default::default()
        };
        let filter = AttributeFilter::try_from(query).unwrap();
        assert_eq!(filter.link_types, Some(vec![]));
        assert_eq!(filter.category_ids, None);
    }

    #[test]
    fn test_query_rejects_unlisted_sort_field() {
        let query = AttributeQuery {
            sort_by: Some("name; DROP TABLE attribute".into()),
            ..Default::default()
        };
        assert_eq!(
            AttributeFilter::try_from(query),
            Err(UsageError::InvalidSortBy(
                "name; DROP TABLE attribute".into()
            ))
        );
    }

    #[test]
    fn test_query_rejects_bad_order_and_link_type() {
        let query = AttributeQuery {
            sort_order: Some("ASC".into()),
            ..Default::default()
        };
        assert_eq!(
            AttributeFilter::try_from(query),
            Err(UsageError::InvalidSortOrder("ASC".into()))
        );

        let query = AttributeQuery {
            link_types: vec!["direct,sideways".into()],
            ..Default::default()
        };
        assert_eq!(
            AttributeFilter::try_from(query),
            Err(UsageError::InvalidLinkType("sideways".into()))
        );
    }

    #[test]
    fn test_query_rejects_malformed_id() {
        let query = AttributeQuery {
            category_ids: vec!["1".into(), "abc".into()],
            ..Default::default()
        };
        assert_eq!(
            AttributeFilter::try_from(query),
            Err(UsageError::MalformedCategoryId("abc".into()))
        );
    }

    #[test]
    fn test_unknown_categories_message_lists_ids() {
        let err = UsageError::UnknownCategories(vec![99, 100]);
        assert_eq!(err.to_string(), "Invalid categoryIds: 99, 100");
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);
        assert_eq!(
            app.details.unwrap().get("categoryIds").unwrap(),
            &serde_json::json!([99, 100])
        );
    }

    #[test]
    fn test_limit_error_maps_to_out_of_range() {
        let app: AppError = UsageError::LimitOutOfRange(201).into();
        assert_eq!(app.code, ErrorCode::ValueOutOfRange);
        assert_eq!(app.message, "limit must be between 1 and 200, got 201");
    }

    #[test]
    fn test_too_many_categories_maps_to_out_of_range() {
        let app: AppError = UsageError::TooManyCategories(101).into();
        assert_eq!(app.code, ErrorCode::ValueOutOfRange);
        assert_eq!(app.message, "categoryIds accepts at most 100 ids, got 101");
    }

    #[test]
    fn test_paginated_response_total_pages() {
        let page = PaginatedResponse::new(vec![1, 2], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty = PaginatedResponse::<i32>::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_paginated_response_camel_case() {
        let page = PaginatedResponse::new(vec!["a"], 1, 1, 20);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 1);
    }

    #[test]
    fn test_sort_column_mapping() {
        assert_eq!(AttributeSortBy::CreatedAt.column(), "created_at");
        assert_eq!(AttributeSortBy::Key.column(), "key");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }
}
