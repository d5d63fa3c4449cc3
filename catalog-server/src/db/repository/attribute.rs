//! Attribute Repository
//!
//! Attributes, their options and direct category links.

use super::{RepoError, RepoResult};
use crate::catalog::query::{LinkSelection, QueryPlan};
use shared::models::{
    Attribute, AttributeCreate, AttributeOption, AttributeType, CategoryAttribute, LinkType,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
struct AttributeRow {
    id: i64,
    key: String,
    name: String,
    #[sqlx(rename = "type")]
    attr_type: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AttributeRow> for Attribute {
    type Error = RepoError;

    fn try_from(row: AttributeRow) -> Result<Self, Self::Error> {
        let attr_type = row.attr_type.parse::<AttributeType>().map_err(|t| {
            RepoError::Database(format!("Attribute {} has unknown type '{t}'", row.id))
        })?;
        Ok(Attribute {
            id: row.id,
            key: row.key,
            name: row.name,
            attr_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Attribute>> {
    let rows = sqlx::query_as::<_, AttributeRow>(
        "SELECT id, key, name, type, created_at, updated_at FROM attribute ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Attribute::try_from).collect()
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Attribute>> {
    let row = sqlx::query_as::<_, AttributeRow>(
        "SELECT id, key, name, type, created_at, updated_at FROM attribute WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(Attribute::try_from).transpose()
}

pub async fn create(pool: &SqlitePool, data: AttributeCreate, now: i64) -> RepoResult<Attribute> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO attribute (key, name, type, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4) RETURNING id",
    )
    .bind(&data.key)
    .bind(&data.name)
    .bind(data.attr_type.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Attribute key '{}' already exists", data.key))
        }
        other => other,
    })?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create attribute".into()))
}

pub async fn add_option(pool: &SqlitePool, attribute_id: i64, value: &str) -> RepoResult<AttributeOption> {
    let option = sqlx::query_as::<_, AttributeOption>(
        "INSERT INTO attribute_option (attribute_id, value) VALUES (?, ?) RETURNING id, attribute_id, value",
    )
    .bind(attribute_id)
    .bind(value)
    .fetch_one(pool)
    .await?;
    Ok(option)
}

pub async fn find_options(pool: &SqlitePool, attribute_id: i64) -> RepoResult<Vec<AttributeOption>> {
    let options = sqlx::query_as::<_, AttributeOption>(
        "SELECT id, attribute_id, value FROM attribute_option WHERE attribute_id = ? ORDER BY id",
    )
    .bind(attribute_id)
    .fetch_all(pool)
    .await?;
    Ok(options)
}

/// Link an attribute directly to a category
pub async fn link(pool: &SqlitePool, category_id: i64, attribute_id: i64) -> RepoResult<()> {
    sqlx::query("INSERT INTO category_attribute (category_id, attribute_id) VALUES (?, ?)")
        .bind(category_id)
        .bind(attribute_id)
        .execute(pool)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => RepoError::Duplicate(format!(
                "Attribute {attribute_id} is already linked to category {category_id}"
            )),
            RepoError::Validation(_) => RepoError::Validation(format!(
                "Category {category_id} or attribute {attribute_id} does not exist"
            )),
            other => other,
        })?;
    Ok(())
}

pub async fn find_links(pool: &SqlitePool) -> RepoResult<Vec<CategoryAttribute>> {
    let links = sqlx::query_as::<_, CategoryAttribute>(
        "SELECT category_id, attribute_id FROM category_attribute ORDER BY category_id, attribute_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(links)
}

/// category_id -> direct link count
pub async fn count_links_by_category(pool: &SqlitePool) -> RepoResult<HashMap<i64, u64>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT category_id, COUNT(*) FROM category_attribute GROUP BY category_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(category_id, count)| (category_id, count as u64))
        .collect())
}

#[derive(sqlx::FromRow)]
struct ClassifiedRow {
    #[sqlx(flatten)]
    attribute: AttributeRow,
    link_type: Option<String>,
}

/// Classify every attribute against the targets in SQL.
///
/// Mirrors `LinkClassifier`: global when unlinked, then direct, then
/// inherited through a strict closure ancestor, else NULL.
const CLASSIFIED: &str = "\
classified AS (
    SELECT a.id, a.key, a.name, a.type, a.created_at, a.updated_at,
        CASE
            WHEN NOT EXISTS (
                SELECT 1 FROM category_attribute ca WHERE ca.attribute_id = a.id
            ) THEN 'global'
            WHEN EXISTS (
                SELECT 1 FROM category_attribute ca
                WHERE ca.attribute_id = a.id
                  AND ca.category_id IN (SELECT id FROM target)
            ) THEN 'direct'
            WHEN EXISTS (
                SELECT 1 FROM category_attribute ca
                JOIN category_closure cc ON cc.ancestor_id = ca.category_id
                WHERE ca.attribute_id = a.id
                  AND cc.depth > 0
                  AND cc.descendant_id IN (SELECT id FROM target)
            ) THEN 'inherited'
        END AS link_type
    FROM attribute a
)";

/// `WITH ... SELECT {columns} FROM classified WHERE ...` for `plan`
fn filtered<'a>(plan: &'a QueryPlan, columns: &str) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new("WITH ");
    match &plan.category_ids {
        Some(ids) => {
            builder.push("target(id) AS (VALUES ");
            let mut values = builder.separated(", ");
            for id in ids {
                values.push("(").push_bind_unseparated(*id).push_unseparated(")");
            }
            builder.push("), ").push(CLASSIFIED);
        }
        None => {
            builder.push(
                "classified AS (SELECT id, key, name, type, created_at, updated_at, \
                 NULL AS link_type FROM attribute)",
            );
        }
    }

    builder.push(" SELECT ").push(columns).push(" FROM classified WHERE 1=1");

    if plan.category_ids.is_some() {
        match &plan.selection {
            LinkSelection::Applicable => {
                builder.push(" AND link_type IS NOT NULL");
            }
            LinkSelection::NotApplicable => {
                builder.push(" AND link_type IS NULL");
            }
            LinkSelection::Only(types) => {
                builder.push(" AND link_type IN (");
                let mut values = builder.separated(", ");
                for link in types {
                    values.push_bind(link.as_str());
                }
                builder.push(")");
            }
        }
    }

    if let Some(keyword) = &plan.keyword {
        builder
            .push(" AND (instr(lower(name), ")
            .push_bind(keyword.as_str())
            .push(") > 0 OR instr(lower(key), ")
            .push_bind(keyword.as_str())
            .push(") > 0)");
    }
    builder
}

/// One classified page for `plan` plus the number of rows matching its filter.
///
/// Ordering uses the whitelisted column with ascending id as tie-break.
/// Keyword case folding is SQLite's `lower()`, which only folds ASCII.
pub async fn query_page(
    pool: &SqlitePool,
    plan: &QueryPlan,
) -> RepoResult<(Vec<(Attribute, Option<LinkType>)>, u64)> {
    let mut count = filtered(plan, "COUNT(*)");
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut builder = filtered(plan, "id, key, name, type, created_at, updated_at, link_type");
    builder
        .push(" ORDER BY ")
        .push(plan.sort_by.column())
        .push(" ")
        .push(plan.sort_order.as_sql())
        .push(", id ASC LIMIT ")
        .push_bind(plan.limit as i64)
        .push(" OFFSET ")
        .push_bind(plan.offset() as i64);
    let rows = builder
        .build_query_as::<ClassifiedRow>()
        .fetch_all(pool)
        .await?;

    let page = rows
        .into_iter()
        .map(|row| {
            let link_type = row
                .link_type
                .map(|t| {
                    t.parse::<LinkType>().map_err(|t| {
                        RepoError::Database(format!("Unknown link type '{t}' in classification"))
                    })
                })
                .transpose()?;
            Ok((Attribute::try_from(row.attribute)?, link_type))
        })
        .collect::<RepoResult<Vec<_>>>()?;

    Ok((page, total as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::db::DbService;
    use shared::query::{AttributeFilter, AttributeSortBy, SortOrder};

    async fn pool() -> SqlitePool {
        let db = DbService::in_memory().await.unwrap();
        fixtures::seed_sqlite(&db.pool).await.unwrap();
        db.pool
    }

    async fn keys(
        pool: &SqlitePool,
        filter: AttributeFilter,
    ) -> (Vec<(String, Option<LinkType>)>, u64) {
        let plan = QueryPlan::new(&filter).unwrap();
        let (rows, total) = query_page(pool, &plan).await.unwrap();
        let rows = rows.into_iter().map(|(a, link)| (a.key, link)).collect();
        (rows, total)
    }

    #[tokio::test]
    async fn test_query_page_classifies_in_sql() {
        let pool = pool().await;
        let filter = AttributeFilter::for_categories([fixtures::GAMING_LAPTOPS]);
        let (rows, total) = keys(&pool, filter).await;
        assert_eq!(total, 7);
        assert_eq!(
            rows,
            vec![
                ("brand".to_string(), Some(LinkType::Global)),
                ("cpu_model".to_string(), Some(LinkType::Inherited)),
                ("gpu_model".to_string(), Some(LinkType::Direct)),
                ("model".to_string(), Some(LinkType::Inherited)),
                ("ram_size".to_string(), Some(LinkType::Inherited)),
                ("storage_type".to_string(), Some(LinkType::Inherited)),
                ("warranty_period".to_string(), Some(LinkType::Inherited)),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_page_not_applicable_and_link_filter() {
        let pool = pool().await;
        let (rows, total) = keys(
            &pool,
            AttributeFilter::for_categories([fixtures::IPHONES]).not_applicable(true),
        )
        .await;
        assert_eq!(total, 4);
        assert!(rows.iter().all(|(_, link)| link.is_none()));

        let (rows, _) = keys(
            &pool,
            AttributeFilter::for_categories([fixtures::IPHONES, fixtures::LAPTOPS])
                .link_types([LinkType::Direct]),
        )
        .await;
        let got: Vec<_> = rows.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(got, vec!["cpu_model", "ram_size", "storage_type"]);
    }

    #[tokio::test]
    async fn test_query_page_keyword_order_and_window() {
        let pool = pool().await;
        let (rows, total) = keys(
            &pool,
            AttributeFilter::default()
                .keyword("  MODEL ")
                .order_by(AttributeSortBy::Key, SortOrder::Desc)
                .paginate(1, 2),
        )
        .await;
        assert_eq!(total, 3);
        assert_eq!(
            rows,
            vec![("model".to_string(), None), ("gpu_model".to_string(), None)]
        );

        let (rows, total) = keys(&pool, AttributeFilter::default().paginate(4, 3)).await;
        assert_eq!(total, 10);
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_query_page_keyword_is_literal() {
        let pool = pool().await;
        let (rows, total) = keys(&pool, AttributeFilter::default().keyword("%")).await;
        assert!(rows.is_empty());
        assert_eq!(total, 0);

        let (_, total) = keys(&pool, AttributeFilter::default().keyword("_size")).await;
        assert_eq!(total, 1);
    }
}
