//! Category Repository

use super::{RepoError, RepoResult, closure, placeholders};
use crate::catalog::closure::ClosureError;
use shared::models::{Category, CategoryCreate};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, key, parent_id FROM category ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, key, parent_id FROM category WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

/// Subset of `ids` present in the table
pub async fn existing_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
    if ids.is_empty() {
        return Ok(BTreeSet::new());
    }
    let sql = format!(
        "SELECT id FROM category WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

/// Insert a category and its closure rows in one transaction
pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO category (name, key, parent_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.key)
    .bind(data.parent_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Category key '{}' already exists", data.key))
        }
        RepoError::Validation(_) => match data.parent_id {
            Some(parent) => ClosureError::UnknownCategory(parent).into(),
            None => RepoError::Validation("Invalid category".into()),
        },
        other => other,
    })?;

    closure::insert_node(&mut tx, id, data.parent_id).await?;

    tx.commit().await?;

    tracing::debug!(category_id = id, parent_id = ?data.parent_id, "Category created");
    Ok(Category {
        id,
        name: data.name,
        key: data.key,
        parent_id: data.parent_id,
    })
}

/// Re-parent a category with its subtree in one transaction
pub async fn move_to(
    pool: &SqlitePool,
    id: i64,
    new_parent: Option<i64>,
) -> RepoResult<Category> {
    let mut tx = pool.begin().await?;

    closure::move_subtree(&mut tx, id, new_parent).await?;

    let rows = sqlx::query("UPDATE category SET parent_id = ? WHERE id = ?")
        .bind(new_parent)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(ClosureError::UnknownCategory(id).into());
    }

    tx.commit().await?;

    tracing::debug!(category_id = id, parent_id = ?new_parent, "Category moved");
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| ClosureError::UnknownCategory(id).into())
}

/// Delete a leaf category, its closure rows and attribute links
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    if closure::count_descendants(&mut tx, id).await? > 0 {
        return Err(ClosureError::HasChildren(id).into());
    }
    let products = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product WHERE category_id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if products > 0 {
        return Err(RepoError::Validation(format!(
            "Category {id} still has products"
        )));
    }

    closure::remove_node(&mut tx, id).await?;
    sqlx::query("DELETE FROM category_attribute WHERE category_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let rows = sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(ClosureError::UnknownCategory(id).into());
    }

    tx.commit().await?;
    tracing::debug!(category_id = id, "Category deleted");
    Ok(())
}
