//! Category Closure Repository
//!
//! Reads hit one of the two closure indexes; writes run on the caller's
//! transaction so the category row and its closure rows commit together.

use super::{RepoResult, placeholders};
use crate::catalog::closure::ClosureError;
use shared::models::ClosureRow;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeSet;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<ClosureRow>> {
    let rows = sqlx::query_as::<_, ClosureRow>(
        "SELECT ancestor_id, descendant_id, depth FROM category_closure ORDER BY ancestor_id, descendant_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Union of the ancestors of `ids` (depth 0 included)
pub async fn ancestors_of(pool: &SqlitePool, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
    if ids.is_empty() {
        return Ok(BTreeSet::new());
    }
    let sql = format!(
        "SELECT DISTINCT ancestor_id FROM category_closure WHERE descendant_id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

/// Union of the descendants of `ids` (depth 0 included)
pub async fn descendants_of(pool: &SqlitePool, ids: &[i64]) -> RepoResult<BTreeSet<i64>> {
    if ids.is_empty() {
        return Ok(BTreeSet::new());
    }
    let sql = format!(
        "SELECT DISTINCT descendant_id FROM category_closure WHERE ancestor_id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

async fn has_self_row(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM category_closure WHERE ancestor_id = ?1 AND descendant_id = ?1 AND depth = 0",
    )
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(found > 0)
}

/// Add `(id, id, 0)` plus `(a, id, d + 1)` for every `(a, parent, d)`
pub async fn insert_node(
    conn: &mut SqliteConnection,
    id: i64,
    parent_id: Option<i64>,
) -> RepoResult<()> {
    if let Some(parent) = parent_id
        && !has_self_row(&mut *conn, parent).await?
    {
        return Err(ClosureError::UnknownCategory(parent).into());
    }

    sqlx::query("INSERT INTO category_closure (ancestor_id, descendant_id, depth) VALUES (?1, ?1, 0)")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if let Some(parent) = parent_id {
        sqlx::query(
            "INSERT INTO category_closure (ancestor_id, descendant_id, depth) \
             SELECT ancestor_id, ?1, depth + 1 FROM category_closure WHERE descendant_id = ?2",
        )
        .bind(id)
        .bind(parent)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Remove every row where `id` is ancestor or descendant
pub async fn remove_node(conn: &mut SqliteConnection, id: i64) -> RepoResult<u64> {
    let result =
        sqlx::query("DELETE FROM category_closure WHERE ancestor_id = ?1 OR descendant_id = ?1")
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

/// Re-link the subtree rooted at `id` under `new_parent`.
///
/// Intra-subtree rows are kept; rows to the old ancestors are replaced by
/// rows to the new parent's ancestors.
pub async fn move_subtree(
    conn: &mut SqliteConnection,
    id: i64,
    new_parent: Option<i64>,
) -> RepoResult<()> {
    if !has_self_row(&mut *conn, id).await? {
        return Err(ClosureError::UnknownCategory(id).into());
    }
    if let Some(parent) = new_parent {
        if !has_self_row(&mut *conn, parent).await? {
            return Err(ClosureError::UnknownCategory(parent).into());
        }
        let inside = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM category_closure WHERE ancestor_id = ? AND descendant_id = ?",
        )
        .bind(id)
        .bind(parent)
        .fetch_one(&mut *conn)
        .await?;
        if inside > 0 {
            return Err(ClosureError::Cycle {
                category: id,
                parent,
            }
            .into());
        }
    }

    sqlx::query(
        "DELETE FROM category_closure \
         WHERE descendant_id IN (SELECT descendant_id FROM category_closure WHERE ancestor_id = ?1) \
           AND ancestor_id NOT IN (SELECT descendant_id FROM category_closure WHERE ancestor_id = ?1)",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if let Some(parent) = new_parent {
        sqlx::query(
            "INSERT INTO category_closure (ancestor_id, descendant_id, depth) \
             SELECT anc.ancestor_id, sub.descendant_id, anc.depth + sub.depth + 1 \
             FROM category_closure AS anc \
             CROSS JOIN category_closure AS sub \
             WHERE anc.descendant_id = ?1 AND sub.ancestor_id = ?2",
        )
        .bind(parent)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Number of categories below `id`, self excluded
pub async fn count_descendants(conn: &mut SqliteConnection, id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM category_closure WHERE ancestor_id = ? AND depth > 0",
    )
    .bind(id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// Categories lacking the `(id, id, 0)` row
pub async fn find_missing_self_rows(pool: &SqlitePool) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT c.id FROM category c \
         LEFT JOIN category_closure cc ON cc.ancestor_id = c.id AND cc.descendant_id = c.id AND cc.depth = 0 \
         WHERE cc.ancestor_id IS NULL ORDER BY c.id",
    )
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
