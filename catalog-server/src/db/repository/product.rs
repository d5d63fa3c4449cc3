//! Product Repository

use super::{RepoError, RepoResult};
use crate::catalog::closure::ClosureError;
use shared::models::{Product, ProductAttributeValue, ProductCreate};
use sqlx::SqlitePool;
use std::collections::HashMap;

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO product (name, sku, category_id) VALUES (?, ?, ?) RETURNING id, name, sku, category_id",
    )
    .bind(&data.name)
    .bind(&data.sku)
    .bind(data.category_id)
    .fetch_one(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Product SKU '{}' already exists", data.sku))
        }
        RepoError::Validation(_) => ClosureError::UnknownCategory(data.category_id).into(),
        other => other,
    })?;
    Ok(product)
}

/// Store a free-text value for one product attribute
pub async fn set_value(
    pool: &SqlitePool,
    product_id: i64,
    attribute_id: i64,
    value: &str,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO product_attribute_value (product_id, attribute_id, value) VALUES (?, ?, ?)",
    )
    .bind(product_id)
    .bind(attribute_id)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_values(pool: &SqlitePool, product_id: i64) -> RepoResult<Vec<ProductAttributeValue>> {
    let values = sqlx::query_as::<_, ProductAttributeValue>(
        "SELECT product_id, attribute_id, value, attribute_option_id FROM product_attribute_value WHERE product_id = ? ORDER BY attribute_id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(values)
}

/// category_id -> products in the category or below it, via the closure
pub async fn count_rolled_up(pool: &SqlitePool) -> RepoResult<HashMap<i64, u64>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT cc.ancestor_id, COUNT(p.id) \
         FROM category_closure cc \
         JOIN product p ON p.category_id = cc.descendant_id \
         GROUP BY cc.ancestor_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(category_id, count)| (category_id, count as u64))
        .collect())
}
