//! Category API Handlers

use axum::extract::{Query, State, rejection::QueryRejection};
use shared::models::CategoryNode;
use shared::query::CategoryTreeQuery;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ok};

/// GET /api/categories/tree - category forest, `?includeCounts=true` for counts
pub async fn tree(
    State(state): State<ServerState>,
    query: Result<Query<CategoryTreeQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Vec<CategoryNode>>> {
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let tree = state
        .catalog
        .resolve_category_tree(query.include_counts)
        .await?;
    Ok(ok(tree))
}
