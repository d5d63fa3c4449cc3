//! Attribute API Handlers

use axum::extract::State;
use axum_extra::extract::{Query, QueryRejection};
use shared::models::AttributeView;
use shared::query::{AttributeFilter, AttributeQuery, PaginatedResponse};

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ok};

/// GET /api/attributes - attributes classified against `categoryIds`
///
/// List parameters repeat their key, carry comma separated values, or both:
/// `?categoryIds=5,6&linkTypes=direct&linkTypes=global`.
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<AttributeQuery>, QueryRejection>,
) -> AppResult<ApiResponse<PaginatedResponse<AttributeView>>> {
    let Query(query) = query.map_err(|e| AppError::validation(e.to_string()))?;
    let filter = AttributeFilter::try_from(query)?;
    let page = state.catalog.query_attributes(&filter).await?;
    Ok(ok(page))
}
