//! Metrics route
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /metrics | GET | Prometheus text exposition |

use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/metrics", get(export))
}

pub async fn export(State(state): State<ServerState>) -> AppResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::internal(format!("Failed to render metrics: {e}")))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
