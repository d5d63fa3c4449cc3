//! Health routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /health | GET | Liveness |
//! | /health/ready | GET | Readiness, pings the catalog store |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "timestamp": "2024-01-01T00:00:00Z" }
//! ```

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use std::time::Instant;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    status: &'static str,
    version: &'static str,
    store: CheckResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// ok | error
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn ready(State(state): State<ServerState>) -> (StatusCode, Json<ReadinessResponse>) {
    let started = Instant::now();
    let (status, store) = match state.catalog.ping().await {
        Ok(()) => (
            StatusCode::OK,
            CheckResult {
                status: "ok",
                latency_ms: Some(started.elapsed().as_millis() as u64),
                message: None,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, transient = e.is_transient(), "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                CheckResult {
                    status: "error",
                    latency_ms: None,
                    message: Some(e.to_string()),
                },
            )
        }
    };

    let body = ReadinessResponse {
        status: if status == StatusCode::OK { "ready" } else { "unavailable" },
        version: env!("CARGO_PKG_VERSION"),
        store,
    };
    (status, Json(body))
}
