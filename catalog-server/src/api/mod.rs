//! API routes
//!
//! - [`health`] - liveness and readiness
//! - [`categories`] - category tree
//! - [`attributes`] - attribute query
//! - [`metrics`] - Prometheus exposition

pub mod attributes;
pub mod categories;
pub mod health;
pub mod metrics;

use axum::Router;

use crate::core::ServerState;

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(categories::router())
        .merge(attributes::router())
        .merge(metrics::router())
}
