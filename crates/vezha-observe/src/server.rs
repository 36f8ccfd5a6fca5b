// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health and metrics HTTP listener built on axum.
//!
//! Serves two unauthenticated routes for systemd and Prometheus:
//! - GET /health -- liveness with version and uptime
//! - GET /metrics -- Prometheus text format

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use vezha_core::error::VezhaError;

/// Shared state for the health handlers.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process can answer at all.
    pub status: String,
    /// Crate version baked in at compile time.
    pub version: String,
    /// Seconds since process start.
    pub uptime_secs: u64,
}

/// Start the health/metrics listener and serve until `cancel` fires.
pub async fn start_server(
    host: &str,
    port: u16,
    state: HealthState,
    cancel: CancellationToken,
) -> Result<(), VezhaError> {
    let app = Router::new()
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VezhaError::Internal(format!("failed to bind health listener to {addr}: {e}")))?;

    info!("health listener on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| VezhaError::Internal(format!("health listener error: {e}")))
}

/// GET /health
async fn get_health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Empty body when no recorder is installed; Prometheus treats that as
/// a target with no samples rather than an error.
async fn get_metrics(State(state): State<HealthState>) -> String {
    match &state.prometheus_render {
        Some(render) => render(),
        None => String::new(),
    }
}
