//! Health check handlers

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sandbox: String,
}

/// Health check endpoint; degraded while the isolation backend is unreachable
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, sandbox) = match state.sandbox().health_check().await {
        Ok(()) => (StatusCode::OK, "healthy", "up".to_string()),
        Err(e) => {
            tracing::warn!("Sandbox health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down".to_string())
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sandbox,
        }),
    )
}

/// Health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
