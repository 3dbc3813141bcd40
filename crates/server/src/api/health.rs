use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::api::blocking;
use crate::state::AppState;

/// Health check handler - reflects storage reachability
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.clone();
    match blocking(move || Ok(store.ping()?)).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "error": "database connection failed"
                })),
            )
        }
    }
}

/// Metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ingest": state.metrics.snapshot(),
        "storage": {
            "backend": state.store.backend()
        },
        "retention": {
            "days": state.config.retention.days
        }
    }))
}
