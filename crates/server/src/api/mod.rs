//! HTTP surface: routing, layers and handlers.

pub mod auth;
mod export;
mod health;
mod logs;
mod stats;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;
    let request_timeout = Duration::from_secs(server.request_timeout_secs);

    // Everything that reads or writes logs sits behind the API key
    let protected = Router::new()
        .route("/api/logs", post(logs::create_log).get(logs::list_logs))
        .route("/api/export/csv", get(export::export_csv))
        .route("/api/export/json", get(export::export_json))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(health::metrics_handler))
        .route("/api/stats", get(stats::stats_handler))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
                .layer(DefaultBodyLimit::max(server.max_body_bytes))
                .layer(cors_layer(server.enable_cors, &server.cors_origins)),
        )
        .with_state(state)
}

fn cors_layer(enabled: bool, origins: &[String]) -> CorsLayer {
    if !enabled {
        // Same-origin only
        return CorsLayer::new();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o == "*") {
        // Wildcard origins cannot be combined with credentials
        base.allow_origin(Any)
    } else {
        let origins = origins
            .iter()
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        base.allow_origin(origins).allow_credentials(true)
    }
}

/// Run storage work off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))?
}

/// Root handler - shows API info
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "CubicLog",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "logs": "/api/logs",
            "stats": "/api/stats",
            "export_csv": "/api/export/csv",
            "export_json": "/api/export/json",
            "health": "/health",
            "metrics": "/metrics"
        }
    }))
}
