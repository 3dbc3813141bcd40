use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use insight::AggregateStats;
use serde::Serialize;

use crate::api::blocking;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: AggregateStats,

    /// `"12.5 KB"` / `"3.2 MB"`; absent for backends without a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_size: Option<String>,
}

/// GET /api/stats - analytics over every stored log
pub async fn stats_handler(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    state.metrics.stats_requested();

    let store = state.store.clone();
    let (logs, size) = blocking(move || Ok((store.snapshot()?, store.size_bytes()?))).await?;

    Ok(Json(StatsResponse {
        stats: insight::aggregate(&logs, Utc::now()),
        database_size: size.map(format_size),
    }))
}

fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb > 1024.0 {
        format!("{:.1} MB", kb / 1024.0)
    } else {
        format!("{:.1} KB", kb)
    }
}
