use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use insight::{LogEntry, StoredLog};
use tracing::{debug, info};

use crate::api::blocking;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{LogQuery, LogQueryParams};

/// POST /api/logs - validate, derive metadata, fill defaults and store
pub async fn create_log(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<StoredLog>)> {
    let entry: LogEntry = serde_json::from_slice(&body).map_err(|e| {
        debug!("Rejected malformed log payload: {}", e);
        state.metrics.log_rejected();
        ApiError::BadRequest("Invalid JSON format".to_string())
    })?;

    let prepared = insight::prepare(entry).map_err(|e| {
        state.metrics.log_rejected();
        ApiError::from(e)
    })?;

    let store = state.store.clone();
    let stored = blocking(move || Ok(store.insert(prepared, Utc::now())?)).await?;

    if let Some(severity) = stored.severity() {
        state.metrics.log_accepted(severity);
    }
    info!(
        id = stored.id,
        log_type = %stored.header.log_type,
        source = %stored.header.source,
        "Stored log"
    );

    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/logs - filtered, newest first
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<Vec<StoredLog>>> {
    let query = LogQuery::from_params(params).map_err(ApiError::BadRequest)?;

    let store = state.store.clone();
    let logs = blocking(move || Ok(store.query(&query)?)).await?;
    Ok(Json(logs))
}
