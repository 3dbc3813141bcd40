use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use insight::StoredLog;

use crate::api::blocking;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{ExportParams, ExportRange};

const CSV_HEADER: [&str; 8] = [
    "ID",
    "Type",
    "Title",
    "Description",
    "Source",
    "Color",
    "Body",
    "Timestamp",
];

async fn exported_logs(state: &AppState, params: ExportParams) -> ApiResult<Vec<StoredLog>> {
    let range = ExportRange::from_params(params).map_err(ApiError::BadRequest)?;
    state.metrics.export_requested();

    let store = state.store.clone();
    let logs = blocking(move || Ok(store.export(&range)?)).await?;
    tracing::debug!(count = logs.len(), "Exporting logs");
    Ok(logs)
}

/// GET /api/export/csv
pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let logs = exported_logs(&state, params).await?;
    let csv = render_csv(&logs).map_err(|e| ApiError::Internal(format!("csv encoding: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=cubiclog_export.csv",
            ),
        ],
        csv,
    )
        .into_response())
}

/// GET /api/export/json
pub async fn export_json(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let logs = exported_logs(&state, params).await?;
    let json = serde_json::to_vec_pretty(&logs)
        .map_err(|e| ApiError::Internal(format!("json encoding: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=cubiclog_export.json",
            ),
        ],
        json,
    )
        .into_response())
}

fn render_csv(logs: &[StoredLog]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER.iter().map(|s| s.to_string()));

    for log in logs {
        push_record(
            &mut out,
            [
                log.id.to_string(),
                log.header.log_type.clone(),
                log.header.title.clone(),
                log.header.description.clone(),
                log.header.source.clone(),
                log.header.color.clone(),
                serde_json::to_string(&log.body)?,
                log.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            ],
        );
    }
    Ok(out)
}

fn push_record(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
    out.push('\n');
}

/// RFC 4180 quoting: wrap fields holding separators, quotes or line breaks.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
