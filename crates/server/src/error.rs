use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use insight::ValidationError;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized - Invalid API key")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured error code plus the message safe to show a client.
    /// Storage and internal details are logged, never returned.
    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            ApiError::Validation(_) => ("VALIDATION_FAILED", self.to_string()),
            ApiError::BadRequest(_) => ("BAD_REQUEST", self.to_string()),
            ApiError::Unauthorized => ("UNAUTHORIZED", self.to_string()),
            ApiError::Storage(ref err) => {
                tracing::error!("Storage error: {}", err);
                ("STORAGE_ERROR", "Failed to access log storage".to_string())
            }
            ApiError::Internal(ref detail) => {
                tracing::error!("Internal error: {}", detail);
                ("INTERNAL_SERVER_ERROR", "An internal error occurred".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = self.code_and_message();
        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
