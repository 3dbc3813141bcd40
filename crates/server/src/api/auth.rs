use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Guard for protected routes. A no-op when no API key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(key) = state.config.auth.key() {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        if !provided.is_some_and(|value| key_matches(value, key)) {
            tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Accepts the raw key or `Bearer <key>`.
fn key_matches(provided: &str, key: &str) -> bool {
    provided == key || provided.strip_prefix("Bearer ") == Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{body_json, get, send, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    fn with_auth(uri: &str, value: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_key_matches_raw_and_bearer() {
        assert!(key_matches("s3cret", "s3cret"));
        assert!(key_matches("Bearer s3cret", "s3cret"));
        assert!(!key_matches("bearer s3cret", "s3cret"));
        assert!(!key_matches("Bearer other", "s3cret"));
        assert!(!key_matches("", "s3cret"));
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let state = test_state(Some("s3cret"));
        let response = send(&state, get("/api/logs")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Unauthorized - Invalid API key");
        assert_eq!(json["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_bearer_key_is_accepted() {
        let state = test_state(Some("s3cret"));
        let response = send(&state, with_auth("/api/logs", "Bearer s3cret")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, with_auth("/api/export/json", "s3cret")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_routes_skip_auth() {
        let state = test_state(Some("s3cret"));
        for uri in ["/", "/health", "/metrics", "/api/stats"] {
            let response = send(&state, get(uri)).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_empty_key_disables_auth() {
        let state = test_state(Some(""));
        let response = send(&state, get("/api/logs")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
