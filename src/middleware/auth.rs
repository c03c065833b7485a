use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;

/// Shared secret expected on intake requests.
#[derive(Clone)]
pub struct ApiKey(pub Arc<str>);

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}

/// True when `Authorization` carries the key, with or without the `Bearer `
/// prefix. Comparison is constant-time.
pub fn has_valid_api_key(headers: &HeaderMap, expected: &str) -> bool {
    let Some(provided) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) else {
        return false;
    };
    let token = provided.strip_prefix("Bearer ").unwrap_or(provided);
    !expected.is_empty() && bool::from(token.as_bytes().ct_eq(expected.as_bytes()))
}

pub async fn require_api_key(State(key): State<ApiKey>, req: Request, next: Next) -> Response {
    if !has_valid_api_key(req.headers(), &key.0) {
        tracing::warn!(path = %req.uri().path(), "rejected request with missing or invalid API key");
        return unauthorized();
    }
    next.run(req).await
}
