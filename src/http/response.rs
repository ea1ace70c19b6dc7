//! Error responses produced by the gateway itself.
//!
//! Bodies are JSON: `{"code": 404, "reason": "Not Found"}`.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub reason: &'static str,
}

/// Render a status code as a JSON error response.
pub fn error_response(status: StatusCode) -> Response {
    let body = ErrorBody {
        code: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown"),
    };
    (status, Json(body)).into_response()
}

pub fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND)
}

/// 405 with an `Allow` header listing `allowed`.
pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let mut res = error_response(StatusCode::METHOD_NOT_ALLOWED);
    if allowed.is_empty() {
        return res;
    }
    let list = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::from_str(&list) {
        res.headers_mut().insert(header::ALLOW, value);
    }
    res
}
