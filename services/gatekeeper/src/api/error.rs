//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so every endpoint returns the
//! same error shape, and maps engine errors onto status codes in one place.
//!
//! # Key invariants
//! - Error responses carry a stable `code` and a human-readable `message`.
//! - A denied authorization check maps to a generic 403; the response never
//!   says which rule failed.
//! - Store details are logged server-side and never returned to clients.
use crate::api::types::ErrorResponse;
use crate::engine::EngineError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error: an HTTP status coupled with a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn build(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    build(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn api_not_enabled(message: &str) -> ApiError {
    // NOT_FOUND so a disabled surface is indistinguishable from an absent one.
    build(StatusCode::NOT_FOUND, "not_enabled", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    build(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden() -> ApiError {
    build(StatusCode::FORBIDDEN, "forbidden", "forbidden")
}

pub fn api_validation_error(message: &str) -> ApiError {
    build(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn api_unprocessable(code: &str, message: &str) -> ApiError {
    build(StatusCode::UNPROCESSABLE_ENTITY, code, message)
}

pub fn api_unavailable(message: &str) -> ApiError {
    build(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotAuthorized => api_forbidden(),
            EngineError::InvalidGrant(message) => api_validation_error(&message),
            EngineError::NotFound(message) => api_not_found(&message),
            EngineError::CyclicScope(scope) => {
                tracing::warn!(%scope, "cyclic scope chain rejected");
                api_unprocessable("cyclic_scope", "scope hierarchy contains a cycle")
            }
            EngineError::StoreUnavailable(source) => {
                tracing::error!(error = ?source, "gatekeeper store unavailable");
                api_unavailable("storage unavailable")
            }
        }
    }
}
