//! Internal bootstrap endpoint.
//!
//! # Purpose
//! Somebody has to mint the first verifier before any verified grants exist.
//! This endpoint writes pre-activated grants (global scope allowed) through
//! the privileged bootstrap authority. It only exists on the internal
//! listener and is gated by a shared token compared in constant time.
use crate::api::error::{
    ApiError, api_not_enabled, api_unauthorized, api_validation_error,
};
use crate::api::types::{BootstrapGrantRequest, BootstrapGrantResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use quorum_authz::UserId;
use uuid::Uuid;

pub const BOOTSTRAP_TOKEN_HEADER: &str = "x-quorum-bootstrap-token";

#[utoipa::path(
    post,
    path = "/internal/bootstrap/grants",
    tag = "bootstrap",
    request_body = BootstrapGrantRequest,
    responses(
        (status = 200, description = "Grants activated", body = BootstrapGrantResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not enabled")
    )
)]
pub async fn bootstrap_grants(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BootstrapGrantRequest>,
) -> Result<Json<BootstrapGrantResponse>, ApiError> {
    if !state.bootstrap_enabled {
        return Err(api_not_enabled("bootstrap not enabled"));
    }
    ensure_bootstrap_authorized(&state, &headers)?;

    if body.types.is_empty() {
        return Err(api_validation_error("types must not be empty"));
    }

    // The operator identity recorded as grantor and approver. Bootstrap
    // requests carry no acting user; the nil uuid marks system provenance.
    let operator = UserId::new(Uuid::nil());
    for permission in &body.types {
        state
            .bootstrap
            .grant_active(operator, *permission, body.subject, body.scope)
            .await?;
    }

    Ok(Json(BootstrapGrantResponse {
        activated: body.types.len(),
        status: "activated".to_string(),
    }))
}

fn ensure_bootstrap_authorized(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = match headers.get(BOOTSTRAP_TOKEN_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| api_unauthorized("invalid bootstrap token"))?,
        None => return Err(api_unauthorized("missing bootstrap token")),
    };

    let expected = state
        .bootstrap_token
        .as_ref()
        .ok_or_else(|| api_unauthorized("bootstrap token not configured"))?;

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(api_unauthorized("invalid bootstrap token"));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::constant_time_eq;

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
        assert!(!constant_time_eq(b"", b"x"));
        assert!(constant_time_eq(b"", b""));
    }
}
