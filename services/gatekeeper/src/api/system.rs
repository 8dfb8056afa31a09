//! System and health endpoints.
//!
//! # Purpose
//! Lightweight read-only endpoints for probes and operators. Health reflects
//! the backing store; info is served from in-memory configuration.
use crate::api::error::{ApiError, api_unavailable};
use crate::api::types::{HealthStatus, SystemInfo};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/v1/system/info",
    tag = "system",
    responses(
        (status = 200, description = "Service identity and storage backend", body = SystemInfo)
    )
)]
pub(crate) async fn system_info(State(state): State<AppState>) -> Json<SystemInfo> {
    Json(SystemInfo {
        service: "gatekeeper".to_string(),
        api_version: state.api_version.clone(),
        storage_backend: state.store.backend_name().to_string(),
        durable_storage: state.store.is_durable(),
    })
}

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthStatus),
        (status = 503, description = "Storage unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        tracing::error!(error = ?err, "health check failed");
        return Err(api_unavailable("storage unavailable"));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}
