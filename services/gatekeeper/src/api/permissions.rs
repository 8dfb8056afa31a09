//! Permission grant endpoints.
//!
//! # Purpose
//! Exposes the grant lifecycle (grant, approve, suspend), the paginated
//! listing, and self-validation. Every mutating endpoint authorizes the
//! acting user against the corresponding meta-permission at the target scope
//! before touching any rows.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::extract::ActingUser;
use crate::api::types::{
    GrantListResponse, GrantMutationRequest, TypeResultResponse, ValidateRequest,
};
use crate::app::AppState;
use crate::engine::EngineError;
use crate::model::{GrantFilter, Pagination};
use axum::Json;
use axum::extract::{Query, State};
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

fn parse_uuid_param(params: &HashMap<String, String>, key: &str) -> Result<Option<Uuid>, ApiError> {
    match params.get(key) {
        None => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| api_validation_error(&format!("{key} must be a uuid"))),
    }
}

pub(crate) fn pagination_from(params: &HashMap<String, String>) -> Pagination {
    let defaults = Pagination::default();
    Pagination {
        limit: params
            .get("limit")
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.limit),
        offset: params
            .get("offset")
            .and_then(|value| value.parse().ok())
            .unwrap_or(defaults.offset),
    }
}

#[utoipa::path(
    get,
    path = "/v1/permissions",
    tag = "permissions",
    params(
        ("user_id" = Option<String>, Query, description = "Filter by subject user"),
        ("scope" = Option<String>, Query, description = "Filter by scope"),
        ("status" = Option<String>, Query, description = "Filter by status (unverified|suspended|active)"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("offset" = Option<u32>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Paginated grant listing", body = GrantListResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_permissions(
    ActingUser(acting): ActingUser,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<GrantListResponse>, ApiError> {
    let scope = parse_uuid_param(&params, "scope")?.map(ScopeId::new);
    let user_id = parse_uuid_param(&params, "user_id")?.map(UserId::new);
    let status = match params.get("status") {
        None => None,
        Some(value) => Some(
            serde_json::from_value::<GrantStatus>(serde_json::Value::String(value.clone()))
                .map_err(|_| api_validation_error("status must be unverified|suspended|active"))?,
        ),
    };

    // Reading grants at a scope requires the read permission there (or a
    // global grant); an unscoped listing requires the global grant.
    state
        .authority
        .check(acting, PermissionType::PermissionsRead, acting, scope)
        .await?;

    let page = state
        .store
        .list_grants(
            GrantFilter {
                user_id,
                scope,
                status,
            },
            pagination_from(&params),
        )
        .await
        .map_err(EngineError::from)?;

    Ok(Json(GrantListResponse {
        items: page.items,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/permissions/grant",
    tag = "permissions",
    request_body = GrantMutationRequest,
    responses(
        (status = 200, description = "Grants created (or already present)", body = TypeResultResponse),
        (status = 400, description = "Validation error", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn grant_permissions(
    ActingUser(acting): ActingUser,
    State(state): State<AppState>,
    Json(body): Json<GrantMutationRequest>,
) -> Result<Json<TypeResultResponse>, ApiError> {
    if body.types.is_empty() {
        return Err(api_validation_error("types must not be empty"));
    }
    state
        .authority
        .check(
            acting,
            PermissionType::PermissionsCreate,
            acting,
            Some(body.scope),
        )
        .await?;

    let mut results = BTreeMap::new();
    for permission in &body.types {
        state
            .authority
            .grant(acting, *permission, body.subject, Some(body.scope))
            .await?;
        results.insert(*permission, true);
    }
    let success = results.values().all(|ok| *ok);
    Ok(Json(TypeResultResponse { results, success }))
}

#[utoipa::path(
    post,
    path = "/v1/permissions/approve",
    tag = "permissions",
    request_body = GrantMutationRequest,
    responses(
        (status = 200, description = "Per-type approval results", body = TypeResultResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn approve_permissions(
    ActingUser(acting): ActingUser,
    State(state): State<AppState>,
    Json(body): Json<GrantMutationRequest>,
) -> Result<Json<TypeResultResponse>, ApiError> {
    if body.types.is_empty() {
        return Err(api_validation_error("types must not be empty"));
    }
    state
        .authority
        .check(
            acting,
            PermissionType::PermissionsVerify,
            acting,
            Some(body.scope),
        )
        .await?;

    // Types with no pending grant report false rather than failing the batch.
    let mut results = BTreeMap::new();
    for permission in &body.types {
        let approved = match state
            .authority
            .verify(acting, *permission, body.subject, Some(body.scope))
            .await
        {
            Ok(()) => true,
            Err(EngineError::InvalidGrant(_)) => false,
            Err(err) => return Err(err.into()),
        };
        results.insert(*permission, approved);
    }
    let success = results.values().all(|ok| *ok);
    Ok(Json(TypeResultResponse { results, success }))
}

#[utoipa::path(
    post,
    path = "/v1/permissions/suspend",
    tag = "permissions",
    request_body = GrantMutationRequest,
    responses(
        (status = 200, description = "Per-type suspension results", body = TypeResultResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn suspend_permissions(
    ActingUser(acting): ActingUser,
    State(state): State<AppState>,
    Json(body): Json<GrantMutationRequest>,
) -> Result<Json<TypeResultResponse>, ApiError> {
    if body.types.is_empty() {
        return Err(api_validation_error("types must not be empty"));
    }
    state
        .authority
        .check(
            acting,
            PermissionType::PermissionsSuspend,
            acting,
            Some(body.scope),
        )
        .await?;

    let mut results = BTreeMap::new();
    for permission in &body.types {
        state
            .authority
            .suspend(acting, *permission, body.subject, Some(body.scope))
            .await?;
        results.insert(*permission, true);
    }
    let success = results.values().all(|ok| *ok);
    Ok(Json(TypeResultResponse { results, success }))
}

#[utoipa::path(
    post,
    path = "/v1/permissions/validate",
    tag = "permissions",
    request_body = ValidateRequest,
    responses(
        (status = 200, description = "Per-type check results for the acting user", body = TypeResultResponse)
    )
)]
pub(crate) async fn validate_permissions(
    ActingUser(acting): ActingUser,
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<TypeResultResponse>, ApiError> {
    if body.types.is_empty() {
        return Err(api_validation_error("types must not be empty"));
    }
    // Always 200; absence of authority is data, not an error.
    let outcome = state
        .authority
        .check_many(acting, &body.types, acting, body.scope)
        .await;
    Ok(Json(TypeResultResponse {
        results: outcome.results,
        success: outcome.success,
    }))
}
