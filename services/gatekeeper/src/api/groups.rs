//! Group and membership endpoints.
//!
//! # Purpose
//! Group CRUD (create, get, list, metadata patch), ancestry and aggregated
//! authority lookups, the policy-driven join flow, and member role
//! management. Moderation rights are honored across the hierarchy: holding
//! `permissions.verify` at any ancestor is as good as holding it at the group.
use crate::api::error::{ApiError, api_forbidden, api_not_found, api_validation_error};
use crate::api::extract::ActingUser;
use crate::api::permissions::pagination_from;
use crate::api::types::{
    AncestorsResponse, AuthorityResponse, GroupCreateRequest, GroupListResponse,
    GroupPatchRequest, JoinResponse, RoleResponse, RoleUpdateRequest,
};
use crate::app::AppState;
use crate::engine::{EngineError, JoinOutcome, NewGroup};
use crate::model::{Group, GroupFilter, GroupVisibility};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use quorum_authz::{PermissionType, ScopeId, UserId};
use std::collections::HashMap;
use uuid::Uuid;

fn parse_types_param(params: &HashMap<String, String>) -> Result<Vec<PermissionType>, ApiError> {
    let raw = params
        .get("types")
        .ok_or_else(|| api_validation_error("types query parameter is required"))?;
    let mut types = Vec::new();
    for piece in raw.split(',').filter(|piece| !piece.is_empty()) {
        let permission = piece
            .parse::<PermissionType>()
            .map_err(|_| api_validation_error(&format!("unknown permission type: {piece}")))?;
        types.push(permission);
    }
    if types.is_empty() {
        return Err(api_validation_error("types must not be empty"));
    }
    Ok(types)
}

/// True when the acting user holds `permissions.verify` at the group itself
/// or at any of its ancestors.
async fn has_moderation_authority(
    state: &AppState,
    acting: UserId,
    group_id: ScopeId,
) -> Result<bool, ApiError> {
    let map = state
        .hierarchy
        .check_across_ancestors(acting, &[PermissionType::PermissionsVerify], acting, group_id)
        .await?;
    Ok(map.values().any(|allowed| *allowed))
}

#[utoipa::path(
    get,
    path = "/v1/groups",
    tag = "groups",
    params(
        ("name" = Option<String>, Query, description = "Filter by name substring"),
        ("parent_scope" = Option<String>, Query, description = "Filter by parent group"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("offset" = Option<u32>, Query, description = "Page offset")
    ),
    responses(
        (status = 200, description = "Paginated group listing", body = GroupListResponse)
    )
)]
pub(crate) async fn list_groups(
    ActingUser(_acting): ActingUser,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<GroupListResponse>, ApiError> {
    let parent_scope = match params.get("parent_scope") {
        None => None,
        Some(value) => Some(ScopeId::new(Uuid::parse_str(value).map_err(|_| {
            api_validation_error("parent_scope must be a uuid")
        })?)),
    };
    let filter = GroupFilter {
        name: params.get("name").cloned(),
        parent_scope,
        visibility: None,
        created_by: None,
    };
    let page = state
        .store
        .list_groups(filter, pagination_from(&params))
        .await
        .map_err(EngineError::from)?;
    Ok(Json(GroupListResponse {
        items: page.items,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/groups",
    tag = "groups",
    request_body = GroupCreateRequest,
    responses(
        (status = 201, description = "Group created; creator holds ADMIN", body = Group),
        (status = 400, description = "Validation error", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_group(
    ActingUser(acting): ActingUser,
    State(state): State<AppState>,
    Json(body): Json<GroupCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.name.trim().is_empty() {
        return Err(api_validation_error("name is required"));
    }
    // Root groups are open to any authenticated user; subgroups require
    // group.create at the parent.
    if let Some(parent) = body.parent_scope {
        state
            .store
            .find_group(parent)
            .await
            .map_err(EngineError::from)?
            .ok_or_else(|| api_not_found("parent group not found"))?;
        state
            .authority
            .check(acting, PermissionType::GroupCreate, acting, Some(parent))
            .await?;
    }

    let group = state
        .membership
        .create_group(
            acting,
            NewGroup {
                name: body.name,
                parent_scope: body.parent_scope,
                visibility: body.visibility,
                approval: body.approval,
                metadata: body.metadata,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{group_id}",
    tag = "groups",
    params(("group_id" = Uuid, Path, description = "Group identifier")),
    responses(
        (status = 200, description = "Group record", body = Group),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_group(
    ActingUser(_acting): ActingUser,
    Path(group_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .store
        .find_group(ScopeId::new(group_id))
        .await
        .map_err(EngineError::from)?
        .ok_or_else(|| api_not_found("group not found"))?;
    Ok(Json(group))
}

#[utoipa::path(
    patch,
    path = "/v1/groups/{group_id}",
    tag = "groups",
    params(("group_id" = Uuid, Path, description = "Group identifier")),
    request_body = GroupPatchRequest,
    responses(
        (status = 200, description = "Updated group", body = Group),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_group(
    ActingUser(acting): ActingUser,
    Path(group_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<GroupPatchRequest>,
) -> Result<Json<Group>, ApiError> {
    let group_id = ScopeId::new(group_id);
    state
        .store
        .find_group(group_id)
        .await
        .map_err(EngineError::from)?
        .ok_or_else(|| api_not_found("group not found"))?;
    state
        .authority
        .check(acting, PermissionType::GroupUpdate, acting, Some(group_id))
        .await?;

    if !body.metadata.is_object() {
        return Err(api_validation_error("metadata must be a JSON object"));
    }
    let group = state
        .store
        .merge_group_metadata(group_id, body.metadata)
        .await
        .map_err(EngineError::from)?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{group_id}/ancestors",
    tag = "groups",
    params(("group_id" = Uuid, Path, description = "Group identifier")),
    responses(
        (status = 200, description = "Ancestor chain, closest first", body = AncestorsResponse),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse),
        (status = 422, description = "Cyclic hierarchy", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn group_ancestors(
    ActingUser(_acting): ActingUser,
    Path(group_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<AncestorsResponse>, ApiError> {
    let group_id = ScopeId::new(group_id);
    let parents = state.hierarchy.parent_scopes(group_id).await?;
    let ancestors = state.hierarchy.all_ancestors(group_id).await?;
    Ok(Json(AncestorsResponse {
        parent: parents.parent,
        grandparent: parents.grandparent,
        ancestors,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{group_id}/authority",
    tag = "groups",
    params(
        ("group_id" = Uuid, Path, description = "Group identifier"),
        ("types" = String, Query, description = "Comma-separated permission types"),
        ("subject" = Option<String>, Query, description = "Subject user; defaults to the caller")
    ),
    responses(
        (status = 200, description = "Per-scope authority across the hierarchy", body = AuthorityResponse),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn group_authority(
    ActingUser(acting): ActingUser,
    Path(group_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<AuthorityResponse>, ApiError> {
    let types = parse_types_param(&params)?;
    let subject = match params.get("subject") {
        None => acting,
        Some(value) => UserId::new(
            Uuid::parse_str(value).map_err(|_| api_validation_error("subject must be a uuid"))?,
        ),
    };
    let scopes = state
        .hierarchy
        .check_across_ancestors(acting, &types, subject, ScopeId::new(group_id))
        .await?;
    Ok(Json(AuthorityResponse { scopes }))
}

#[utoipa::path(
    post,
    path = "/v1/groups/{group_id}/join",
    tag = "groups",
    params(("group_id" = Uuid, Path, description = "Group identifier")),
    responses(
        (status = 200, description = "Joined immediately", body = JoinResponse),
        (status = 202, description = "Join pending approval", body = JoinResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn join_group(
    ActingUser(acting): ActingUser,
    Path(group_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let group_id = ScopeId::new(group_id);
    let group = state
        .store
        .find_group(group_id)
        .await
        .map_err(EngineError::from)?
        .ok_or_else(|| api_not_found("group not found"))?;

    // Private groups only admit callers already trusted somewhere up the
    // hierarchy; the workflow itself only applies the approval policy.
    if group.visibility == GroupVisibility::Private
        && !has_moderation_authority(&state, acting, group_id).await?
    {
        return Err(api_forbidden());
    }

    match state.membership.join(acting, group_id).await? {
        JoinOutcome::Joined => Ok((
            StatusCode::OK,
            Json(JoinResponse {
                status: "joined".to_string(),
            }),
        )),
        JoinOutcome::Pending => Ok((
            StatusCode::ACCEPTED,
            Json(JoinResponse {
                status: "pending".to_string(),
            }),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/v1/groups/{group_id}/members/{user_id}/role",
    tag = "groups",
    params(
        ("group_id" = Uuid, Path, description = "Group identifier"),
        ("user_id" = Uuid, Path, description = "Member user identifier")
    ),
    responses(
        (status = 200, description = "Member's effective role, if any", body = RoleResponse),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_member_role(
    ActingUser(_acting): ActingUser,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = state
        .hierarchy
        .classify_role(UserId::new(user_id), ScopeId::new(group_id))
        .await?;
    Ok(Json(RoleResponse { role }))
}

#[utoipa::path(
    put,
    path = "/v1/groups/{group_id}/members/{user_id}/role",
    tag = "groups",
    params(
        ("group_id" = Uuid, Path, description = "Group identifier"),
        ("user_id" = Uuid, Path, description = "Member user identifier")
    ),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Member's new role", body = RoleResponse),
        (status = 403, description = "Forbidden", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn put_member_role(
    ActingUser(acting): ActingUser,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
    Json(body): Json<RoleUpdateRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    let group_id = ScopeId::new(group_id);
    let subject = UserId::new(user_id);
    state
        .store
        .find_group(group_id)
        .await
        .map_err(EngineError::from)?
        .ok_or_else(|| api_not_found("group not found"))?;

    // Role changes are a moderation action; an ancestor-scope verifier
    // qualifies just like a group-scope one.
    if !has_moderation_authority(&state, acting, group_id).await? {
        return Err(api_forbidden());
    }

    state
        .membership
        .change_role(acting, subject, group_id, body.role)
        .await?;
    let role = state.hierarchy.classify_role(subject, group_id).await?;
    Ok(Json(RoleResponse { role }))
}
