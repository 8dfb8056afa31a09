//! OpenAPI schema aggregation for the gatekeeper API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for
//! docs and client generation.
use crate::api::{
    bootstrap, groups, permissions, system,
    types::{
        AncestorsResponse, AuthorityResponse, BootstrapGrantRequest, BootstrapGrantResponse,
        ErrorResponse, GrantListResponse, GrantMutationRequest, GroupCreateRequest,
        GroupListResponse, GroupPatchRequest, HealthStatus, JoinResponse, RoleResponse,
        RoleUpdateRequest, SystemInfo, TypeResultResponse, ValidateRequest,
    },
};
use crate::model::{ApprovalPolicy, GrantFilter, Group, GroupFilter, GroupVisibility, PermissionGrant};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "quorum-gatekeeper",
        version = "v1",
        description = "Quorum permission engine HTTP API"
    ),
    paths(
        system::system_info,
        system::system_health,
        permissions::list_permissions,
        permissions::grant_permissions,
        permissions::approve_permissions,
        permissions::suspend_permissions,
        permissions::validate_permissions,
        groups::list_groups,
        groups::create_group,
        groups::get_group,
        groups::patch_group,
        groups::group_ancestors,
        groups::group_authority,
        groups::join_group,
        groups::get_member_role,
        groups::put_member_role,
        bootstrap::bootstrap_grants
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        SystemInfo,
        PermissionGrant,
        GrantFilter,
        GrantListResponse,
        GrantMutationRequest,
        ValidateRequest,
        TypeResultResponse,
        Group,
        GroupVisibility,
        ApprovalPolicy,
        GroupFilter,
        GroupCreateRequest,
        GroupListResponse,
        GroupPatchRequest,
        AncestorsResponse,
        AuthorityResponse,
        JoinResponse,
        RoleResponse,
        RoleUpdateRequest,
        BootstrapGrantRequest,
        BootstrapGrantResponse
    )),
    tags(
        (name = "system", description = "System and health endpoints"),
        (name = "permissions", description = "Grant lifecycle and validation"),
        (name = "groups", description = "Groups, hierarchy, and membership"),
        (name = "bootstrap", description = "Internal privileged bootstrap")
    )
)]
pub struct ApiDoc;
