//! Request and response payloads for the HTTP API.
use crate::model::{ApprovalPolicy, Group, GroupVisibility, PermissionGrant};
use quorum_authz::{GroupRole, PermissionType, ScopeId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Uniform error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub service: String,
    pub api_version: String,
    pub storage_backend: String,
    pub durable_storage: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GrantListResponse {
    pub items: Vec<PermissionGrant>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Shared body for grant, approve, and suspend: a batch of types applied to
/// one subject at one scope.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GrantMutationRequest {
    #[schema(value_type = Vec<String>, example = json!(["communications.read"]))]
    pub types: Vec<PermissionType>,
    #[schema(value_type = uuid::Uuid)]
    pub subject: UserId,
    #[schema(value_type = uuid::Uuid)]
    pub scope: ScopeId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ValidateRequest {
    #[schema(value_type = Vec<String>, example = json!(["profile.view"]))]
    pub types: Vec<PermissionType>,
    /// Scope to evaluate against; omit for a global-only check.
    #[schema(value_type = Option<uuid::Uuid>)]
    pub scope: Option<ScopeId>,
}

/// Per-type outcome map. Keys are the canonical permission strings.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TypeResultResponse {
    #[schema(value_type = Object)]
    pub results: BTreeMap<PermissionType, bool>,
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GroupCreateRequest {
    pub name: String,
    #[serde(default)]
    #[schema(value_type = Option<uuid::Uuid>)]
    pub parent_scope: Option<ScopeId>,
    #[serde(default = "default_visibility")]
    pub visibility: GroupVisibility,
    #[serde(default = "default_approval")]
    pub approval: ApprovalPolicy,
    #[serde(default = "empty_metadata")]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

fn default_visibility() -> GroupVisibility {
    GroupVisibility::Private
}

fn default_approval() -> ApprovalPolicy {
    ApprovalPolicy::Manual
}

fn empty_metadata() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GroupListResponse {
    pub items: Vec<Group>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct GroupPatchRequest {
    /// Shallow-merged into the existing metadata; `null` values remove keys.
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AncestorsResponse {
    #[schema(value_type = Option<uuid::Uuid>)]
    pub parent: Option<ScopeId>,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub grandparent: Option<ScopeId>,
    /// Full chain, closest ancestor first.
    #[schema(value_type = Vec<uuid::Uuid>)]
    pub ancestors: Vec<ScopeId>,
}

/// Per-scope authority map for a group and its ancestors. Keys are scope
/// UUIDs; a `true` value means every requested type passed at that scope.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuthorityResponse {
    #[schema(value_type = Object)]
    pub scopes: BTreeMap<ScopeId, bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct JoinResponse {
    /// `joined` or `pending`.
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleResponse {
    #[schema(value_type = Option<String>, example = "MOD")]
    pub role: Option<GroupRole>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RoleUpdateRequest {
    /// Target role; `null` removes the member's role entirely.
    #[schema(value_type = Option<String>, example = "USER")]
    pub role: Option<GroupRole>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BootstrapGrantRequest {
    #[schema(value_type = Vec<String>, example = json!(["permissions.verify"]))]
    pub types: Vec<PermissionType>,
    #[schema(value_type = uuid::Uuid)]
    pub subject: UserId,
    /// Omit for a global grant covering every scope.
    #[schema(value_type = Option<uuid::Uuid>)]
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BootstrapGrantResponse {
    pub activated: usize,
    pub status: String,
}
