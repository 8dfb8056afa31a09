//! Storage contract for grants and groups.
//!
//! # Purpose
//! Defines the async trait the engine talks to, plus the error and config
//! types shared by the in-memory and Postgres backends.
//!
//! # Key invariants
//! - `insert_grant_if_absent` is atomic per (user, type, scope) tuple; the
//!   backend, not the caller, serializes racing inserts.
//! - Status updates mutate rows in place; nothing here ever deletes a grant.
use crate::model::{Group, GroupFilter, GrantFilter, Page, Pagination, PermissionGrant};
use async_trait::async_trait;
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Hard cap on a single listing page.
    pub max_page_limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_page_limit: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Look up the single grant for a tuple, restricted to the given
    /// statuses. An empty status slice matches any status.
    async fn find_grant(
        &self,
        user_id: UserId,
        permission_type: PermissionType,
        scope: Option<ScopeId>,
        statuses: &[GrantStatus],
    ) -> StoreResult<Option<PermissionGrant>>;

    /// Insert a grant unless the tuple already exists in any status.
    /// Returns `false` on conflict; this is the atomic "insert if absent"
    /// the uniqueness invariant rests on.
    async fn insert_grant_if_absent(&self, grant: PermissionGrant) -> StoreResult<bool>;

    /// Transition an existing grant's status, recording the approver and
    /// update time. Returns `false` when no row matches the tuple.
    async fn update_grant_status(
        &self,
        user_id: UserId,
        permission_type: PermissionType,
        scope: Option<ScopeId>,
        status: GrantStatus,
        approved_by: UserId,
    ) -> StoreResult<bool>;

    /// Paginated grant listing for admin surfaces.
    async fn list_grants(
        &self,
        filter: GrantFilter,
        page: Pagination,
    ) -> StoreResult<Page<PermissionGrant>>;

    /// All ACTIVE grants a user holds at one scope (role classification
    /// input).
    async fn grants_for_scope(
        &self,
        user_id: UserId,
        scope: ScopeId,
    ) -> StoreResult<Vec<PermissionGrant>>;

    async fn insert_group(&self, group: Group) -> StoreResult<Group>;
    async fn find_group(&self, group_id: ScopeId) -> StoreResult<Option<Group>>;
    async fn find_child_groups(&self, parent: ScopeId) -> StoreResult<Vec<Group>>;
    async fn list_groups(
        &self,
        filter: GroupFilter,
        page: Pagination,
    ) -> StoreResult<Page<Group>>;

    /// Shallow-merge a JSON object into the group's metadata.
    async fn merge_group_metadata(
        &self,
        group_id: ScopeId,
        patch: serde_json::Value,
    ) -> StoreResult<Group>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
