//! In-memory implementation of the grant store.
//!
//! # Purpose
//! Implements [`GrantStore`] entirely in memory using `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - deployments where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: mutations take the write lock, so the
//!   "insert if absent" check and insert happen under one critical section —
//!   the in-memory equivalent of the Postgres unique index.
//!
//! # Performance characteristics
//! Reads are concurrent; writes serialize per map. Listing scans and sorts,
//! which is acceptable for dev/test workloads.
use super::{GrantStore, StoreConfig, StoreError, StoreResult};
use crate::model::{Group, GroupFilter, GrantFilter, Page, Pagination, PermissionGrant};
use async_trait::async_trait;
use chrono::Utc;
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Grant rows are keyed by the uniqueness tuple.
type GrantKey = (UserId, PermissionType, Option<ScopeId>);

pub struct InMemoryStore {
    config: StoreConfig,
    grants: Arc<RwLock<HashMap<GrantKey, PermissionGrant>>>,
    groups: Arc<RwLock<HashMap<ScopeId, Group>>>,
}

impl InMemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            grants: Arc::new(RwLock::new(HashMap::new())),
            groups: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

fn matches_filter(grant: &PermissionGrant, filter: &GrantFilter) -> bool {
    if let Some(user_id) = filter.user_id {
        if grant.user_id != user_id {
            return false;
        }
    }
    if let Some(scope) = filter.scope {
        if grant.scope != Some(scope) {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if grant.status != status {
            return false;
        }
    }
    true
}

fn matches_group_filter(group: &Group, filter: &GroupFilter) -> bool {
    if let Some(name) = &filter.name {
        if !group.name.to_lowercase().contains(&name.to_lowercase()) {
            return false;
        }
    }
    if let Some(parent) = filter.parent_scope {
        if group.parent_scope != Some(parent) {
            return false;
        }
    }
    if let Some(visibility) = filter.visibility {
        if group.visibility != visibility {
            return false;
        }
    }
    if let Some(created_by) = filter.created_by {
        if group.created_by != created_by {
            return false;
        }
    }
    true
}

#[async_trait]
impl GrantStore for InMemoryStore {
    async fn find_grant(
        &self,
        user_id: UserId,
        permission_type: PermissionType,
        scope: Option<ScopeId>,
        statuses: &[GrantStatus],
    ) -> StoreResult<Option<PermissionGrant>> {
        let grants = self.grants.read().await;
        Ok(grants
            .get(&(user_id, permission_type, scope))
            .filter(|grant| statuses.is_empty() || statuses.contains(&grant.status))
            .cloned())
    }

    async fn insert_grant_if_absent(&self, grant: PermissionGrant) -> StoreResult<bool> {
        // One write lock covers the existence check and the insert, so two
        // racing grants for the same tuple cannot both succeed.
        let mut grants = self.grants.write().await;
        let key = (grant.user_id, grant.permission_type, grant.scope);
        if grants.contains_key(&key) {
            return Ok(false);
        }
        grants.insert(key, grant);
        Ok(true)
    }

    async fn update_grant_status(
        &self,
        user_id: UserId,
        permission_type: PermissionType,
        scope: Option<ScopeId>,
        status: GrantStatus,
        approved_by: UserId,
    ) -> StoreResult<bool> {
        let mut grants = self.grants.write().await;
        match grants.get_mut(&(user_id, permission_type, scope)) {
            Some(grant) => {
                grant.status = status;
                grant.updated_at = Some(Utc::now());
                grant.approved_by = Some(approved_by);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_grants(
        &self,
        filter: GrantFilter,
        page: Pagination,
    ) -> StoreResult<Page<PermissionGrant>> {
        let page = page.clamped(self.config.max_page_limit);
        let grants = self.grants.read().await;
        let mut matching: Vec<_> = grants
            .values()
            .filter(|grant| matches_filter(grant, &filter))
            .cloned()
            .collect();
        // Newest first, ties broken by subject for a stable page order.
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn grants_for_scope(
        &self,
        user_id: UserId,
        scope: ScopeId,
    ) -> StoreResult<Vec<PermissionGrant>> {
        let grants = self.grants.read().await;
        Ok(grants
            .values()
            .filter(|grant| {
                grant.user_id == user_id
                    && grant.scope == Some(scope)
                    && grant.status == GrantStatus::Active
            })
            .cloned()
            .collect())
    }

    async fn insert_group(&self, group: Group) -> StoreResult<Group> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.group_id) {
            return Err(StoreError::Conflict("group exists".into()));
        }
        groups.insert(group.group_id, group.clone());
        Ok(group)
    }

    async fn find_group(&self, group_id: ScopeId) -> StoreResult<Option<Group>> {
        Ok(self.groups.read().await.get(&group_id).cloned())
    }

    async fn find_child_groups(&self, parent: ScopeId) -> StoreResult<Vec<Group>> {
        let groups = self.groups.read().await;
        let mut children: Vec<_> = groups
            .values()
            .filter(|group| group.parent_scope == Some(parent))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn list_groups(
        &self,
        filter: GroupFilter,
        page: Pagination,
    ) -> StoreResult<Page<Group>> {
        let page = page.clamped(self.config.max_page_limit);
        let groups = self.groups.read().await;
        let mut matching: Vec<_> = groups
            .values()
            .filter(|group| matches_group_filter(group, &filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn merge_group_metadata(
        &self,
        group_id: ScopeId,
        patch: serde_json::Value,
    ) -> StoreResult<Group> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(&group_id)
            .ok_or_else(|| StoreError::NotFound("group".into()))?;
        merge_json(&mut group.metadata, patch);
        Ok(group.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Shallow merge: object keys from `patch` overwrite `target`; a non-object
/// patch replaces the whole value.
fn merge_json(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target.as_object_mut(), patch) {
        (Some(map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                map.insert(key, value);
            }
        }
        (_, patch) => *target = patch,
    }
}
