//! Role bundles as a membership workflow.
//!
//! # Purpose
//! Turns the coarse USER/MOD/ADMIN roles into per-type grant batches against
//! the group's scope. A "member" is nothing more than a user whose ACTIVE
//! grants cover a bundle; there is no separate membership table.
//!
//! # Key invariants
//! - Policy gates run before any row is written: a rejected request leaves
//!   zero grant rows behind.
//! - Role changes suspend the widest bundle first, so a demoted admin keeps
//!   no residual elevated rights.
//! - Bundle loops iterate in catalog order, and each step is idempotent, so
//!   a retried batch converges instead of erroring.
use super::{EngineError, EngineResult, PermissionAuthority};
use crate::model::{ApprovalPolicy, Group};
use crate::store::GrantStore;
use chrono::Utc;
use quorum_authz::{GroupRole, ScopeId, UserId};
use std::sync::Arc;

/// How a join request resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Auto-approval: the USER bundle is already ACTIVE.
    Joined,
    /// Manual approval: UNVERIFIED rows await a moderator.
    Pending,
}

/// Parameters for creating a group.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub parent_scope: Option<ScopeId>,
    pub visibility: crate::model::GroupVisibility,
    pub approval: ApprovalPolicy,
    pub metadata: serde_json::Value,
}

#[derive(Clone)]
pub struct MembershipWorkflow {
    store: Arc<dyn GrantStore>,
    authority: PermissionAuthority,
}

impl MembershipWorkflow {
    pub fn new(store: Arc<dyn GrantStore>, authority: PermissionAuthority) -> Self {
        Self { store, authority }
    }

    async fn load_group(&self, group_id: ScopeId) -> EngineResult<Group> {
        self.store
            .find_group(group_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("group {group_id}")))
    }

    /// Request a role: UNVERIFIED grants for every type in the bundle.
    ///
    /// The policy gate runs first; a closed group or a `Never` approval
    /// policy rejects before any row is written.
    pub async fn request_role(
        &self,
        acting: UserId,
        subject: UserId,
        group_id: ScopeId,
        role: GroupRole,
    ) -> EngineResult<()> {
        let group = self.load_group(group_id).await?;
        if !group.accepts_members() {
            return Err(EngineError::NotAuthorized);
        }
        for permission in role.bundle() {
            self.authority
                .grant(acting, *permission, subject, Some(group_id))
                .await?;
        }
        Ok(())
    }

    /// Approve a requested role: verify every type in the bundle.
    pub async fn assign_role(
        &self,
        acting: UserId,
        subject: UserId,
        group_id: ScopeId,
        role: GroupRole,
    ) -> EngineResult<()> {
        self.load_group(group_id).await?;
        for permission in role.bundle() {
            self.authority
                .verify(acting, *permission, subject, Some(group_id))
                .await?;
        }
        Ok(())
    }

    /// Set a member's role exactly, or remove it with `None`.
    ///
    /// Suspends the full ADMIN bundle first so the result is exact-role: a
    /// MOD demoted from ADMIN holds nothing beyond the MOD bundle. The
    /// suspension sweep tolerates types the member never held.
    pub async fn change_role(
        &self,
        acting: UserId,
        subject: UserId,
        group_id: ScopeId,
        new_role: Option<GroupRole>,
    ) -> EngineResult<()> {
        let group = self.load_group(group_id).await?;
        // Gate before suspending: a rejected change must not strip the
        // member's existing role.
        if new_role.is_some() && !group.accepts_members() {
            return Err(EngineError::NotAuthorized);
        }

        for permission in GroupRole::Admin.bundle() {
            self.authority
                .suspend(acting, *permission, subject, Some(group_id))
                .await?;
        }

        if let Some(role) = new_role {
            for permission in role.bundle() {
                self.authority
                    .grant(acting, *permission, subject, Some(group_id))
                    .await?;
                self.authority
                    .verify(acting, *permission, subject, Some(group_id))
                    .await?;
            }
        }
        Ok(())
    }

    /// Join as a regular member, outcome driven by the approval policy.
    ///
    /// `Auto` activates the USER bundle immediately; `Manual` leaves it
    /// UNVERIFIED for a moderator. Private-group access control is the
    /// caller's concern; this method only applies the approval policy.
    pub async fn join(&self, acting: UserId, group_id: ScopeId) -> EngineResult<JoinOutcome> {
        let group = self.load_group(group_id).await?;
        if !group.accepts_members() {
            return Err(EngineError::NotAuthorized);
        }

        self.request_role(acting, acting, group_id, GroupRole::User)
            .await?;
        match group.approval {
            ApprovalPolicy::Auto => {
                self.assign_role(acting, acting, group_id, GroupRole::User)
                    .await?;
                Ok(JoinOutcome::Joined)
            }
            ApprovalPolicy::Manual => Ok(JoinOutcome::Pending),
            // accepts_members() filtered this already.
            ApprovalPolicy::Never => Err(EngineError::NotAuthorized),
        }
    }

    /// Create a group and make its creator an ADMIN in one workflow step.
    ///
    /// The creator's bundle is written through the authority directly rather
    /// than the join path: closed and `Never`-approval groups must still get
    /// their founding admin.
    pub async fn create_group(&self, acting: UserId, spec: NewGroup) -> EngineResult<Group> {
        let group = Group {
            group_id: ScopeId::random(),
            parent_scope: spec.parent_scope,
            name: spec.name,
            visibility: spec.visibility,
            approval: spec.approval,
            metadata: spec.metadata,
            created_by: acting,
            created_at: Utc::now(),
        };
        self.store.insert_group(group.clone()).await?;

        for permission in GroupRole::Admin.bundle() {
            self.authority
                .grant(acting, *permission, acting, Some(group.group_id))
                .await?;
            self.authority
                .verify(acting, *permission, acting, Some(group.group_id))
                .await?;
        }
        tracing::info!(group = %group.group_id, creator = %acting, "group created");
        Ok(group)
    }
}
