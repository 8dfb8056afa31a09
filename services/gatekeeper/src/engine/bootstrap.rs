//! Privileged grant creation for operators.
//!
//! # Purpose
//! The public authority refuses null-scope grants and always inserts rows
//! UNVERIFIED. Somebody still has to mint the first super-admin, so this
//! capability can write a pre-activated grant at any scope, global included.
//! It is only reachable from the internal bootstrap router and must stay off
//! the public surface.
use super::EngineResult;
use crate::model::PermissionGrant;
use crate::store::GrantStore;
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct BootstrapAuthority {
    store: Arc<dyn GrantStore>,
}

impl BootstrapAuthority {
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self { store }
    }

    /// Insert an ACTIVE grant directly, any scope including global.
    ///
    /// Idempotent and activating: if the tuple already exists in any status
    /// it is promoted to ACTIVE instead, so re-running a bootstrap script
    /// converges on the same state.
    pub async fn grant_active(
        &self,
        acting: UserId,
        permission: PermissionType,
        subject: UserId,
        scope: Option<ScopeId>,
    ) -> EngineResult<()> {
        let mut grant = PermissionGrant::unverified(permission, subject, scope, acting);
        grant.status = GrantStatus::Active;
        grant.approved_by = Some(acting);

        let inserted = self.store.insert_grant_if_absent(grant).await?;
        if !inserted {
            self.store
                .update_grant_status(subject, permission, scope, GrantStatus::Active, acting)
                .await?;
        }
        tracing::info!(
            %subject,
            %permission,
            scope = ?scope,
            by = %acting,
            "bootstrap grant activated"
        );
        Ok(())
    }
}
