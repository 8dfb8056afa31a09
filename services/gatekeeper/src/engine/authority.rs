//! The permission authority: grant, verify, suspend, and check.
//!
//! # Purpose
//! Evaluates and mutates permission records for (user, type, scope) tuples.
//! This is the single place the scope-fallback and self-service rules live;
//! every other component delegates per-tuple decisions here.
//!
//! # Key invariants
//! - Granting an existing tuple is a silent no-op, never an error, so grant
//!   batches are idempotent.
//! - Scoped mutations require a scope. Global (null-scope) grants can only be
//!   created through the separate bootstrap capability.
//! - A check consults, in order: the self-service exception, the scoped
//!   ACTIVE grant, then the global ACTIVE grant. Denial carries no detail.
//! - The acting user is always an explicit parameter; the engine holds no
//!   ambient "current user" state.
use super::{EngineError, EngineResult};
use crate::model::PermissionGrant;
use crate::store::GrantStore;
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of a batch check: per-type outcomes plus the conjunction.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub results: BTreeMap<PermissionType, bool>,
    pub success: bool,
}

#[derive(Clone)]
pub struct PermissionAuthority {
    store: Arc<dyn GrantStore>,
}

impl PermissionAuthority {
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self { store }
    }

    /// Insert an UNVERIFIED grant for the tuple.
    ///
    /// # Errors
    /// - [`EngineError::InvalidGrant`] when `scope` is `None`; global grants
    ///   never come through this path.
    /// - An existing tuple (in any status) is a no-op, keeping grant
    ///   idempotent under races and retries.
    pub async fn grant(
        &self,
        acting: UserId,
        permission: PermissionType,
        subject: UserId,
        scope: Option<ScopeId>,
    ) -> EngineResult<()> {
        let scope = scope.ok_or_else(|| {
            EngineError::InvalidGrant("grant requires a scope".to_string())
        })?;
        let grant = PermissionGrant::unverified(permission, subject, Some(scope), acting);
        let inserted = self.store.insert_grant_if_absent(grant).await?;
        if !inserted {
            tracing::debug!(%subject, %permission, %scope, "grant already exists; no-op");
        }
        Ok(())
    }

    /// Transition a matching grant to ACTIVE, recording the approver.
    ///
    /// The grantor and approver should generally differ (four-eyes); distinct
    /// identities are not enforced here.
    pub async fn verify(
        &self,
        acting: UserId,
        permission: PermissionType,
        subject: UserId,
        scope: Option<ScopeId>,
    ) -> EngineResult<()> {
        let scope = scope.ok_or_else(|| {
            EngineError::InvalidGrant("verify requires a scope".to_string())
        })?;
        let updated = self
            .store
            .update_grant_status(subject, permission, Some(scope), GrantStatus::Active, acting)
            .await?;
        if !updated {
            return Err(EngineError::InvalidGrant(
                "no grant to verify for tuple".to_string(),
            ));
        }
        Ok(())
    }

    /// Transition a matching grant to SUSPENDED.
    ///
    /// Missing tuples are a no-op: revocation loops sweep the widest bundle,
    /// and a permission the user never held needs nothing revoked. The row is
    /// preserved, so "has this user ever held this permission" stays
    /// answerable.
    pub async fn suspend(
        &self,
        acting: UserId,
        permission: PermissionType,
        subject: UserId,
        scope: Option<ScopeId>,
    ) -> EngineResult<()> {
        let scope = scope.ok_or_else(|| {
            EngineError::InvalidGrant("suspend requires a scope".to_string())
        })?;
        self.store
            .update_grant_status(
                subject,
                permission,
                Some(scope),
                GrantStatus::Suspended,
                acting,
            )
            .await?;
        Ok(())
    }

    /// Authorize one permission for a subject in a scope.
    ///
    /// Order of evaluation:
    /// 1. Self-service exception: the acting user is the subject, the scope
    ///    is the subject's own user id, and the type is self-manageable.
    ///    Allowed with zero store reads.
    /// 2. ACTIVE grant at (subject, type, scope).
    /// 3. ACTIVE grant at (subject, type, global) — the super-admin fallback.
    /// 4. Deny with [`EngineError::NotAuthorized`].
    pub async fn check(
        &self,
        acting: UserId,
        permission: PermissionType,
        subject: UserId,
        scope: Option<ScopeId>,
    ) -> EngineResult<()> {
        if acting == subject
            && scope == Some(subject.as_scope())
            && permission.is_self_manageable()
        {
            metrics::counter!("gatekeeper_checks_allowed", "rule" => "self").increment(1);
            return Ok(());
        }

        let scoped = self
            .store
            .find_grant(subject, permission, scope, &[GrantStatus::Active])
            .await?;
        if scoped.is_some() {
            metrics::counter!("gatekeeper_checks_allowed", "rule" => "scoped").increment(1);
            return Ok(());
        }

        if scope.is_some() {
            let global = self
                .store
                .find_grant(subject, permission, None, &[GrantStatus::Active])
                .await?;
            if global.is_some() {
                metrics::counter!("gatekeeper_checks_allowed", "rule" => "global").increment(1);
                return Ok(());
            }
        }

        metrics::counter!("gatekeeper_checks_denied").increment(1);
        Err(EngineError::NotAuthorized)
    }

    /// Evaluate several permission types independently.
    ///
    /// One type's absence — or even a store failure looking it up — never
    /// blocks evaluation of the others; failures degrade to `false` for that
    /// type only. `success` is true only when every type passed.
    pub async fn check_many(
        &self,
        acting: UserId,
        permissions: &[PermissionType],
        subject: UserId,
        scope: Option<ScopeId>,
    ) -> CheckOutcome {
        let mut results = BTreeMap::new();
        for permission in permissions {
            let allowed = match self.check(acting, *permission, subject, scope).await {
                Ok(()) => true,
                Err(EngineError::NotAuthorized) => false,
                Err(err) => {
                    tracing::warn!(
                        %subject,
                        permission = %permission,
                        error = %err,
                        "check degraded to deny inside batch"
                    );
                    false
                }
            };
            results.insert(*permission, allowed);
        }
        let success = !results.is_empty() && results.values().all(|allowed| *allowed);
        CheckOutcome { results, success }
    }
}
