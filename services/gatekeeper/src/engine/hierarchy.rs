//! Group ancestry walks and authority aggregation.
//!
//! # Purpose
//! Groups form a tree through `parent_scope`. Checks against a group often
//! need to consider its ancestors too (a parent-group admin moderates the
//! child), so this resolver walks the chain, aggregates batch checks per
//! scope, and classifies a member's effective role.
//!
//! # Key invariants
//! - The walk keeps a visited set and a depth cap; a repeated scope fails
//!   closed with `CyclicScope` rather than looping or silently truncating.
//! - A dangling parent reference ends the chain without error.
//! - Role classification reads the group's own scope only; ancestry never
//!   inflates a member's role.
use super::{CheckOutcome, EngineError, EngineResult, PermissionAuthority};
use crate::store::GrantStore;
use quorum_authz::{GroupRole, PermissionType, ScopeId, UserId};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Walks longer than this are treated as corrupt data.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// The two nearest ancestors, the common case for moderation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentScopes {
    pub parent: Option<ScopeId>,
    pub grandparent: Option<ScopeId>,
}

#[derive(Clone)]
pub struct HierarchyResolver {
    store: Arc<dyn GrantStore>,
    authority: PermissionAuthority,
}

impl HierarchyResolver {
    pub fn new(store: Arc<dyn GrantStore>, authority: PermissionAuthority) -> Self {
        Self { store, authority }
    }

    /// The group's parent and grandparent scopes, where present.
    pub async fn parent_scopes(&self, group_id: ScopeId) -> EngineResult<ParentScopes> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("group {group_id}")))?;

        let parent = group.parent_scope;
        let grandparent = match parent {
            Some(parent_id) if parent_id != group_id => self
                .store
                .find_group(parent_id)
                .await?
                .and_then(|parent_group| parent_group.parent_scope),
            _ => None,
        };
        Ok(ParentScopes { parent, grandparent })
    }

    /// All ancestor scopes, closest first, each at most once.
    ///
    /// # Errors
    /// [`EngineError::CyclicScope`] when the chain revisits a scope or
    /// exceeds the depth cap. Fail closed: callers get no partial chain to
    /// authorize against.
    pub async fn all_ancestors(&self, group_id: ScopeId) -> EngineResult<Vec<ScopeId>> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("group {group_id}")))?;

        let mut visited = HashSet::from([group_id]);
        let mut chain = Vec::new();
        let mut next = group.parent_scope;

        while let Some(scope) = next {
            if !visited.insert(scope) || chain.len() >= MAX_ANCESTOR_DEPTH {
                return Err(EngineError::CyclicScope(scope));
            }
            chain.push(scope);
            // A dangling parent reference ends the chain quietly.
            next = match self.store.find_group(scope).await? {
                Some(ancestor) => ancestor.parent_scope,
                None => None,
            };
        }
        Ok(chain)
    }

    /// Run a batch check at the group and at every ancestor.
    ///
    /// The returned map holds one entry per scope, keyed by scope id, with
    /// the batch's `success` flag as the value. The group's own scope is
    /// always present.
    pub async fn check_across_ancestors(
        &self,
        acting: UserId,
        permissions: &[PermissionType],
        subject: UserId,
        group_id: ScopeId,
    ) -> EngineResult<BTreeMap<ScopeId, bool>> {
        let ancestors = self.all_ancestors(group_id).await?;

        let mut results = BTreeMap::new();
        let own: CheckOutcome = self
            .authority
            .check_many(acting, permissions, subject, Some(group_id))
            .await;
        results.insert(group_id, own.success);

        for scope in ancestors {
            let outcome = self
                .authority
                .check_many(acting, permissions, subject, Some(scope))
                .await;
            results.insert(scope, outcome.success);
        }
        Ok(results)
    }

    /// The highest role whose bundle is fully covered by the subject's
    /// ACTIVE grants at this group's own scope.
    pub async fn classify_role(
        &self,
        subject: UserId,
        group_id: ScopeId,
    ) -> EngineResult<Option<GroupRole>> {
        self.store
            .find_group(group_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("group {group_id}")))?;

        let held: HashSet<PermissionType> = self
            .store
            .grants_for_scope(subject, group_id)
            .await?
            .into_iter()
            .map(|grant| grant.permission_type)
            .collect();

        for role in GroupRole::ordered_desc() {
            if role.bundle().iter().all(|permission| held.contains(permission)) {
                return Ok(Some(role));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApprovalPolicy, Group, GroupVisibility};
    use crate::store::memory::InMemoryStore;
    use chrono::Utc;

    fn group(group_id: ScopeId, parent: Option<ScopeId>) -> Group {
        Group {
            group_id,
            parent_scope: parent,
            name: format!("group-{group_id}"),
            visibility: GroupVisibility::Public,
            approval: ApprovalPolicy::Auto,
            metadata: serde_json::json!({}),
            created_by: UserId::random(),
            created_at: Utc::now(),
        }
    }

    async fn resolver_with(groups: Vec<Group>) -> (HierarchyResolver, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::default());
        for g in groups {
            store.insert_group(g).await.expect("seed group");
        }
        let authority = PermissionAuthority::new(store.clone());
        (HierarchyResolver::new(store.clone(), authority), store)
    }

    #[tokio::test]
    async fn ancestors_are_closest_first() {
        let root = ScopeId::random();
        let mid = ScopeId::random();
        let leaf = ScopeId::random();
        let (resolver, _) = resolver_with(vec![
            group(root, None),
            group(mid, Some(root)),
            group(leaf, Some(mid)),
        ])
        .await;

        let chain = resolver.all_ancestors(leaf).await.expect("walk");
        assert_eq!(chain, vec![mid, root]);

        let parents = resolver.parent_scopes(leaf).await.expect("parents");
        assert_eq!(parents.parent, Some(mid));
        assert_eq!(parents.grandparent, Some(root));
    }

    #[tokio::test]
    async fn root_group_has_no_ancestors() {
        let root = ScopeId::random();
        let (resolver, _) = resolver_with(vec![group(root, None)]).await;

        assert!(resolver.all_ancestors(root).await.expect("walk").is_empty());
        let parents = resolver.parent_scopes(root).await.expect("parents");
        assert_eq!(parents.parent, None);
        assert_eq!(parents.grandparent, None);
    }

    #[tokio::test]
    async fn dangling_parent_ends_the_chain() {
        let missing = ScopeId::random();
        let leaf = ScopeId::random();
        let (resolver, _) = resolver_with(vec![group(leaf, Some(missing))]).await;

        let chain = resolver.all_ancestors(leaf).await.expect("walk");
        assert_eq!(chain, vec![missing]);
    }

    #[tokio::test]
    async fn cycles_fail_closed() {
        let a = ScopeId::random();
        let b = ScopeId::random();
        let (resolver, _) = resolver_with(vec![group(a, Some(b)), group(b, Some(a))]).await;

        let err = resolver.all_ancestors(a).await.expect_err("cycle");
        assert!(matches!(err, EngineError::CyclicScope(_)));
    }

    #[tokio::test]
    async fn self_parent_fails_closed() {
        let a = ScopeId::random();
        let (resolver, _) = resolver_with(vec![group(a, Some(a))]).await;

        let err = resolver.all_ancestors(a).await.expect_err("self-cycle");
        assert!(matches!(err, EngineError::CyclicScope(_)));
    }

    #[tokio::test]
    async fn missing_group_is_not_found() {
        let (resolver, _) = resolver_with(vec![]).await;
        let err = resolver
            .all_ancestors(ScopeId::random())
            .await
            .expect_err("unknown group");
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn authority_aggregates_per_scope() {
        let root = ScopeId::random();
        let leaf = ScopeId::random();
        let (resolver, store) =
            resolver_with(vec![group(root, None), group(leaf, Some(root))]).await;

        let admin = UserId::random();
        let subject = UserId::random();
        let authority = PermissionAuthority::new(store);
        authority
            .grant(admin, PermissionType::PermissionsVerify, subject, Some(root))
            .await
            .expect("grant at root");
        authority
            .verify(admin, PermissionType::PermissionsVerify, subject, Some(root))
            .await
            .expect("verify at root");

        let map = resolver
            .check_across_ancestors(
                subject,
                &[PermissionType::PermissionsVerify],
                subject,
                leaf,
            )
            .await
            .expect("aggregate");
        assert_eq!(map[&leaf], false);
        assert_eq!(map[&root], true);
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn classification_picks_highest_covered_bundle() {
        let scope = ScopeId::random();
        let (resolver, store) = resolver_with(vec![group(scope, None)]).await;
        let admin = UserId::random();
        let subject = UserId::random();
        let authority = PermissionAuthority::new(store);

        assert_eq!(
            resolver.classify_role(subject, scope).await.expect("none"),
            None
        );

        for permission in GroupRole::Mod.bundle() {
            authority
                .grant(admin, *permission, subject, Some(scope))
                .await
                .expect("grant");
            authority
                .verify(admin, *permission, subject, Some(scope))
                .await
                .expect("verify");
        }
        assert_eq!(
            resolver.classify_role(subject, scope).await.expect("mod"),
            Some(GroupRole::Mod)
        );

        // Suspending one USER-bundle type drops the classification below MOD.
        authority
            .suspend(admin, PermissionType::ProfileView, subject, Some(scope))
            .await
            .expect("suspend");
        assert_eq!(
            resolver.classify_role(subject, scope).await.expect("demoted"),
            None
        );
    }
}
