//! Permission grant records and listing filters.
//!
//! # Purpose
//! Defines the unit of authorization: one row asserting that a user may hold a
//! permission type in a scope, with a lifecycle status.
//!
//! # Key invariants
//! - At most one grant exists per (user, type, scope) tuple; the store
//!   enforces this atomically.
//! - Grants are append-only in effect: status transitions overwrite `status`,
//!   `updated_at`, and `approved_by`, but rows are never deleted, so "has this
//!   user ever held this permission" stays answerable.
use chrono::{DateTime, Utc};
use quorum_authz::{GrantStatus, PermissionType, ScopeId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PermissionGrant {
    /// The user this permission applies to.
    #[schema(value_type = uuid::Uuid)]
    pub user_id: UserId,
    #[schema(value_type = String, example = "communications.read")]
    pub permission_type: PermissionType,
    /// Group the permission is scoped to; `None` is a global grant.
    #[schema(value_type = Option<uuid::Uuid>)]
    pub scope: Option<ScopeId>,
    #[schema(value_type = String, example = "active")]
    pub status: GrantStatus,
    pub created_at: DateTime<Utc>,
    /// The user who created the grant.
    #[schema(value_type = uuid::Uuid)]
    pub created_by: UserId,
    pub updated_at: Option<DateTime<Utc>>,
    /// The user who last verified or suspended the grant.
    #[schema(value_type = Option<uuid::Uuid>)]
    pub approved_by: Option<UserId>,
}

impl PermissionGrant {
    /// A fresh, unverified grant awaiting approval.
    pub fn unverified(
        permission_type: PermissionType,
        user_id: UserId,
        scope: Option<ScopeId>,
        created_by: UserId,
    ) -> Self {
        Self {
            user_id,
            permission_type,
            scope,
            status: GrantStatus::Unverified,
            created_at: Utc::now(),
            created_by,
            updated_at: None,
            approved_by: None,
        }
    }
}

/// Filters for the paginated grant listing.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantFilter {
    #[schema(value_type = Option<uuid::Uuid>)]
    pub user_id: Option<UserId>,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub scope: Option<ScopeId>,
    #[schema(value_type = Option<String>)]
    pub status: Option<GrantStatus>,
}
