//! Group records: nodes in the scope hierarchy.
//!
//! # Purpose
//! A group's id is the scope other entities reference; its `parent_scope`
//! links it into an arbitrarily deep tree. Visibility and approval policy
//! gate the membership workflow.
//!
//! # Key invariants
//! - The parent chain must not contain the group itself; the hierarchy
//!   resolver fails closed if it ever does.
//! - Groups are never hard-deleted; metadata is merge-updated.
use chrono::{DateTime, Utc};
use quorum_authz::{ScopeId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupVisibility {
    Public,
    Private,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    Auto,
    Manual,
    Never,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Group {
    /// The scope identifier other entities reference.
    #[schema(value_type = uuid::Uuid)]
    pub group_id: ScopeId,
    /// Parent group, or `None` for a root group.
    #[schema(value_type = Option<uuid::Uuid>)]
    pub parent_scope: Option<ScopeId>,
    pub name: String,
    pub visibility: GroupVisibility,
    pub approval: ApprovalPolicy,
    /// Free-form metadata, merge-updated via PATCH.
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    #[schema(value_type = uuid::Uuid)]
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Whether the membership workflow may create grant rows for this group
    /// at all. Closed groups and `Never` approval reject joins outright.
    pub fn accepts_members(&self) -> bool {
        self.visibility != GroupVisibility::Closed && self.approval != ApprovalPolicy::Never
    }
}

/// Filters for the paginated group listing.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupFilter {
    pub name: Option<String>,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub parent_scope: Option<ScopeId>,
    pub visibility: Option<GroupVisibility>,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub created_by: Option<UserId>,
}
