//! Role bundle catalog.
//!
//! # Purpose
//! Maps the three coarse group roles onto the fine-grained permission types
//! each role implies. The mapping is pure data compiled into the binary; it is
//! never persisted or configurable.
//!
//! # Key invariants
//! - Bundles grow monotonically: USER ⊆ MOD ⊆ ADMIN.
//! - Slice order is the deterministic iteration order for batch grant,
//!   verify, and suspend loops; it carries no other meaning.
use crate::{AuthzError, PermissionType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupRole {
    User,
    Mod,
    Admin,
}

const USER_BUNDLE: &[PermissionType] = &[
    PermissionType::CommunicationsCreate,
    PermissionType::CommunicationsRead,
    PermissionType::ProfileView,
];

const MOD_BUNDLE: &[PermissionType] = &[
    PermissionType::CommunicationsCreate,
    PermissionType::CommunicationsRead,
    PermissionType::ProfileView,
    PermissionType::CommunicationsDelete,
    PermissionType::CommunicationsUpdate,
    PermissionType::PermissionsSuspend,
];

const ADMIN_BUNDLE: &[PermissionType] = &[
    PermissionType::CommunicationsCreate,
    PermissionType::CommunicationsRead,
    PermissionType::ProfileView,
    PermissionType::CommunicationsDelete,
    PermissionType::CommunicationsUpdate,
    PermissionType::PermissionsSuspend,
    PermissionType::GroupCreate,
    PermissionType::GroupDelete,
    PermissionType::GroupUpdate,
    PermissionType::PermissionsVerify,
];

impl GroupRole {
    /// The ordered permission set this role implies.
    pub fn bundle(self) -> &'static [PermissionType] {
        match self {
            GroupRole::User => USER_BUNDLE,
            GroupRole::Mod => MOD_BUNDLE,
            GroupRole::Admin => ADMIN_BUNDLE,
        }
    }

    /// Roles from most to least privileged, for classification.
    pub fn ordered_desc() -> [GroupRole; 3] {
        [GroupRole::Admin, GroupRole::Mod, GroupRole::User]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::User => "USER",
            GroupRole::Mod => "MOD",
            GroupRole::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GroupRole {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "USER" => Ok(GroupRole::User),
            "MOD" => Ok(GroupRole::Mod),
            "ADMIN" => Ok(GroupRole::Admin),
            other => Err(AuthzError::InvalidRole(other.to_string())),
        }
    }
}
