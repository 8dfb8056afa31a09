//! The closed permission enumeration.
//!
//! # Purpose
//! Defines every permission type the engine can grant or check. The set is
//! deliberately immutable at runtime: permission assignments are data, but the
//! permission *types* are code, which rules out privilege escalation through
//! configuration.
//!
//! # Key invariants
//! - Canonical strings are `domain.verb` and round-trip through `FromStr`.
//! - The self-manageable subset is small and fixed; it lets a user exercise a
//!   narrow slice of permissions on themselves without a stored grant.
use crate::AuthzError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PermissionType {
    PermissionsRead,
    PermissionsCreate,
    PermissionsVerify,
    PermissionsSuspend,
    AccountCreate,
    AccountView,
    AccountVerify,
    ProfileView,
    ProfileUpdate,
    ProfileDelete,
    CommunicationsRead,
    CommunicationsCreate,
    CommunicationsUpdate,
    CommunicationsDelete,
    GroupCreate,
    GroupUpdate,
    GroupDelete,
}

impl PermissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionType::PermissionsRead => "permissions.read",
            PermissionType::PermissionsCreate => "permissions.create",
            PermissionType::PermissionsVerify => "permissions.verify",
            PermissionType::PermissionsSuspend => "permissions.suspend",
            PermissionType::AccountCreate => "account.create",
            PermissionType::AccountView => "account.view",
            PermissionType::AccountVerify => "account.verify",
            PermissionType::ProfileView => "profile.view",
            PermissionType::ProfileUpdate => "profile.update",
            PermissionType::ProfileDelete => "profile.delete",
            PermissionType::CommunicationsRead => "communications.read",
            PermissionType::CommunicationsCreate => "communications.create",
            PermissionType::CommunicationsUpdate => "communications.update",
            PermissionType::CommunicationsDelete => "communications.delete",
            PermissionType::GroupCreate => "group.create",
            PermissionType::GroupUpdate => "group.update",
            PermissionType::GroupDelete => "group.delete",
        }
    }

    /// Permission types a user may exercise on themselves (scope == their own
    /// user id) without any stored grant.
    pub fn is_self_manageable(self) -> bool {
        matches!(
            self,
            PermissionType::ProfileUpdate
                | PermissionType::ProfileDelete
                | PermissionType::CommunicationsDelete
        )
    }
}

impl std::fmt::Display for PermissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PermissionType {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "permissions.read" => Ok(PermissionType::PermissionsRead),
            "permissions.create" => Ok(PermissionType::PermissionsCreate),
            "permissions.verify" => Ok(PermissionType::PermissionsVerify),
            "permissions.suspend" => Ok(PermissionType::PermissionsSuspend),
            "account.create" => Ok(PermissionType::AccountCreate),
            "account.view" => Ok(PermissionType::AccountView),
            "account.verify" => Ok(PermissionType::AccountVerify),
            "profile.view" => Ok(PermissionType::ProfileView),
            "profile.update" => Ok(PermissionType::ProfileUpdate),
            "profile.delete" => Ok(PermissionType::ProfileDelete),
            "communications.read" => Ok(PermissionType::CommunicationsRead),
            "communications.create" => Ok(PermissionType::CommunicationsCreate),
            "communications.update" => Ok(PermissionType::CommunicationsUpdate),
            "communications.delete" => Ok(PermissionType::CommunicationsDelete),
            "group.create" => Ok(PermissionType::GroupCreate),
            "group.update" => Ok(PermissionType::GroupUpdate),
            "group.delete" => Ok(PermissionType::GroupDelete),
            other => Err(AuthzError::InvalidPermission(other.to_string())),
        }
    }
}

impl TryFrom<String> for PermissionType {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionType> for String {
    fn from(value: PermissionType) -> Self {
        value.as_str().to_string()
    }
}
