//! Strongly typed identifiers for subjects and scopes.
//!
//! # Purpose
//! Wraps raw UUIDs so user ids and scope (group) ids cannot be mixed up at
//! call sites. A grant check against a user's *own* id as the scope is the
//! self-service case, so the conversion between the two is explicit.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// The scope a user occupies when managing things about themselves.
    pub fn as_scope(&self) -> ScopeId {
        ScopeId(self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Scope identifier: the group a grant or check is evaluated against.
///
/// A `None` scope at the call sites that accept `Option<ScopeId>` means
/// global/unscoped; this type itself is always a concrete scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(Uuid);

impl ScopeId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for ScopeId {
    fn from(value: UserId) -> Self {
        value.as_scope()
    }
}
