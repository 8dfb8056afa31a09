//! Quorum authorization primitives shared by the gatekeeper service and its clients.
//!
//! # Purpose
//! Centralizes the closed permission enumeration, grant statuses, the role
//! bundle catalog, and strongly typed identifiers used across the permission
//! engine.
//!
//! # How it fits
//! The gatekeeper service evaluates and persists grants expressed in these
//! types; callers (web tier, messaging, admin tooling) use the same types to
//! ask authorization questions, so the vocabulary can never drift between
//! producer and consumer.
//!
//! # Key invariants
//! - [`PermissionType`] is closed and versioned: adding a permission is a code
//!   change, never a runtime or admin action.
//! - Role bundles are monotonically increasing: USER ⊆ MOD ⊆ ADMIN.
//! - Wire strings round-trip exactly through `as_str`/`FromStr`.
//!
//! # Common pitfalls
//! - Treating bundle order as semantic: ordering only makes batch grant loops
//!   deterministic.
//! - Comparing scopes as strings; use [`ScopeId`] so the null/global case is
//!   explicit.

mod errors;
mod permission;
mod role;
mod status;
mod types;

pub use errors::{AuthzError, AuthzResult};
pub use permission::PermissionType;
pub use role::GroupRole;
pub use status::GrantStatus;
pub use types::{ScopeId, UserId};
