//! The permission engine.
//!
//! # Purpose
//! Houses the three evaluation components: the [`authority`] that grants,
//! verifies, suspends, and checks individual permission tuples; the
//! [`hierarchy`] resolver that walks group ancestry and aggregates checks;
//! and the [`membership`] workflow that turns coarse roles into grant
//! batches. The [`bootstrap`] capability sits apart because it bypasses the
//! normal validation rules and must never be reachable from the public
//! surface.
pub mod authority;
pub mod bootstrap;
pub mod error;
pub mod hierarchy;
pub mod membership;

pub use authority::{CheckOutcome, PermissionAuthority};
pub use bootstrap::BootstrapAuthority;
pub use error::{EngineError, EngineResult};
pub use hierarchy::{HierarchyResolver, ParentScopes};
pub use membership::{JoinOutcome, MembershipWorkflow, NewGroup};
