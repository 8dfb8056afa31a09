//! Domain model shared by the engine, store, and HTTP API.
pub mod grant;
pub mod group;

pub use grant::{GrantFilter, PermissionGrant};
pub use group::{ApprovalPolicy, Group, GroupFilter, GroupVisibility};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One page of listing results with the total matching count.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Limit/offset pagination input, defaulted the way the listing endpoints
/// expect it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Clamp the limit so a single request cannot dump the whole table.
    pub fn clamped(self, max_limit: u32) -> Self {
        Self {
            limit: self.limit.min(max_limit).max(1),
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn pagination_clamps_limit() {
        let page = Pagination {
            limit: 5000,
            offset: 20,
        }
        .clamped(100);
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 20);

        let zero = Pagination {
            limit: 0,
            offset: 0,
        }
        .clamped(100);
        assert_eq!(zero.limit, 1);
    }
}
