use crate::AuthzError;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a permission grant.
///
/// Grants are created `Unverified`, activated by a second party, and may be
/// suspended and later re-activated. Rows are never deleted, so the numeric
/// codes are part of the storage contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Unverified,
    Suspended,
    Active,
}

impl GrantStatus {
    pub fn code(self) -> i16 {
        match self {
            GrantStatus::Unverified => 0,
            GrantStatus::Suspended => 1,
            GrantStatus::Active => 2,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, AuthzError> {
        match code {
            0 => Ok(GrantStatus::Unverified),
            1 => Ok(GrantStatus::Suspended),
            2 => Ok(GrantStatus::Active),
            other => Err(AuthzError::InvalidStatus(other)),
        }
    }
}
