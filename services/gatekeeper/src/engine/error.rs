use crate::store::StoreError;
use quorum_authz::ScopeId;
use thiserror::Error;

/// Engine error taxonomy.
///
/// `NotAuthorized` carries no detail on purpose: callers surface it as a
/// generic "forbidden" so a denied check never leaks which rule failed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not authorized")]
    NotAuthorized,
    #[error("invalid grant: {0}")]
    InvalidGrant(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("cyclic scope chain at {0}")]
    CyclicScope(ScopeId),
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            other => EngineError::StoreUnavailable(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_authorized_is_opaque() {
        assert_eq!(EngineError::NotAuthorized.to_string(), "not authorized");
    }

    #[test]
    fn store_errors_map_by_kind() {
        let missing: EngineError = StoreError::NotFound("group".into()).into();
        assert!(matches!(missing, EngineError::NotFound(_)));

        let transient: EngineError = StoreError::Unexpected(anyhow::anyhow!("boom")).into();
        assert!(matches!(transient, EngineError::StoreUnavailable(_)));
    }
}
