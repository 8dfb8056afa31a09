use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid permission: {0}")]
    InvalidPermission(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid grant status code: {0}")]
    InvalidStatus(i16),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
