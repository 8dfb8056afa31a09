//! Acting-user extraction from trusted headers.
//!
//! # Purpose
//! Authentication happens in front of this service; the fronting layer passes
//! the verified caller as the `x-quorum-user` header. This extractor turns
//! that header into a typed [`UserId`] and rejects requests without one, so
//! no handler ever evaluates a permission for an ambient or implied caller.
use crate::api::error::{ApiError, api_unauthorized};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use quorum_authz::UserId;
use uuid::Uuid;

pub const ACTING_USER_HEADER: &str = "x-quorum-user";

/// The authenticated caller, as asserted by the fronting auth layer.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTING_USER_HEADER)
            .ok_or_else(|| api_unauthorized("missing acting user"))?;
        let text = value
            .to_str()
            .map_err(|_| api_unauthorized("invalid acting user"))?;
        let id = Uuid::parse_str(text).map_err(|_| api_unauthorized("invalid acting user"))?;
        Ok(ActingUser(UserId::new(id)))
    }
}
