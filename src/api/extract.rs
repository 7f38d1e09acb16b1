//! Caller identity extraction
//!
//! `Authorization: Bearer <token>` resolves to a [`Caller`]. A request without
//! the header is anonymous; a header carrying an unknown or expired token is
//! rejected outright.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::{AuthError, Caller};

/// The resolved caller, if the request carried a token
pub struct Identity(pub Option<Caller>);

impl Identity {
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Auth(AuthError::Unauthenticated))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(ApiError::Auth(AuthError::Unauthenticated)),
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            None => Ok(Identity(None)),
            Some(token) => {
                let caller = state.service.accounts().resolve(token).await?;
                Ok(Identity(Some(caller)))
            }
        }
    }
}
