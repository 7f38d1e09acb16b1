//! User Routes
//!
//! - POST /api/v1/users/register - Create an account and log in
//! - POST /api/v1/users/login - Log in
//! - POST /api/v1/users/guest - Read-only guest session
//! - POST /api/v1/users/logout - Revoke the presented token
//! - PUT /api/v1/users/password - Change the caller's password

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ChangePasswordRequest, CredentialsRequest, SessionResponse};
use crate::api::error::ApiResult;
use crate::api::extract::{bearer_token, Identity};
use crate::api::state::AppState;
use crate::auth::AuthError;
use crate::service::{Command, Reply};

/// POST /api/v1/users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state
        .service
        .accounts()
        .register(&req.username, &req.password)
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/users/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state
        .service
        .accounts()
        .login(&req.username, &req.password)
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/users/guest
pub async fn guest(State(state): State<Arc<AppState>>) -> ApiResult<Json<SessionResponse>> {
    let session = state.service.accounts().guest().await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/users/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let Some(token) = bearer_token(&headers)? else {
        return Err(AuthError::Unauthenticated.into());
    };
    if !state.service.accounts().sessions().revoke(token).await {
        return Err(AuthError::Unauthenticated.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/users/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<Reply>> {
    let reply = state
        .service
        .dispatch(
            identity.caller(),
            Command::ChangePassword {
                old: req.old_password,
                new: req.new_password,
            },
        )
        .await?;
    Ok(Json(reply))
}
