//! Series Routes
//!
//! - GET /api/v1/series - List all series
//! - POST /api/v1/series - Create a series
//! - PUT /api/v1/series/:id - Update a series
//! - DELETE /api/v1/series/:id - Delete a series and its measurements

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateSeriesRequest, UpdateSeriesRequest};
use crate::api::error::ApiResult;
use crate::api::extract::Identity;
use crate::api::state::AppState;
use crate::service::{Command, Reply};
use crate::storage::SeriesId;

/// GET /api/v1/series
pub async fn list_series(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> ApiResult<Json<Reply>> {
    let reply = state
        .service
        .dispatch(identity.caller(), Command::ListSeries)
        .await?;
    Ok(Json(reply))
}

/// POST /api/v1/series
pub async fn create_series(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateSeriesRequest>,
) -> ApiResult<(StatusCode, Json<Reply>)> {
    let draft = req.into_draft()?;
    let reply = state
        .service
        .dispatch(identity.caller(), Command::CreateSeries(draft))
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// PUT /api/v1/series/:id
///
/// Partial update; omitted fields keep their stored values.
pub async fn update_series(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSeriesRequest>,
) -> ApiResult<Json<Reply>> {
    let patch = req.into_patch()?;
    let reply = state
        .service
        .dispatch(
            identity.caller(),
            Command::UpdateSeries {
                id: SeriesId(id),
                patch,
            },
        )
        .await?;
    Ok(Json(reply))
}

/// DELETE /api/v1/series/:id
pub async fn delete_series(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reply>> {
    let reply = state
        .service
        .dispatch(identity.caller(), Command::DeleteSeries(SeriesId(id)))
        .await?;
    Ok(Json(reply))
}
