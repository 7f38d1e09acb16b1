//! Measurement Routes
//!
//! - GET /api/v1/measurements - List measurements (series, start, end, order)
//! - POST /api/v1/measurements - Record a measurement
//! - PUT /api/v1/measurements/:id - Update a measurement
//! - DELETE /api/v1/measurements/:id - Delete a measurement

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateMeasurementRequest, MeasurementListParams, UpdateMeasurementRequest};
use crate::api::error::ApiResult;
use crate::api::extract::Identity;
use crate::api::state::AppState;
use crate::service::{Command, Reply};
use crate::storage::{MeasurementId, SeriesId};

/// GET /api/v1/measurements
///
/// Newest first unless `order=asc`.
pub async fn list_measurements(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<MeasurementListParams>,
) -> ApiResult<Json<Reply>> {
    let query = params.into_query()?;
    let reply = state
        .service
        .dispatch(identity.caller(), Command::ListMeasurements(query))
        .await?;
    Ok(Json(reply))
}

/// POST /api/v1/measurements
pub async fn create_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Json(req): Json<CreateMeasurementRequest>,
) -> ApiResult<(StatusCode, Json<Reply>)> {
    let command = Command::CreateMeasurement {
        value: req.value.resolve("value")?,
        series_id: SeriesId(req.series_id.resolve("series_id")?),
        timestamp: req.timestamp.map(|t| t.resolve()).transpose()?,
    };
    let reply = state.service.dispatch(identity.caller(), command).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// PUT /api/v1/measurements/:id
pub async fn update_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMeasurementRequest>,
) -> ApiResult<Json<Reply>> {
    let patch = req.into_patch()?;
    let reply = state
        .service
        .dispatch(
            identity.caller(),
            Command::UpdateMeasurement {
                id: MeasurementId(id),
                patch,
            },
        )
        .await?;
    Ok(Json(reply))
}

/// DELETE /api/v1/measurements/:id
pub async fn delete_measurement(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reply>> {
    let reply = state
        .service
        .dispatch(identity.caller(), Command::DeleteMeasurement(MeasurementId(id)))
        .await?;
    Ok(Json(reply))
}
