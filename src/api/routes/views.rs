//! View Routes
//!
//! - GET /api/v1/views/chart - Filtered, pivoted chart frame
//! - GET /api/v1/views/table - Filtered table rows
//!
//! Both take the shared filter values (`start`, `end`, `series`), their own
//! enable flag (`chart_filter` / `table_filter`) and an optional `highlight`.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::ViewParams;
use crate::api::error::ApiResult;
use crate::api::extract::Identity;
use crate::api::state::AppState;
use crate::service::{Command, Reply};

/// GET /api/v1/views/chart
pub async fn chart(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<ViewParams>,
) -> ApiResult<Json<Reply>> {
    let request = params.into_request()?;
    let reply = state
        .service
        .dispatch(identity.caller(), Command::ChartView(request))
        .await?;
    Ok(Json(reply))
}

/// GET /api/v1/views/table
pub async fn table(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<ViewParams>,
) -> ApiResult<Json<Reply>> {
    let request = params.into_request()?;
    let reply = state
        .service
        .dispatch(identity.caller(), Command::TableView(request))
        .await?;
    Ok(Json(reply))
}
