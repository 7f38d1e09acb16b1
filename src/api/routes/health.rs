//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (database answers)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::storage::{run_blocking, StorageResult};

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match storage_counts(&state).await {
        Some(_) => StatusCode::OK,
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let counts = storage_counts(&state).await;
    let (series, measurements) = counts.unwrap_or((0, 0));

    Json(HealthResponse {
        status: if counts.is_some() { "healthy" } else { "unhealthy" }.to_string(),
        storage: if counts.is_some() { "ok" } else { "error" }.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        series,
        measurements,
    })
}

/// Series and measurement counts, or `None` if the database fails a round trip
async fn storage_counts(state: &AppState) -> Option<(usize, usize)> {
    let result = run_blocking(state.service.repository(), |repo| -> StorageResult<_> {
        Ok((repo.list_series()?.len(), repo.count_measurements()?))
    })
    .await;

    match result {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::error!(error = %e, "Storage health check failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
