//! Gaugeboard REST API
//!
//! HTTP layer built with Axum. Every data endpoint funnels into
//! [`Service::dispatch`](crate::service::Service::dispatch); handlers only
//! translate between JSON and commands.
//!
//! # Endpoints
//!
//! ## Users
//! - `POST /api/v1/users/register` - Create an account
//! - `POST /api/v1/users/login` - Log in
//! - `POST /api/v1/users/guest` - Guest session
//! - `POST /api/v1/users/logout` - Revoke the bearer token
//! - `PUT /api/v1/users/password` - Change password
//!
//! ## Series
//! - `GET /api/v1/series` - List all series
//! - `POST /api/v1/series` - Create a series
//! - `PUT /api/v1/series/:id` - Update a series
//! - `DELETE /api/v1/series/:id` - Delete a series (cascades)
//!
//! ## Measurements
//! - `GET /api/v1/measurements` - List measurements
//! - `POST /api/v1/measurements` - Record a measurement
//! - `PUT /api/v1/measurements/:id` - Update a measurement
//! - `DELETE /api/v1/measurements/:id` - Delete a measurement
//!
//! ## Views
//! - `GET /api/v1/views/chart` - Chart frame
//! - `GET /api/v1/views/table` - Table rows
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! Reads are public. Mutations need `Authorization: Bearer <token>` from a
//! non-guest session.

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // User routes
        .route("/users/register", post(routes::users::register))
        .route("/users/login", post(routes::users::login))
        .route("/users/guest", post(routes::users::guest))
        .route("/users/logout", post(routes::users::logout))
        .route("/users/password", put(routes::users::change_password))
        // Series routes
        .route(
            "/series",
            get(routes::series::list_series).post(routes::series::create_series),
        )
        .route(
            "/series/:id",
            put(routes::series::update_series).delete(routes::series::delete_series),
        )
        // Measurement routes
        .route(
            "/measurements",
            get(routes::measurements::list_measurements)
                .post(routes::measurements::create_measurement),
        )
        .route(
            "/measurements/:id",
            put(routes::measurements::update_measurement)
                .delete(routes::measurements::delete_measurement),
        )
        // View routes
        .route("/views/chart", get(routes::views::chart))
        .route("/views/table", get(routes::views::table));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Configured origins, or any origin when the list is empty
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gaugeboard API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Gaugeboard API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
