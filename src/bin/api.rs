//! Gaugeboard API Server
//!
//! Run with: cargo run --bin gaugeboard-api
//!
//! # Configuration
//!
//! Read from `$XDG_CONFIG/gaugeboard/config.toml`, `/etc/gaugeboard/config.toml`
//! or `./config.toml` (or the file named by `GAUGEBOARD_CONFIG`), then
//! overridden by environment variables:
//! - `GAUGEBOARD_DB_PATH`: SQLite file or `:memory:`
//! - `GAUGEBOARD_API_HOST` / `GAUGEBOARD_API_PORT`: bind address (default 0.0.0.0:5000)
//! - `GAUGEBOARD_ADMIN_USER` / `GAUGEBOARD_ADMIN_PASSWORD`: bootstrap account
//! - `GAUGEBOARD_LOG_LEVEL` / `GAUGEBOARD_LOG_FORMAT`: logging
//! - `RUST_LOG`: full filter override

use anyhow::Context;
use gaugeboard::api::{serve, AppState};
use gaugeboard::config::Config;
use gaugeboard::logging;
use gaugeboard::service::Service;
use gaugeboard::storage::SqliteRepository;
use gaugeboard::store::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("GAUGEBOARD_CONFIG") {
        Ok(path) => Config::load_with_env(&PathBuf::from(path))?,
        Err(_) => Config::load_default(),
    };

    logging::init(&config.logging, "tower_http=debug");

    tracing::info!("Starting Gaugeboard API server v{}", env!("CARGO_PKG_VERSION"));

    let location = config.storage.location();
    tracing::info!("Database: {:?}", location);

    let repo = Arc::new(
        SqliteRepository::open_location(&location, config.storage.busy_timeout())
            .with_context(|| format!("opening database {:?}", location))?,
    );

    let service = Service::new(repo, Arc::new(SystemClock), config.auth.settings());

    if let Some(admin) = &config.auth.bootstrap_admin {
        let created = service
            .accounts()
            .ensure_user(&admin.username, &admin.password)
            .context("creating bootstrap admin")?;
        if created {
            tracing::info!(username = %admin.username, "Bootstrap admin created");
        }
    }

    tracing::info!(
        guest = config.auth.allow_guest,
        registration = config.auth.allow_registration,
        "Auth policy"
    );

    let state = AppState::new(service, config.api.clone());
    serve(state).await?;

    tracing::info!("Gaugeboard API server stopped");
    Ok(())
}
