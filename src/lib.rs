//! # Gaugeboard
//!
//! Range-checked sensor series with filterable chart and table views.
//!
//! ## Features
//!
//! - **Bounded series**: every measurement lies within its series' `[min, max]`
//! - **Atomic cascade**: deleting a series removes its measurements in one transaction
//! - **Views**: per-view filters, a timestamp pivot for charts, highlightable tables
//! - **Guest access**: read-only sessions, with one guard in front of every mutation
//!
//! ## Modules
//!
//! - [`storage`]: Record types, `Repository` trait, SQLite backend
//! - [`store`]: Series and Measurement stores with range validation
//! - [`view`]: Filter Engine, chart pivot, table shaping
//! - [`auth`]: Accounts, sessions, the capability guard
//! - [`service`]: Command dispatch behind the guard
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gaugeboard::storage::{MeasurementQuery, SqliteRepository};
//! use gaugeboard::store::{SeriesDraft, Stores, SystemClock};
//! use gaugeboard::view::{build_chart_frame, FilterState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = Arc::new(SqliteRepository::open_in_memory()?);
//!     let stores = Stores::new(repo, Arc::new(SystemClock));
//!
//!     let temp = stores
//!         .series
//!         .create(SeriesDraft::new("Temperature", -20.0, 50.0))
//!         .await?;
//!     stores.measurements.create(21.5, temp.id, None).await?;
//!
//!     let records = stores.measurements.list(&MeasurementQuery::new()).await?;
//!     let visible = gaugeboard::view::apply(&records, &FilterState::new());
//!     let frame = build_chart_frame(&visible, &stores.series.list().await?);
//!
//!     println!("{} rows, {:?} ticks", frame.len(), frame.recommended_tick_granularity());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod seed;
pub mod service;
pub mod storage;
pub mod store;
pub mod time;
pub mod view;

pub use api::{build_router, serve, ApiError, AppState};
pub use auth::{AuthError, Caller};
pub use config::{Config, ConfigError};
pub use service::{Command, Reply, Service, ServiceError};
pub use storage::{
    Measurement, MeasurementId, MeasurementRecord, Series, SeriesId, SqliteRepository,
    StorageError, StorageResult,
};
pub use store::{StoreError, Stores};
pub use view::{build_chart_frame, ChartFrame, FilterState, TableView};
