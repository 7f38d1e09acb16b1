//! Gaugeboard Storage
//!
//! This module provides durable storage for series, measurements and users:
//!
//! - **types**: Record types (Series, Measurement, MeasurementRecord, User)
//! - **repository**: The `Repository` trait, the only seam the stores use
//! - **sqlite**: SQLite implementation of `Repository`
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use gaugeboard::storage::{MeasurementQuery, NewSeries, Repository, SqliteRepository};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = SqliteRepository::open_in_memory()?;
//!
//!     let temp = repo.insert_series(&NewSeries {
//!         name: "Temperature".to_string(),
//!         min_value: -20.0,
//!         max_value: 50.0,
//!         color: "#ff6384".to_string(),
//!     })?;
//!
//!     let records = repo.list_measurements(&MeasurementQuery::new().series(temp.id))?;
//!     assert!(records.is_empty());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod repository;
pub mod sqlite;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use repository::{run_blocking, Repository};
pub use sqlite::{DatabaseLocation, SqliteRepository};
pub use types::{
    Measurement, MeasurementId, MeasurementPatch, MeasurementQuery, MeasurementRecord,
    NewMeasurement, NewSeries, NewUser, Series, SeriesId, SeriesPatch, SortOrder, User, UserId,
    DEFAULT_SERIES_COLOR,
};
