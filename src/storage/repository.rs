//! Persistence boundary
//!
//! The stores talk to durable storage only through [`Repository`]. Every
//! method is atomic on its own; in particular [`Repository::delete_series_cascade`]
//! removes a series and all of its measurements in a single transaction, so
//! readers observe either both or neither.
//!
//! Repository methods block. Async callers go through [`run_blocking`] so the
//! runtime workers never wait on SQLite.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{
    Measurement, MeasurementId, MeasurementQuery, MeasurementRecord, NewMeasurement, NewSeries,
    NewUser, Series, SeriesId, User, UserId,
};
use std::sync::Arc;

/// Durable storage for series, measurements and users
pub trait Repository: Send + Sync {
    // ==================== Series ====================

    /// All series in insertion order
    fn list_series(&self) -> StorageResult<Vec<Series>>;

    fn get_series(&self, id: SeriesId) -> StorageResult<Option<Series>>;

    /// Case-sensitive exact lookup
    fn find_series_by_name(&self, name: &str) -> StorageResult<Option<Series>>;

    fn insert_series(&self, series: &NewSeries) -> StorageResult<Series>;

    /// Overwrite a stored series. Returns `false` if it does not exist.
    fn update_series(&self, series: &Series) -> StorageResult<bool>;

    /// Remove a series together with every measurement referencing it.
    ///
    /// Returns the number of measurements removed, or `None` if the series
    /// does not exist. On error nothing is removed.
    fn delete_series_cascade(&self, id: SeriesId) -> StorageResult<Option<usize>>;

    /// Smallest and largest value recorded for a series, if it has any
    fn measurement_extent(&self, id: SeriesId) -> StorageResult<Option<(f64, f64)>>;

    // ==================== Measurements ====================

    /// Measurements joined with their series' display fields
    fn list_measurements(&self, query: &MeasurementQuery) -> StorageResult<Vec<MeasurementRecord>>;

    fn get_measurement(&self, id: MeasurementId) -> StorageResult<Option<Measurement>>;

    fn insert_measurement(&self, measurement: &NewMeasurement) -> StorageResult<Measurement>;

    /// Overwrite a stored measurement. Returns `false` if it does not exist.
    fn update_measurement(&self, measurement: &Measurement) -> StorageResult<bool>;

    /// Returns `false` if the measurement does not exist
    fn delete_measurement(&self, id: MeasurementId) -> StorageResult<bool>;

    fn count_measurements(&self) -> StorageResult<usize>;

    // ==================== Users ====================

    fn find_user(&self, username: &str) -> StorageResult<Option<User>>;

    fn get_user(&self, id: UserId) -> StorageResult<Option<User>>;

    fn insert_user(&self, user: &NewUser) -> StorageResult<User>;

    /// Returns `false` if the user does not exist
    fn update_password(&self, id: UserId, password_hash: &str) -> StorageResult<bool>;
}

/// Run repository work on tokio's blocking pool.
///
/// `op` may chain several calls and any CPU-heavy work that belongs with
/// them; its error type only needs to absorb [`StorageError`].
pub async fn run_blocking<T, E, F>(repo: &Arc<dyn Repository>, op: F) -> Result<T, E>
where
    F: FnOnce(&dyn Repository) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<StorageError> + Send + 'static,
{
    let repo = Arc::clone(repo);
    match tokio::task::spawn_blocking(move || op(repo.as_ref())).await {
        Ok(result) => result,
        Err(e) => Err(StorageError::from(e).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteRepository;

    #[tokio::test]
    async fn test_run_blocking_off_runtime_thread() {
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
        let caller = std::thread::current().id();

        let (count, worker) = run_blocking(&repo, |repo| -> StorageResult<_> {
            Ok((repo.count_measurements()?, std::thread::current().id()))
        })
        .await
        .unwrap();

        assert_eq!(count, 0);
        assert_ne!(worker, caller);
    }

    #[tokio::test]
    async fn test_run_blocking_reports_panics() {
        let repo: Arc<dyn Repository> = Arc::new(SqliteRepository::open_in_memory().unwrap());
        let result: StorageResult<()> = run_blocking(&repo, |_| panic!("boom")).await;
        assert!(matches!(result, Err(StorageError::Task(_))));
    }
}
