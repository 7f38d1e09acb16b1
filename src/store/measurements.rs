//! Measurement Store
//!
//! Every write resolves the effective series and checks the effective value
//! against its bounds before anything is persisted. A measurement is either
//! active or gone; there is no intermediate state.

use crate::storage::{
    Measurement, MeasurementId, MeasurementPatch, MeasurementQuery, MeasurementRecord,
    run_blocking, NewMeasurement, Repository, SeriesId,
};
use crate::store::clock::Clock;
use crate::store::error::{Entity, StoreError, StoreResult};
use crate::store::validate::validate;
use crate::store::WriteGate;
use std::sync::Arc;

/// Create, update and delete measurements
#[derive(Clone)]
pub struct MeasurementStore {
    repo: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    gate: WriteGate,
}

impl MeasurementStore {
    pub(crate) fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, gate: WriteGate) -> Self {
        Self { repo, clock, gate }
    }

    /// Measurements joined with series name and color.
    ///
    /// Newest first unless the query asks for ascending order.
    pub async fn list(&self, query: &MeasurementQuery) -> StoreResult<Vec<MeasurementRecord>> {
        let query = query.clone();
        Ok(run_blocking(&self.repo, move |repo| repo.list_measurements(&query)).await?)
    }

    pub async fn get(&self, id: MeasurementId) -> StoreResult<Measurement> {
        run_blocking(&self.repo, move |repo| {
            repo.get_measurement(id)?
                .ok_or_else(|| StoreError::not_found(Entity::Measurement, id))
        })
        .await
    }

    /// Record a value for a series; `timestamp` defaults to now
    pub async fn create(
        &self,
        value: f64,
        series_id: SeriesId,
        timestamp: Option<i64>,
    ) -> StoreResult<Measurement> {
        let _guard = self.gate.lock().await;
        let timestamp = timestamp.unwrap_or_else(|| self.clock.now_millis());

        let measurement = run_blocking::<_, StoreError, _>(&self.repo, move |repo| {
            let series = repo
                .get_series(series_id)?
                .ok_or(StoreError::SeriesNotFound(series_id))?;

            if let Err(e) = validate(value, series.min_value, series.max_value) {
                tracing::debug!(series_id = %series_id, error = %e, "Rejected measurement");
                return Err(e.into());
            }

            Ok(repo.insert_measurement(&NewMeasurement {
                value,
                timestamp,
                series_id,
            })?)
        })
        .await?;

        tracing::info!(
            measurement_id = %measurement.id,
            series_id = %series_id,
            value,
            timestamp,
            "Created measurement"
        );
        Ok(measurement)
    }

    /// Apply a partial update, re-validating against the effective series
    pub async fn update(
        &self,
        id: MeasurementId,
        patch: MeasurementPatch,
    ) -> StoreResult<Measurement> {
        let _guard = self.gate.lock().await;

        let updated = run_blocking(&self.repo, move |repo| {
            let current = repo
                .get_measurement(id)?
                .ok_or_else(|| StoreError::not_found(Entity::Measurement, id))?;

            let candidate = patch.merge(&current);

            let series = repo
                .get_series(candidate.series_id)?
                .ok_or_else(|| StoreError::not_found(Entity::Series, candidate.series_id))?;

            validate(candidate.value, series.min_value, series.max_value)?;

            if !repo.update_measurement(&candidate)? {
                return Err(StoreError::not_found(Entity::Measurement, id));
            }
            Ok(candidate)
        })
        .await?;

        tracing::info!(
            measurement_id = %id,
            series_id = %updated.series_id,
            value = updated.value,
            "Updated measurement"
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: MeasurementId) -> StoreResult<()> {
        let _guard = self.gate.lock().await;

        run_blocking(&self.repo, move |repo| {
            if !repo.delete_measurement(id)? {
                return Err(StoreError::not_found(Entity::Measurement, id));
            }
            Ok(())
        })
        .await?;

        tracing::info!(measurement_id = %id, "Deleted measurement");
        Ok(())
    }

    pub async fn count(&self) -> StoreResult<usize> {
        Ok(run_blocking(&self.repo, |repo| repo.count_measurements()).await?)
    }
}
