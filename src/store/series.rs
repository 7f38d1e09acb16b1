//! Series Store
//!
//! Owns series entities: unique trimmed names, `min < max` bounds, and
//! cascade deletion of every measurement a series owns.

use crate::storage::{
    run_blocking, NewSeries, Repository, Series, SeriesId, SeriesPatch, DEFAULT_SERIES_COLOR,
};
use crate::store::error::{Entity, StoreError, StoreResult};
use crate::store::validate::{validate, validate_bounds};
use crate::store::WriteGate;
use std::sync::Arc;

/// Input for creating a series
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDraft {
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub color: Option<String>,
}

impl SeriesDraft {
    pub fn new(name: impl Into<String>, min_value: f64, max_value: f64) -> Self {
        Self {
            name: name.into(),
            min_value,
            max_value,
            color: None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Create, update and delete series
#[derive(Clone)]
pub struct SeriesStore {
    repo: Arc<dyn Repository>,
    gate: WriteGate,
}

impl SeriesStore {
    pub(crate) fn new(repo: Arc<dyn Repository>, gate: WriteGate) -> Self {
        Self { repo, gate }
    }

    /// All series, in insertion order
    pub async fn list(&self) -> StoreResult<Vec<Series>> {
        Ok(run_blocking(&self.repo, |repo| repo.list_series()).await?)
    }

    pub async fn get(&self, id: SeriesId) -> StoreResult<Series> {
        run_blocking(&self.repo, move |repo| {
            repo.get_series(id)?
                .ok_or_else(|| StoreError::not_found(Entity::Series, id))
        })
        .await
    }

    pub async fn create(&self, draft: SeriesDraft) -> StoreResult<Series> {
        let name = normalize_name(&draft.name)?;
        validate_bounds(draft.min_value, draft.max_value)?;
        let color = normalize_color(draft.color.as_deref());

        let _guard = self.gate.lock().await;

        let series = run_blocking(&self.repo, move |repo| {
            if repo.find_series_by_name(&name)?.is_some() {
                tracing::debug!(name = %name, "Rejected duplicate series name");
                return Err(StoreError::DuplicateName(name));
            }

            repo.insert_series(&NewSeries {
                name: name.clone(),
                min_value: draft.min_value,
                max_value: draft.max_value,
                color,
            })
            .map_err(|e| {
                if e.is_constraint() {
                    StoreError::DuplicateName(name)
                } else {
                    StoreError::Storage(e)
                }
            })
        })
        .await?;

        tracing::info!(
            series_id = %series.id,
            name = %series.name,
            min = series.min_value,
            max = series.max_value,
            "Created series"
        );
        Ok(series)
    }

    /// Apply a partial update.
    ///
    /// The merged candidate is validated as a whole: an update that only
    /// changes `max_value` must still satisfy `min_value < max_value`, and the
    /// candidate bounds must still contain every stored measurement.
    pub async fn update(&self, id: SeriesId, patch: SeriesPatch) -> StoreResult<Series> {
        let _guard = self.gate.lock().await;

        let updated = run_blocking(&self.repo, move |repo| {
            let current = repo
                .get_series(id)?
                .ok_or_else(|| StoreError::not_found(Entity::Series, id))?;

            let mut candidate = patch.merge(&current);
            candidate.name = normalize_name(&candidate.name)?;
            candidate.color = normalize_color(Some(&candidate.color));
            validate_bounds(candidate.min_value, candidate.max_value)?;

            if candidate.name != current.name {
                if let Some(other) = repo.find_series_by_name(&candidate.name)? {
                    if other.id != id {
                        return Err(StoreError::DuplicateName(candidate.name));
                    }
                }
            }

            let bounds_changed = candidate.min_value != current.min_value
                || candidate.max_value != current.max_value;
            if bounds_changed {
                if let Some((low, high)) = repo.measurement_extent(id)? {
                    validate(low, candidate.min_value, candidate.max_value)?;
                    validate(high, candidate.min_value, candidate.max_value)?;
                }
            }

            let stored = repo.update_series(&candidate).map_err(|e| {
                if e.is_constraint() {
                    StoreError::DuplicateName(candidate.name.clone())
                } else {
                    StoreError::Storage(e)
                }
            })?;
            if !stored {
                return Err(StoreError::not_found(Entity::Series, id));
            }
            Ok(candidate)
        })
        .await?;

        tracing::info!(series_id = %id, name = %updated.name, "Updated series");
        Ok(updated)
    }

    /// Delete a series and every measurement referencing it, atomically.
    ///
    /// Returns the number of measurements removed with it.
    pub async fn delete(&self, id: SeriesId) -> StoreResult<usize> {
        let _guard = self.gate.lock().await;

        let removed = run_blocking(&self.repo, move |repo| {
            repo.delete_series_cascade(id)?
                .ok_or_else(|| StoreError::not_found(Entity::Series, id))
        })
        .await?;

        tracing::info!(
            series_id = %id,
            measurements_removed = removed,
            "Deleted series"
        );
        Ok(removed)
    }
}

fn normalize_name(name: &str) -> StoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn normalize_color(color: Option<&str>) -> String {
    match color.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => DEFAULT_SERIES_COLOR.to_string(),
    }
}
