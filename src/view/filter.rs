//! Filter Engine
//!
//! Narrows a measurement set for one view. The composition is:
//!
//! 1. non-empty series selection keeps only selected series (empty = all)
//! 2. `start_time` drops anything earlier (inclusive boundary)
//! 3. `end_time` drops anything later (inclusive boundary)
//! 4. a disabled filter returns the input unchanged
//!
//! Chart and table each get their own [`FilterState`] derived from the shared
//! [`DashboardFilters`], so either view can switch filtering off without
//! touching the other.

use crate::storage::{Measurement, MeasurementRecord, SeriesId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Anything the filter engine and pivot builder can consume
pub trait Observation {
    fn series_id(&self) -> SeriesId;
    fn timestamp(&self) -> i64;
    fn value(&self) -> f64;
}

impl Observation for Measurement {
    fn series_id(&self) -> SeriesId {
        self.series_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn value(&self) -> f64 {
        self.value
    }
}

impl Observation for MeasurementRecord {
    fn series_id(&self) -> SeriesId {
        self.series_id
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Which presentation a filter state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Chart,
    Table,
}

/// Filter constraints for one view. Immutable once built; pass by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// Empty means every series
    pub series_selection: BTreeSet<SeriesId>,
    pub enabled: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            series_selection: BTreeSet::new(),
            enabled: true,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn end(mut self, end: i64) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn select(mut self, series_id: SeriesId) -> Self {
        self.series_selection.insert(series_id);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether an item passes steps 1-3, regardless of `enabled`
    pub fn matches<O: Observation>(&self, item: &O) -> bool {
        if !self.series_selection.is_empty() && !self.series_selection.contains(&item.series_id()) {
            return false;
        }
        if let Some(start) = self.start_time {
            if item.timestamp() < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if item.timestamp() > end {
                return false;
            }
        }
        true
    }

    /// Problems a caller should surface before applying this filter.
    ///
    /// The engine still runs on a malformed window; it just matches nothing.
    pub fn warning(&self) -> Option<FilterWarning> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end < start => {
                Some(FilterWarning::ReversedWindow { start, end })
            }
            _ => None,
        }
    }
}

/// Apply a view's filter state to a measurement set, preserving input order
pub fn apply<O: Observation + Clone>(items: &[O], state: &FilterState) -> Vec<O> {
    if !state.enabled {
        return items.to_vec();
    }
    items.iter().filter(|m| state.matches(*m)).cloned().collect()
}

/// Non-fatal filter problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterWarning {
    ReversedWindow { start: i64, end: i64 },
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::ReversedWindow { .. } => {
                write!(f, "End time precedes start time; no measurements can match")
            }
        }
    }
}

/// Filter values shared by the dashboard, with per-view enable flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilters {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub series_selection: BTreeSet<SeriesId>,
    pub chart_enabled: bool,
    pub table_enabled: bool,
}

impl Default for DashboardFilters {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            series_selection: BTreeSet::new(),
            chart_enabled: true,
            table_enabled: true,
        }
    }
}

impl DashboardFilters {
    /// The filter state a given view should apply
    pub fn for_view(&self, view: ViewKind) -> FilterState {
        FilterState {
            start_time: self.start_time,
            end_time: self.end_time,
            series_selection: self.series_selection.clone(),
            enabled: match view {
                ViewKind::Chart => self.chart_enabled,
                ViewKind::Table => self.table_enabled,
            },
        }
    }

    /// Flip a series in or out of the selection
    pub fn toggle_series(&mut self, series_id: SeriesId) {
        if !self.series_selection.remove(&series_id) {
            self.series_selection.insert(series_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MeasurementId;

    fn m(id: i64, series: i64, timestamp: i64) -> Measurement {
        Measurement {
            id: MeasurementId(id),
            value: id as f64,
            timestamp,
            series_id: SeriesId(series),
        }
    }

    fn sample() -> Vec<Measurement> {
        vec![
            m(1, 1, 100),
            m(2, 2, 150),
            m(3, 1, 200),
            m(4, 3, 250),
            m(5, 2, 300),
            m(6, 1, 350),
        ]
    }

    fn ids(items: &[Measurement]) -> Vec<i64> {
        items.iter().map(|m| m.id.0).collect()
    }

    #[test]
    fn test_empty_selection_keeps_all_series_within_window() {
        let state = FilterState::new().start(150).end(300);
        let out = apply(&sample(), &state);
        assert_eq!(ids(&out), vec![2, 3, 4, 5]);
        assert!(out.iter().all(|m| (150..=300).contains(&m.timestamp)));
    }

    #[test]
    fn test_series_selection() {
        let state = FilterState::new().select(SeriesId(1)).select(SeriesId(3));
        assert_eq!(ids(&apply(&sample(), &state)), vec![1, 3, 4, 6]);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let state = FilterState::new().start(200).end(200);
        assert_eq!(ids(&apply(&sample(), &state)), vec![3]);
    }

    #[test]
    fn test_disabled_returns_input_unchanged() {
        let state = FilterState::new().select(SeriesId(9)).start(1_000).enabled(false);
        assert_eq!(apply(&sample(), &state), sample());
    }

    #[test]
    fn test_reversed_window_warns_and_matches_nothing() {
        let state = FilterState::new().start(300).end(100);
        assert_eq!(
            state.warning(),
            Some(FilterWarning::ReversedWindow {
                start: 300,
                end: 100
            })
        );
        assert!(apply(&sample(), &state).is_empty());
        assert_eq!(FilterState::new().start(1).end(2).warning(), None);
    }

    #[test]
    fn test_views_toggle_independently() {
        let shared = DashboardFilters {
            start_time: Some(200),
            chart_enabled: false,
            ..Default::default()
        };

        let chart = apply(&sample(), &shared.for_view(ViewKind::Chart));
        let table = apply(&sample(), &shared.for_view(ViewKind::Table));

        assert_eq!(chart.len(), 6);
        assert_eq!(ids(&table), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_toggle_series() {
        let mut filters = DashboardFilters::default();
        filters.toggle_series(SeriesId(2));
        assert!(filters.series_selection.contains(&SeriesId(2)));
        filters.toggle_series(SeriesId(2));
        assert!(filters.series_selection.is_empty());
    }
}
