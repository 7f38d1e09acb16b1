//! Chart Pivot Builder
//!
//! Reshapes row-per-measurement data into one row per distinct timestamp with
//! one optional cell per series. Empty cells stay empty so a renderer can
//! bridge the gap instead of plotting a false zero.

use crate::storage::{Series, SeriesId};
use crate::view::filter::Observation;
use crate::view::table::Highlight;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const DAY_MILLIS: i64 = 86_400_000;

/// Spans shorter than this label the axis with time of day
pub const TIME_OF_DAY_SPAN_MILLIS: u64 = DAY_MILLIS as u64 * 3 / 2;

/// Axis label density for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickGranularity {
    TimeOfDay,
    Date,
}

impl TickGranularity {
    pub fn for_span(span_millis: u64) -> Self {
        if span_millis < TIME_OF_DAY_SPAN_MILLIS {
            TickGranularity::TimeOfDay
        } else {
            TickGranularity::Date
        }
    }

    /// Render an axis label (UTC)
    pub fn label(&self, timestamp: i64) -> String {
        let Some(dt) = DateTime::<Utc>::from_timestamp_millis(timestamp) else {
            return timestamp.to_string();
        };
        match self {
            TickGranularity::TimeOfDay => dt.format("%H:%M").to_string(),
            TickGranularity::Date => dt.format("%Y-%m-%d").to_string(),
        }
    }
}

/// One series column of the frame (legend entry)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartColumn {
    pub series_id: SeriesId,
    pub name: String,
    pub color: String,
}

/// All values observed at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub timestamp: i64,
    /// Absent key = no measurement for that series at this instant
    pub values: BTreeMap<SeriesId, f64>,
}

impl ChartRow {
    pub fn get(&self, series_id: SeriesId) -> Option<f64> {
        self.values.get(&series_id).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartFrame {
    pub columns: Vec<ChartColumn>,
    /// Strictly ascending by timestamp
    pub rows: Vec<ChartRow>,
}

impl ChartFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distance from first to last timestamp; zero for fewer than two rows.
    /// Unsigned, so any pair of stored timestamps fits.
    pub fn span_millis(&self) -> u64 {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => last.timestamp.abs_diff(first.timestamp),
            _ => 0,
        }
    }

    pub fn recommended_tick_granularity(&self) -> TickGranularity {
        TickGranularity::for_span(self.span_millis())
    }

    /// Row at exactly `timestamp`
    pub fn row_at(&self, timestamp: i64) -> Option<&ChartRow> {
        self.rows
            .binary_search_by_key(&timestamp, |r| r.timestamp)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// The emphasized point for a table selection, if it is in this frame
    pub fn highlighted(&self, highlight: &Highlight) -> Option<&ChartRow> {
        highlight.timestamp.and_then(|ts| self.row_at(ts))
    }
}

/// Pivot measurements into a chart frame.
///
/// Columns follow `series_list` order; measurements of series not in the list
/// still produce their timestamp's row but never fill a cell. When a
/// (timestamp, series) pair repeats, the later input wins.
pub fn build_chart_frame<O: Observation>(measurements: &[O], series_list: &[Series]) -> ChartFrame {
    let known: HashSet<SeriesId> = series_list.iter().map(|s| s.id).collect();

    let mut grouped: BTreeMap<i64, BTreeMap<SeriesId, f64>> = BTreeMap::new();
    for m in measurements {
        let cells = grouped.entry(m.timestamp()).or_default();
        if known.contains(&m.series_id()) {
            cells.insert(m.series_id(), m.value());
        }
    }

    ChartFrame {
        columns: series_list
            .iter()
            .map(|s| ChartColumn {
                series_id: s.id,
                name: s.name.clone(),
                color: s.color.clone(),
            })
            .collect(),
        rows: grouped
            .into_iter()
            .map(|(timestamp, values)| ChartRow { timestamp, values })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Measurement, MeasurementId};

    fn series(id: i64, name: &str) -> Series {
        Series {
            id: SeriesId(id),
            name: name.to_string(),
            min_value: 0.0,
            max_value: 100.0,
            color: "#8884d8".to_string(),
        }
    }

    fn m(id: i64, series: i64, value: f64, timestamp: i64) -> Measurement {
        Measurement {
            id: MeasurementId(id),
            value,
            timestamp,
            series_id: SeriesId(series),
        }
    }

    #[test]
    fn test_groups_by_exact_timestamp_and_sorts() {
        let list = vec![series(1, "A"), series(2, "B")];
        let data = vec![
            m(1, 1, 10.0, 3_000),
            m(2, 2, 20.0, 1_000),
            m(3, 1, 11.0, 1_000),
            m(4, 2, 21.0, 1_001),
        ];

        let frame = build_chart_frame(&data, &list);
        let stamps: Vec<i64> = frame.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![1_000, 1_001, 3_000]);

        assert_eq!(frame.rows[0].get(SeriesId(1)), Some(11.0));
        assert_eq!(frame.rows[0].get(SeriesId(2)), Some(20.0));
        // Gaps stay absent, never zero
        assert_eq!(frame.rows[1].get(SeriesId(1)), None);
        assert_eq!(frame.rows[2].get(SeriesId(2)), None);

        assert!(frame.rows.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_last_write_wins_per_cell() {
        let list = vec![series(1, "A")];
        let data = vec![m(1, 1, 10.0, 500), m(2, 1, 99.0, 500)];

        let frame = build_chart_frame(&data, &list);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.rows[0].get(SeriesId(1)), Some(99.0));
    }

    #[test]
    fn test_unlisted_series_never_fill_cells() {
        let list = vec![series(1, "A")];
        let data = vec![m(1, 7, 10.0, 500)];

        let frame = build_chart_frame(&data, &list);
        assert_eq!(frame.len(), 1);
        assert!(frame.rows[0].values.is_empty());
        assert_eq!(frame.columns.len(), 1);
        assert_eq!(frame.columns[0].name, "A");
    }

    #[test]
    fn test_tick_granularity_threshold() {
        let list = vec![series(1, "A")];

        let short = build_chart_frame(
            &[m(1, 1, 1.0, 0), m(2, 1, 1.0, TIME_OF_DAY_SPAN_MILLIS as i64 - 1)],
            &list,
        );
        assert_eq!(short.recommended_tick_granularity(), TickGranularity::TimeOfDay);

        let long = build_chart_frame(
            &[m(1, 1, 1.0, 0), m(2, 1, 1.0, TIME_OF_DAY_SPAN_MILLIS as i64)],
            &list,
        );
        assert_eq!(long.recommended_tick_granularity(), TickGranularity::Date);

        let empty = build_chart_frame::<Measurement>(&[], &list);
        assert!(empty.is_empty());
        assert_eq!(empty.recommended_tick_granularity(), TickGranularity::TimeOfDay);
    }

    #[test]
    fn test_extreme_timestamps_span() {
        let list = vec![series(1, "A")];
        let frame = build_chart_frame(
            &[m(1, 1, 1.0, -9_000_000_000_000_000_000), m(2, 1, 2.0, 9_000_000_000_000_000_000)],
            &list,
        );

        assert_eq!(frame.span_millis(), 18_000_000_000_000_000_000);
        assert_eq!(frame.recommended_tick_granularity(), TickGranularity::Date);

        let full = build_chart_frame(&[m(1, 1, 1.0, i64::MIN), m(2, 1, 2.0, i64::MAX)], &list);
        assert_eq!(full.span_millis(), u64::MAX);

        // Out of chrono's range: the label falls back to raw millis
        assert_eq!(
            TickGranularity::Date.label(i64::MAX),
            i64::MAX.to_string()
        );
    }

    #[test]
    fn test_tick_labels() {
        let ts = 1_700_000_000_000; // 2023-11-14T22:13:20Z
        assert_eq!(TickGranularity::TimeOfDay.label(ts), "22:13");
        assert_eq!(TickGranularity::Date.label(ts), "2023-11-14");
    }

    #[test]
    fn test_highlight_lookup() {
        let list = vec![series(1, "A")];
        let frame = build_chart_frame(&[m(1, 1, 5.0, 100), m(2, 1, 6.0, 200)], &list);

        let row = frame.highlighted(&Highlight::at(200)).unwrap();
        assert_eq!(row.get(SeriesId(1)), Some(6.0));

        // No match is simply no emphasis
        assert!(frame.highlighted(&Highlight::at(150)).is_none());
        assert!(frame.highlighted(&Highlight::none()).is_none());
    }
}
