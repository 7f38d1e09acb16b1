//! Table shaping
//!
//! One row per measurement, joined with its series' name and color. A row
//! can be selected (setting the shared [`Highlight`]) or opened as an
//! [`EditDraft`] whose text fields turn into a partial update on commit.

use crate::storage::{MeasurementId, MeasurementPatch, MeasurementRecord, SeriesId};
use crate::store::validate::{parse_number, RangeError};
use crate::time::{format_instant, parse_instant, InstantError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The timestamp a table selection points at, shared with the chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub timestamp: Option<i64>,
}

impl Highlight {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }

    pub fn matches(&self, timestamp: i64) -> bool {
        self.timestamp == Some(timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: MeasurementId,
    pub value: f64,
    pub timestamp: i64,
    pub series_id: SeriesId,
    pub series_name: String,
    pub series_color: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub highlight: Highlight,
}

impl TableView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Select a row by measurement id, moving the highlight to its timestamp.
    ///
    /// Unknown ids leave the highlight unchanged.
    pub fn select(&mut self, id: MeasurementId) -> Highlight {
        if let Some(ts) = self.rows.iter().find(|r| r.id == id).map(|r| r.timestamp) {
            self.highlight = Highlight::at(ts);
            for row in &mut self.rows {
                row.highlighted = row.timestamp == ts;
            }
        }
        self.highlight
    }

    pub fn find(&self, id: MeasurementId) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.id == id)
    }
}

/// Shape joined records into table rows, keeping input order
pub fn build_table(records: &[MeasurementRecord], highlight: Highlight) -> TableView {
    TableView {
        rows: records
            .iter()
            .map(|r| TableRow {
                id: r.id,
                value: r.value,
                timestamp: r.timestamp,
                series_id: r.series_id,
                series_name: r.series_name.clone(),
                series_color: r.series_color.clone(),
                highlighted: highlight.matches(r.timestamp),
            })
            .collect(),
        highlight,
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error(transparent)]
    Number(#[from] RangeError),

    #[error(transparent)]
    Timestamp(#[from] InstantError),
}

/// A table row opened for editing.
///
/// Value and timestamp are held as the text a user types; the series is
/// picked from a list so it stays typed.
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    pub id: MeasurementId,
    pub value: String,
    pub timestamp: String,
    pub series_id: SeriesId,
    original_value: f64,
    original_timestamp: i64,
    original_series: SeriesId,
}

impl EditDraft {
    pub fn from_row(row: &TableRow) -> Self {
        Self {
            id: row.id,
            value: row.value.to_string(),
            timestamp: format_instant(row.timestamp),
            series_id: row.series_id,
            original_value: row.value,
            original_timestamp: row.timestamp,
            original_series: row.series_id,
        }
    }

    /// Parse the draft into a patch holding only the fields that changed
    pub fn commit(&self) -> Result<MeasurementPatch, EditError> {
        let value = parse_number("value", &self.value)?;
        let timestamp = parse_instant(&self.timestamp)?;

        let mut patch = MeasurementPatch::default();
        if value != self.original_value {
            patch = patch.value(value);
        }
        if timestamp != self.original_timestamp {
            patch = patch.timestamp(timestamp);
        }
        if self.series_id != self.original_series {
            patch = patch.series(self.series_id);
        }
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, series: i64, value: f64, timestamp: i64) -> MeasurementRecord {
        MeasurementRecord {
            id: MeasurementId(id),
            value,
            timestamp,
            series_id: SeriesId(series),
            series_name: format!("S{}", series),
            series_color: "#36a2eb".to_string(),
        }
    }

    #[test]
    fn test_rows_carry_series_display_fields() {
        let table = build_table(&[record(1, 2, 3.5, 100)], Highlight::none());
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].series_name, "S2");
        assert_eq!(table.rows[0].series_color, "#36a2eb");
        assert!(!table.rows[0].highlighted);
    }

    #[test]
    fn test_select_moves_highlight() {
        let mut table = build_table(
            &[record(1, 1, 1.0, 300), record(2, 2, 2.0, 300), record(3, 1, 3.0, 100)],
            Highlight::at(100),
        );
        assert!(table.rows[2].highlighted);

        let highlight = table.select(MeasurementId(1));
        assert_eq!(highlight, Highlight::at(300));
        // Every row at the selected instant is emphasized
        let flags: Vec<bool> = table.rows.iter().map(|r| r.highlighted).collect();
        assert_eq!(flags, vec![true, true, false]);

        assert_eq!(table.select(MeasurementId(99)), Highlight::at(300));
    }

    #[test]
    fn test_unchanged_draft_commits_empty_patch() {
        let table = build_table(&[record(1, 1, 21.5, 1_700_000_000_000)], Highlight::none());
        let draft = EditDraft::from_row(&table.rows[0]);
        assert_eq!(draft.value, "21.5");
        assert_eq!(draft.timestamp, "2023-11-14T22:13:20.000Z");
        assert!(draft.commit().unwrap().is_empty());
    }

    #[test]
    fn test_draft_commit_only_changed_fields() {
        let table = build_table(&[record(1, 1, 21.5, 1_700_000_000_000)], Highlight::none());
        let mut draft = EditDraft::from_row(&table.rows[0]);
        draft.value = " 22 ".to_string();
        draft.series_id = SeriesId(2);

        let patch = draft.commit().unwrap();
        assert_eq!(patch.value, Some(22.0));
        assert_eq!(patch.series_id, Some(SeriesId(2)));
        assert_eq!(patch.timestamp, None);
    }

    #[test]
    fn test_draft_rejects_bad_text() {
        let table = build_table(&[record(1, 1, 21.5, 0)], Highlight::none());

        let mut draft = EditDraft::from_row(&table.rows[0]);
        draft.value = "warm".to_string();
        assert!(matches!(
            draft.commit(),
            Err(EditError::Number(RangeError::NotANumber { field: "value", .. }))
        ));

        let mut draft = EditDraft::from_row(&table.rows[0]);
        draft.timestamp = "tuesday".to_string();
        assert!(matches!(draft.commit(), Err(EditError::Timestamp(_))));
    }
}
