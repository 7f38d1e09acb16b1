//! Core record types for the gaugeboard storage layer
//!
//! This module defines the persisted entities and the shapes used to create
//! and patch them:
//! - `Series`: a named, bounded numeric channel
//! - `Measurement`: one timestamped value owned by a series
//! - `MeasurementRecord`: a measurement joined with its series' display fields
//! - `User`: an account able to authenticate
//!
//! Timestamps are Unix epoch milliseconds throughout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Color used when a series is created without one
pub const DEFAULT_SERIES_COLOR: &str = "#8884d8";

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

record_id!(
    /// Opaque identifier of a series
    SeriesId
);
record_id!(
    /// Opaque identifier of a measurement
    MeasurementId
);
record_id!(
    /// Opaque identifier of a user account
    UserId
);

/// A named, bounded numeric channel
///
/// Invariant: `min_value < max_value`, both finite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub id: SeriesId,
    /// Unique, trimmed, non-empty
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    /// Display hint for renderers
    pub color: String,
}

/// A validated series candidate ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewSeries {
    pub name: String,
    pub min_value: f64,
    pub max_value: f64,
    pub color: String,
}

/// Partial update of a series; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeriesPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl SeriesPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Produce the candidate record this patch would leave behind.
    ///
    /// The stored record is never touched; callers validate the candidate as
    /// a whole before committing it.
    pub fn merge(&self, current: &Series) -> Series {
        Series {
            id: current.id,
            name: self
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            min_value: self.min_value.unwrap_or(current.min_value),
            max_value: self.max_value.unwrap_or(current.max_value),
            color: self.color.clone().unwrap_or_else(|| current.color.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.min_value.is_none()
            && self.max_value.is_none()
            && self.color.is_none()
    }
}

/// One timestamped value belonging to exactly one series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub id: MeasurementId,
    pub value: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub series_id: SeriesId,
}

/// A validated measurement candidate ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub value: f64,
    pub timestamp: i64,
    pub series_id: SeriesId,
}

/// Partial update of a measurement; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl MeasurementPatch {
    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn series(mut self, series_id: SeriesId) -> Self {
        self.series_id = Some(series_id);
        self
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Produce the candidate record with effective value and series resolved
    pub fn merge(&self, current: &Measurement) -> Measurement {
        Measurement {
            id: current.id,
            value: self.value.unwrap_or(current.value),
            timestamp: self.timestamp.unwrap_or(current.timestamp),
            series_id: self.series_id.unwrap_or(current.series_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.series_id.is_none() && self.timestamp.is_none()
    }
}

/// A measurement joined with its owning series' display fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    pub id: MeasurementId,
    pub value: f64,
    pub timestamp: i64,
    pub series_id: SeriesId,
    pub series_name: String,
    pub series_color: String,
}

impl MeasurementRecord {
    /// Strip the joined display fields
    pub fn measurement(&self) -> Measurement {
        Measurement {
            id: self.id,
            value: self.value,
            timestamp: self.timestamp,
            series_id: self.series_id,
        }
    }
}

/// Ordering of measurement listings by timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

/// Storage-side narrowing for `list_measurements`
///
/// Boundaries are inclusive on both ends. An empty `series_ids` means every
/// series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementQuery {
    pub series_ids: Vec<SeriesId>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub order: SortOrder,
}

impl MeasurementQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(mut self, id: SeriesId) -> Self {
        self.series_ids.push(id);
        self
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: i64) -> Self {
        self.end = Some(end);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

/// A user account able to authenticate
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// bcrypt string; embeds its own salt and cost
    pub password_hash: String,
}

/// A user account candidate ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}
