//! Data Transfer Objects
//!
//! Request and response types for the API endpoints. Numeric fields arrive
//! either as JSON numbers or as the strings a form input produces, so they
//! deserialize into [`NumberInput`] and are parsed explicitly.

use crate::auth::Session;
use crate::service::ViewRequest;
use crate::storage::{MeasurementPatch, MeasurementQuery, SeriesId, SeriesPatch, SortOrder};
use crate::store::validate::{ensure_finite, parse_number, RangeError};
use crate::store::SeriesDraft;
use crate::time::{parse_instant, InstantError};
use crate::view::{DashboardFilters, Highlight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::error::ApiError;

// ============================================
// INPUT PRIMITIVES
// ============================================

/// A number sent as a JSON number or as text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    pub fn resolve(&self, field: &'static str) -> Result<f64, RangeError> {
        match self {
            NumberInput::Number(n) => ensure_finite(field, *n),
            NumberInput::Text(s) => parse_number(field, s),
        }
    }
}

/// An instant sent as epoch milliseconds or as text (RFC 3339 or relative)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InstantInput {
    Millis(i64),
    Text(String),
}

impl InstantInput {
    pub fn resolve(&self) -> Result<i64, InstantError> {
        match self {
            InstantInput::Millis(ms) => Ok(*ms),
            InstantInput::Text(s) => parse_instant(s),
        }
    }
}

/// A record id sent as a number or a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Id(i64),
    Text(String),
}

impl IdInput {
    pub fn resolve(&self, field: &'static str) -> Result<i64, ApiError> {
        match self {
            IdInput::Id(id) => Ok(*id),
            IdInput::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ApiError::Validation(format!("{} is not a valid id: {}", field, s))),
        }
    }
}

/// Comma separated series ids, e.g. `1,2,5`
pub fn parse_series_list(input: &str) -> Result<Vec<SeriesId>, ApiError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map(SeriesId)
                .map_err(|_| ApiError::Validation(format!("Invalid series id: {}", s)))
        })
        .collect()
}

fn resolve_instant(input: Option<&String>) -> Result<Option<i64>, ApiError> {
    input
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_instant(s))
        .transpose()
        .map_err(ApiError::from)
}

// ============================================
// USER DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    pub old_password: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub username: String,
    pub is_guest: bool,
    pub expires_at: i64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            username: session.caller.name,
            is_guest: session.caller.is_guest,
            expires_at: session.expires_at,
        }
    }
}

// ============================================
// SERIES DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateSeriesRequest {
    pub name: String,
    pub min_value: NumberInput,
    pub max_value: NumberInput,
    #[serde(default)]
    pub color: Option<String>,
}

impl CreateSeriesRequest {
    pub fn into_draft(self) -> Result<SeriesDraft, RangeError> {
        let mut draft = SeriesDraft::new(
            self.name,
            self.min_value.resolve("min_value")?,
            self.max_value.resolve("max_value")?,
        );
        draft.color = self.color;
        Ok(draft)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSeriesRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub min_value: Option<NumberInput>,
    #[serde(default)]
    pub max_value: Option<NumberInput>,
    #[serde(default)]
    pub color: Option<String>,
}

impl UpdateSeriesRequest {
    pub fn into_patch(self) -> Result<SeriesPatch, RangeError> {
        Ok(SeriesPatch {
            name: self.name,
            min_value: self.min_value.map(|n| n.resolve("min_value")).transpose()?,
            max_value: self.max_value.map(|n| n.resolve("max_value")).transpose()?,
            color: self.color,
        })
    }
}

// ============================================
// MEASUREMENT DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct CreateMeasurementRequest {
    pub value: NumberInput,
    #[serde(alias = "series")]
    pub series_id: IdInput,
    /// Defaults to now when absent or null
    #[serde(default)]
    pub timestamp: Option<InstantInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeasurementRequest {
    #[serde(default)]
    pub value: Option<NumberInput>,
    #[serde(default, alias = "series")]
    pub series_id: Option<IdInput>,
    #[serde(default)]
    pub timestamp: Option<InstantInput>,
}

impl UpdateMeasurementRequest {
    pub fn into_patch(self) -> Result<MeasurementPatch, ApiError> {
        Ok(MeasurementPatch {
            value: self.value.map(|n| n.resolve("value")).transpose()?,
            series_id: self
                .series_id
                .map(|id| id.resolve("series_id").map(SeriesId))
                .transpose()?,
            timestamp: self.timestamp.map(|t| t.resolve()).transpose()?,
        })
    }
}

/// Query string for `GET /api/v1/measurements`
#[derive(Debug, Default, Deserialize)]
pub struct MeasurementListParams {
    #[serde(default, alias = "seriesId")]
    pub series: Option<String>,
    #[serde(default, alias = "startDate")]
    pub start: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end: Option<String>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

impl MeasurementListParams {
    pub fn into_query(self) -> Result<MeasurementQuery, ApiError> {
        let mut query = MeasurementQuery::new();
        if let Some(series) = self.series.as_deref() {
            query.series_ids = parse_series_list(series)?;
        }
        query.start = resolve_instant(self.start.as_ref())?;
        query.end = resolve_instant(self.end.as_ref())?;
        if let Some(order) = self.order {
            query.order = order;
        }
        Ok(query)
    }
}

// ============================================
// VIEW DTOs
// ============================================

/// Query string shared by the chart and table views
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub chart_filter: Option<bool>,
    #[serde(default)]
    pub table_filter: Option<bool>,
    #[serde(default)]
    pub highlight: Option<String>,
}

impl ViewParams {
    pub fn into_request(self) -> Result<ViewRequest, ApiError> {
        let series_selection: BTreeSet<SeriesId> = match self.series.as_deref() {
            Some(s) => parse_series_list(s)?.into_iter().collect(),
            None => BTreeSet::new(),
        };

        Ok(ViewRequest {
            filters: DashboardFilters {
                start_time: resolve_instant(self.start.as_ref())?,
                end_time: resolve_instant(self.end.as_ref())?,
                series_selection,
                chart_enabled: self.chart_filter.unwrap_or(true),
                table_enabled: self.table_filter.unwrap_or(true),
            },
            highlight: Highlight {
                timestamp: resolve_instant(self.highlight.as_ref())?,
            },
        })
    }
}

// ============================================
// HEALTH DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub series: usize,
    pub measurements: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_input_accepts_numbers_and_text() {
        let n: NumberInput = serde_json::from_str("21.5").unwrap();
        assert_eq!(n.resolve("value"), Ok(21.5));

        let t: NumberInput = serde_json::from_str(r#"" -3 ""#).unwrap();
        assert_eq!(t.resolve("value"), Ok(-3.0));

        let bad: NumberInput = serde_json::from_str(r#""warm""#).unwrap();
        assert!(matches!(
            bad.resolve("value"),
            Err(RangeError::NotANumber { field: "value", .. })
        ));
    }

    #[test]
    fn test_create_measurement_accepts_original_field_names() {
        let req: CreateMeasurementRequest =
            serde_json::from_str(r#"{"series": "3", "value": "12", "timestamp": null}"#).unwrap();
        assert_eq!(req.series_id.resolve("series_id").unwrap(), 3);
        assert_eq!(req.value.resolve("value"), Ok(12.0));
        assert!(req.timestamp.is_none());

        let req: CreateMeasurementRequest = serde_json::from_str(
            r#"{"series_id": 3, "value": 12, "timestamp": "2023-11-14T22:13:20Z"}"#,
        )
        .unwrap();
        assert_eq!(req.timestamp.unwrap().resolve(), Ok(1_700_000_000_000));
    }

    #[test]
    fn test_update_measurement_patch() {
        let req: UpdateMeasurementRequest =
            serde_json::from_str(r#"{"value": 5, "timestamp": 1000}"#).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.value, Some(5.0));
        assert_eq!(patch.timestamp, Some(1000));
        assert_eq!(patch.series_id, None);
    }

    #[test]
    fn test_series_list() {
        assert_eq!(
            parse_series_list("1, 2,,5").unwrap(),
            vec![SeriesId(1), SeriesId(2), SeriesId(5)]
        );
        assert!(parse_series_list("1,x").is_err());
    }

    #[test]
    fn test_view_params() {
        let params = ViewParams {
            start: Some("1000".into()),
            end: Some("".into()),
            series: Some("2".into()),
            chart_filter: Some(false),
            table_filter: None,
            highlight: Some("1500".into()),
        };
        let request = params.into_request().unwrap();
        assert_eq!(request.filters.start_time, Some(1000));
        assert_eq!(request.filters.end_time, None);
        assert!(request.filters.series_selection.contains(&SeriesId(2)));
        assert!(!request.filters.chart_enabled);
        assert!(request.filters.table_enabled);
        assert_eq!(request.highlight, Highlight::at(1500));
    }
}
