//! Command dispatch
//!
//! Every operation a client can request is a [`Command`]. [`Service::dispatch`]
//! runs the capability guard exactly once and only then touches a store, so
//! the stores themselves stay free of auth context.

use crate::auth::{authorize, Accounts, AuthError, AuthSettings, Caller, Operation};
use crate::storage::{
    Measurement, MeasurementId, MeasurementPatch, MeasurementQuery, MeasurementRecord,
    Repository, Series, SeriesId, SeriesPatch, SortOrder,
};
use crate::store::{Clock, SeriesDraft, StoreError, Stores};
use crate::view::{
    apply, build_chart_frame, build_table, ChartFrame, ChartRow, DashboardFilters,
    FilterWarning, Highlight, TableView, TickGranularity, ViewKind,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Shared filter values and highlight for a view request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewRequest {
    pub filters: DashboardFilters,
    pub highlight: Highlight,
}

#[derive(Debug, Clone)]
pub enum Command {
    ListSeries,
    CreateSeries(SeriesDraft),
    UpdateSeries { id: SeriesId, patch: SeriesPatch },
    DeleteSeries(SeriesId),
    ListMeasurements(MeasurementQuery),
    CreateMeasurement {
        value: f64,
        series_id: SeriesId,
        timestamp: Option<i64>,
    },
    UpdateMeasurement {
        id: MeasurementId,
        patch: MeasurementPatch,
    },
    DeleteMeasurement(MeasurementId),
    ChartView(ViewRequest),
    TableView(ViewRequest),
    ChangePassword { old: String, new: String },
}

impl Command {
    pub fn operation(&self) -> Operation {
        match self {
            Command::ListSeries => Operation::ListSeries,
            Command::CreateSeries(_) => Operation::CreateSeries,
            Command::UpdateSeries { .. } => Operation::UpdateSeries,
            Command::DeleteSeries(_) => Operation::DeleteSeries,
            Command::ListMeasurements(_) => Operation::ListMeasurements,
            Command::CreateMeasurement { .. } => Operation::CreateMeasurement,
            Command::UpdateMeasurement { .. } => Operation::UpdateMeasurement,
            Command::DeleteMeasurement(_) => Operation::DeleteMeasurement,
            Command::ChartView(_) => Operation::ChartView,
            Command::TableView(_) => Operation::TableView,
            Command::ChangePassword { .. } => Operation::ChangePassword,
        }
    }
}

/// Pivoted chart data plus the display hints a renderer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartReply {
    #[serde(flatten)]
    pub frame: ChartFrame,
    pub recommended_tick_granularity: TickGranularity,
    pub highlighted: Option<ChartRow>,
    pub warnings: Vec<FilterWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReply {
    #[serde(flatten)]
    pub table: TableView,
    pub warnings: Vec<FilterWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDeleted {
    pub id: SeriesId,
    pub measurements_removed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub ok: bool,
}

/// Result of a dispatched command. Serializes as its payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    SeriesList(Vec<Series>),
    Series(Series),
    SeriesDeleted(SeriesDeleted),
    Measurements(Vec<MeasurementRecord>),
    Measurement(Measurement),
    Chart(ChartReply),
    Table(TableReply),
    Ack(Ack),
}

#[derive(Clone)]
pub struct Service {
    stores: Stores,
    accounts: Accounts,
    repo: Arc<dyn Repository>,
}

impl Service {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, settings: AuthSettings) -> Self {
        Self {
            stores: Stores::new(Arc::clone(&repo), Arc::clone(&clock)),
            accounts: Accounts::new(Arc::clone(&repo), clock, settings),
            repo,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    /// Authorize and run one command
    pub async fn dispatch(&self, caller: Option<&Caller>, command: Command) -> ServiceResult<Reply> {
        authorize(caller, command.operation())?;

        let reply = match command {
            Command::ListSeries => Reply::SeriesList(self.stores.series.list().await?),
            Command::CreateSeries(draft) => Reply::Series(self.stores.series.create(draft).await?),
            Command::UpdateSeries { id, patch } => {
                Reply::Series(self.stores.series.update(id, patch).await?)
            }
            Command::DeleteSeries(id) => Reply::SeriesDeleted(SeriesDeleted {
                id,
                measurements_removed: self.stores.series.delete(id).await?,
            }),
            Command::ListMeasurements(query) => {
                Reply::Measurements(self.stores.measurements.list(&query).await?)
            }
            Command::CreateMeasurement {
                value,
                series_id,
                timestamp,
            } => Reply::Measurement(
                self.stores
                    .measurements
                    .create(value, series_id, timestamp)
                    .await?,
            ),
            Command::UpdateMeasurement { id, patch } => {
                Reply::Measurement(self.stores.measurements.update(id, patch).await?)
            }
            Command::DeleteMeasurement(id) => {
                self.stores.measurements.delete(id).await?;
                Reply::Ack(Ack { ok: true })
            }
            Command::ChartView(request) => Reply::Chart(self.chart_view(&request).await?),
            Command::TableView(request) => Reply::Table(self.table_view(&request).await?),
            Command::ChangePassword { old, new } => {
                // authorize() has already rejected a missing caller
                let caller = caller.ok_or(AuthError::Unauthenticated)?;
                self.accounts.change_password(caller, &old, &new).await?;
                Reply::Ack(Ack { ok: true })
            }
        };
        Ok(reply)
    }

    async fn chart_view(&self, request: &ViewRequest) -> ServiceResult<ChartReply> {
        let state = request.filters.for_view(ViewKind::Chart);
        let all_series = self.stores.series.list().await?;
        let records = self
            .stores
            .measurements
            .list(&MeasurementQuery::new().order(SortOrder::Ascending))
            .await?;

        let visible = apply(&records, &state);

        // A filtered chart only draws the selected series
        let columns: Vec<Series> = if state.enabled && !state.series_selection.is_empty() {
            all_series
                .into_iter()
                .filter(|s| state.series_selection.contains(&s.id))
                .collect()
        } else {
            all_series
        };

        let frame = build_chart_frame(&visible, &columns);
        Ok(ChartReply {
            recommended_tick_granularity: frame.recommended_tick_granularity(),
            highlighted: frame.highlighted(&request.highlight).cloned(),
            warnings: state.warning().into_iter().collect(),
            frame,
        })
    }

    async fn table_view(&self, request: &ViewRequest) -> ServiceResult<TableReply> {
        let state = request.filters.for_view(ViewKind::Table);
        let records = self.stores.measurements.list(&MeasurementQuery::new()).await?;
        let visible = apply(&records, &state);

        Ok(TableReply {
            table: build_table(&visible, request.highlight),
            warnings: state.warning().into_iter().collect(),
        })
    }
}
