//! Gaugeboard demo
//!
//! Opens the configured database, seeds the demo sensor series when it is
//! empty, and prints a summary of the chart and table views.

use gaugeboard::config::Config;
use gaugeboard::logging;
use gaugeboard::seed::seed_demo;
use gaugeboard::storage::{MeasurementQuery, SortOrder, SqliteRepository};
use gaugeboard::store::{Clock, Stores, SystemClock};
use gaugeboard::view::{apply, build_chart_frame, build_table, FilterState, Highlight};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    logging::init(&config.logging, "");

    tracing::info!("Gaugeboard v{}", env!("CARGO_PKG_VERSION"));

    let location = config.storage.location();
    tracing::info!("Database: {:?}", location);

    let repo = Arc::new(SqliteRepository::open_location(
        &location,
        config.storage.busy_timeout(),
    )?);
    let clock = Arc::new(SystemClock);
    let stores = Stores::new(repo, clock.clone());

    let mut rng = rand::rng();
    if let Some(summary) = seed_demo(&stores, &mut rng, clock.now_millis()).await? {
        tracing::info!(
            "Seeded {} series with {} measurements",
            summary.series.len(),
            summary.measurements
        );
    }

    report(&stores, clock.now_millis()).await?;
    Ok(())
}

/// Per-series statistics for the last day plus the chart frame shape
async fn report(stores: &Stores, now: i64) -> anyhow::Result<()> {
    let series = stores.series.list().await?;
    let records = stores
        .measurements
        .list(&MeasurementQuery::new().order(SortOrder::Ascending))
        .await?;

    let last_day = FilterState::new().start(now - 24 * 3_600_000).end(now);
    let recent = apply(&records, &last_day);

    for s in &series {
        let values: Vec<f64> = recent
            .iter()
            .filter(|r| r.series_id == s.id)
            .map(|r| r.value)
            .collect();
        if values.is_empty() {
            tracing::info!("{} (24h): no readings", s.name);
            continue;
        }

        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        tracing::info!(
            "{} (24h): {} readings, avg={:.1}, min={:.1}, max={:.1} [bounds {} .. {}]",
            s.name,
            values.len(),
            avg,
            min,
            max,
            s.min_value,
            s.max_value
        );
    }

    let frame = build_chart_frame(&records, &series);
    let granularity = frame.recommended_tick_granularity();
    tracing::info!(
        "Chart: {} rows x {} series, ticks by {:?}",
        frame.len(),
        frame.columns.len(),
        granularity
    );
    if let (Some(first), Some(last)) = (frame.rows.first(), frame.rows.last()) {
        tracing::info!(
            "Chart spans {} .. {}",
            granularity.label(first.timestamp),
            granularity.label(last.timestamp)
        );
    }

    let newest = records.last().map(|r| r.timestamp);
    let table = build_table(
        &apply(&records, &FilterState::new()),
        newest.map(Highlight::at).unwrap_or_default(),
    );
    let highlighted = table.rows.iter().filter(|r| r.highlighted).count();
    tracing::info!(
        "Table: {} rows, {} highlighted at the newest instant",
        table.len(),
        highlighted
    );

    Ok(())
}
