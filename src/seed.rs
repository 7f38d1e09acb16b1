//! Demo data
//!
//! Three sensor series and a hundred hourly readings spread round-robin
//! across them, newest at `now`.

use crate::storage::Series;
use crate::store::{SeriesDraft, StoreResult, Stores};
use rand::Rng;

const HOUR_MILLIS: i64 = 3_600_000;

pub const DEMO_MEASUREMENTS: usize = 100;

/// (name, min, max, color)
pub const DEMO_SERIES: [(&str, f64, f64, &str); 3] = [
    ("Temperature", -20.0, 50.0, "#ff6384"),
    ("Humidity", 0.0, 100.0, "#36a2eb"),
    ("Pressure", 900.0, 1100.0, "#cc65fe"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub series: Vec<Series>,
    pub measurements: usize,
}

/// A uniformly random value within a series' bounds
pub fn random_reading<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    rng.random_range(min..=max)
}

/// Seed an empty database. Returns `None` when series already exist.
pub async fn seed_demo<R: Rng + ?Sized>(
    stores: &Stores,
    rng: &mut R,
    now: i64,
) -> StoreResult<Option<SeedSummary>> {
    if !stores.series.list().await?.is_empty() {
        tracing::info!("Database already has series, skipping demo seed");
        return Ok(None);
    }

    let mut series = Vec::with_capacity(DEMO_SERIES.len());
    for (name, min, max, color) in DEMO_SERIES {
        series.push(
            stores
                .series
                .create(SeriesDraft::new(name, min, max).color(color))
                .await?,
        );
    }

    for i in 0..DEMO_MEASUREMENTS {
        let target = &series[i % series.len()];
        let value = random_reading(rng, target.min_value, target.max_value);
        let timestamp = now - i as i64 * HOUR_MILLIS;
        stores
            .measurements
            .create(value, target.id, Some(timestamp))
            .await?;
    }

    tracing::info!(
        series = series.len(),
        measurements = DEMO_MEASUREMENTS,
        "Seeded demo data"
    );
    Ok(Some(SeedSummary {
        series,
        measurements: DEMO_MEASUREMENTS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MeasurementQuery, SqliteRepository};
    use crate::store::FixedClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seed_demo_once() {
        let repo = Arc::new(SqliteRepository::open_in_memory().unwrap());
        let stores = Stores::new(repo, Arc::new(FixedClock::new(0)));
        let mut rng = StdRng::seed_from_u64(7);
        let now = 1_700_000_000_000;

        let summary = seed_demo(&stores, &mut rng, now).await.unwrap().unwrap();
        assert_eq!(summary.series.len(), 3);
        assert_eq!(summary.series[2].color, "#cc65fe");

        let records = stores
            .measurements
            .list(&MeasurementQuery::new())
            .await
            .unwrap();
        assert_eq!(records.len(), DEMO_MEASUREMENTS);
        assert_eq!(records[0].timestamp, now);
        assert_eq!(records[0].series_name, "Temperature");
        assert_eq!(records[99].timestamp, now - 99 * HOUR_MILLIS);

        // Second run leaves the data alone
        assert!(seed_demo(&stores, &mut rng, now).await.unwrap().is_none());
        assert_eq!(stores.measurements.count().await.unwrap(), DEMO_MEASUREMENTS);
    }

    #[test]
    fn test_random_reading_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let v = random_reading(&mut rng, 900.0, 1100.0);
            assert!((900.0..=1100.0).contains(&v));
        }
    }
}
