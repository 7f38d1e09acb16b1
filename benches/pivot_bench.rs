//! Benchmarks for the view pipeline and the measurement store
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use gaugeboard::storage::{
    MeasurementId, MeasurementQuery, MeasurementRecord, Series, SeriesId, SqliteRepository,
};
use gaugeboard::store::{FixedClock, SeriesDraft, Stores};
use gaugeboard::view::{apply, build_chart_frame, build_table, FilterState, Highlight};
use std::sync::Arc;

const MINUTE: i64 = 60_000;

fn series_list(count: i64) -> Vec<Series> {
    (1..=count)
        .map(|i| Series {
            id: SeriesId(i),
            name: format!("sensor-{}", i),
            min_value: 0.0,
            max_value: 100.0,
            color: "#8884d8".to_string(),
        })
        .collect()
}

/// Readings from every series each minute, so rows share timestamps
fn records(count: usize, series: &[Series]) -> Vec<MeasurementRecord> {
    (0..count)
        .map(|i| {
            let s = &series[i % series.len()];
            MeasurementRecord {
                id: MeasurementId(i as i64 + 1),
                value: (i % 100) as f64,
                timestamp: (i / series.len()) as i64 * MINUTE,
                series_id: s.id,
                series_name: s.name.clone(),
                series_color: s.color.clone(),
            }
        })
        .collect()
}

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");
    let series = series_list(5);

    for size in [1_000, 10_000, 100_000] {
        let data = records(size, &series);
        let span = (size / series.len()) as i64 * MINUTE;
        let window = FilterState::new()
            .start(span / 4)
            .end(span * 3 / 4)
            .select(SeriesId(1))
            .select(SeriesId(3));

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("filter_{}", size), |b| {
            b.iter(|| apply(black_box(&data), black_box(&window)))
        });

        group.bench_function(format!("chart_frame_{}", size), |b| {
            b.iter(|| build_chart_frame(black_box(&data), black_box(&series)))
        });

        group.bench_function(format!("table_{}", size), |b| {
            b.iter(|| build_table(black_box(&data), Highlight::at(span / 2)))
        });
    }

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("store");

    group.bench_function("create_measurement", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let repo = Arc::new(SqliteRepository::open_in_memory().unwrap());
                let stores = Stores::new(repo, Arc::new(FixedClock::new(0)));
                let series = stores
                    .series
                    .create(SeriesDraft::new("bench", 0.0, 100.0))
                    .await
                    .unwrap();

                let start = std::time::Instant::now();

                for i in 0..iters {
                    stores
                        .measurements
                        .create((i % 100) as f64, series.id, Some(i as i64))
                        .await
                        .unwrap();
                }

                start.elapsed()
            })
        });
    });

    group.bench_function("list_week", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let repo = Arc::new(SqliteRepository::open_in_memory().unwrap());
                let stores = Stores::new(repo, Arc::new(FixedClock::new(0)));
                let series = stores
                    .series
                    .create(SeriesDraft::new("bench", 0.0, 100.0))
                    .await
                    .unwrap();

                // Setup: a week of hourly readings
                for i in 0..168 {
                    stores
                        .measurements
                        .create(50.0, series.id, Some(i * 60 * MINUTE))
                        .await
                        .unwrap();
                }

                let query = MeasurementQuery::new().series(series.id);

                let start = std::time::Instant::now();

                for _ in 0..iters {
                    let _ = stores.measurements.list(black_box(&query)).await.unwrap();
                }

                start.elapsed()
            })
        });
    });

    group.finish();
}

criterion_group!(benches, bench_views, bench_store);
criterion_main!(benches);
