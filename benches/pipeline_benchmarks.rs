use btc_price_gateway::application::analytics::{
    compare_recent, filter_by_timeframe, merge_chart_series,
};
use btc_price_gateway::application::PriceDataService;
use btc_price_gateway::domain::{MarketChartResponse, Timeframe};
use btc_price_gateway::infrastructure::{CoinGeckoClient, FixedClock, SeededRandom};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

fn service() -> PriceDataService {
    // Never contacted: the benchmarks only exercise local generation
    let client = CoinGeckoClient::with_base_url("http://127.0.0.1:9").unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
    PriceDataService::new(
        Arc::new(client),
        Arc::new(FixedClock(now)),
        Arc::new(SeededRandom::new(42)),
    )
}

/// Benchmark synthetic series generation across horizons
fn benchmark_synthetic_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthetic_series");
    let service = service();

    for days in [7u32, 30, 365] {
        group.bench_with_input(BenchmarkId::from_parameter(days), &days, |b, &days| {
            b.iter(|| black_box(service.synthetic_series(days)));
        });
    }

    group.finish();
}

/// Benchmark the derived views over a year of daily points
fn benchmark_derived_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("derived_views");
    let service = service();
    let now = service.clock().now();
    let historical = service.synthetic_series(365);
    let predicted = service.synthetic_series(7);

    group.bench_function("compare_recent", |b| {
        b.iter(|| black_box(compare_recent(&historical, &predicted, now)));
    });

    for timeframe in Timeframe::ALL {
        group.bench_with_input(
            BenchmarkId::new("filter_by_timeframe", timeframe.as_str()),
            &timeframe,
            |b, &tf| b.iter(|| black_box(filter_by_timeframe(&historical, tf, now))),
        );
    }

    group.bench_function("merge_chart_series", |b| {
        b.iter(|| black_box(merge_chart_series(&historical, &predicted)));
    });

    group.finish();
}

/// Benchmark parsing a year-long market chart payload
fn benchmark_json_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_operations");

    let start_ms = 1_704_067_200_000f64;
    let prices: Vec<[f64; 2]> = (0..365)
        .map(|i| [start_ms + i as f64 * 86_400_000.0, 42_000.0 + i as f64 * 10.0])
        .collect();
    let body = serde_json::to_string(&serde_json::json!({ "prices": prices })).unwrap();

    group.bench_function("parse_market_chart", |b| {
        b.iter(|| {
            let parsed: MarketChartResponse = serde_json::from_str(black_box(&body)).unwrap();
            black_box(parsed);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_synthetic_series,
    benchmark_derived_views,
    benchmark_json_operations
);
criterion_main!(benches);
