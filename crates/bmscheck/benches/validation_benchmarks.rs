//! Validation engine benchmarks.
//!
//! Measures end-to-end validation on generated exports with realistic
//! problems, for both load strategies.

use bmscheck::{
    BmsCheck, CancellationToken, InMemoryDataset, SourceMetadata, ValidationConfig,
    ValidationEngine,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use tempfile::NamedTempFile;

const POINTS: &[&str] = &["AHU1_SAT", "AHU1_RAT", "AHU1_MAT", "ZN1_RH", "ZN1_CO2", "SF_STS"];

/// Generate a noisy export with nulls, junk, spikes and range violations.
fn generate_rows(rows: usize) -> Vec<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(42);

    (0..rows)
        .map(|row| {
            let mut cells = vec![format!(
                "2024-01-{:02} {:02}:{:02}:00",
                (row / 1440) % 28 + 1,
                (row / 60) % 24,
                row % 60
            )];
            for (p, point) in POINTS.iter().enumerate() {
                let roll: f64 = rng.r#gen();
                let cell = if roll < 0.01 {
                    String::new()
                } else if roll < 0.012 {
                    "ERR#12".to_string()
                } else if roll < 0.013 {
                    "999.0".to_string()
                } else if point.ends_with("STS") {
                    if rng.gen_bool(0.5) { "1" } else { "0" }.to_string()
                } else {
                    let base = 50.0 + p as f64 * 10.0;
                    format!("{:.2}", base + rng.gen_range(-1.0..1.0))
                };
                cells.push(cell);
            }
            cells
        })
        .collect()
}

fn headers() -> Vec<String> {
    std::iter::once("Timestamp")
        .chain(POINTS.iter().copied())
        .map(String::from)
        .collect()
}

fn to_csv(rows: &[Vec<String>]) -> String {
    let mut data = headers().join(",");
    data.push('\n');
    for row in rows {
        data.push_str(&row.join(","));
        data.push('\n');
    }
    data
}

/// Benchmark the engine alone on in-memory datasets.
fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    let engine = ValidationEngine::new(ValidationConfig::default().resolve().unwrap());

    for rows in [1_000, 10_000, 50_000].iter() {
        let dataset = InMemoryDataset::new(headers(), generate_rows(*rows));

        group.throughput(Throughput::Elements((*rows * POINTS.len()) as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &dataset, |b, dataset| {
            b.iter(|| {
                black_box(
                    engine
                        .run(
                            dataset,
                            SourceMetadata::in_memory(dataset),
                            &CancellationToken::new(),
                        )
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

/// Benchmark file validation under both load strategies.
fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy");

    let data = to_csv(&generate_rows(20_000));
    let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
    temp.write_all(data.as_bytes()).unwrap();

    let in_memory = BmsCheck::new().unwrap();
    let chunked = BmsCheck::with_config(ValidationConfig {
        large_file_threshold_mb: 0,
        ..Default::default()
    })
    .unwrap();

    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("in_memory", |b| {
        b.iter(|| black_box(in_memory.validate_path(temp.path()).unwrap()))
    });
    group.bench_function("chunked", |b| {
        b.iter(|| black_box(chunked.validate_path(temp.path()).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_engine, bench_strategies);
criterion_main!(benches);
