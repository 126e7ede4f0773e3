//! Loader performance benchmarks.
//!
//! Measures loading performance across export sizes, delimiters and both
//! load strategies.

use bmscheck::Loader;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::io::Write;
use tempfile::NamedTempFile;

/// Generate a synthetic trend export with the given rows and point columns.
fn generate_export(rows: usize, points: usize, delimiter: char) -> String {
    let mut data = String::from("Timestamp");
    for p in 0..points {
        data.push(delimiter);
        data.push_str(&format!("AHU{}_SAT", p + 1));
    }
    data.push('\n');

    for row in 0..rows {
        data.push_str(&format!(
            "2024-01-{:02} {:02}:{:02}:00",
            (row / 1440) % 28 + 1,
            (row / 60) % 24,
            row % 60
        ));
        for p in 0..points {
            data.push(delimiter);
            data.push_str(&format!("{:.1}", 55.0 + ((row * 7 + p) % 11) as f64 * 0.1));
        }
        data.push('\n');
    }

    data
}

fn write_temp(data: &str, suffix: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::with_suffix(suffix).unwrap();
    temp.write_all(data.as_bytes()).unwrap();
    temp
}

/// Benchmark in-memory loading of CSV exports of various sizes.
fn bench_load_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_csv");

    for rows in [100, 1_000, 10_000].iter() {
        let data = generate_export(*rows, 10, ',');
        let temp = write_temp(&data, ".csv");

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &temp, |b, temp| {
            let loader = Loader::new();
            b.iter(|| black_box(loader.load_path(temp.path()).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark in-memory loading of TSV exports.
fn bench_load_tsv(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_tsv");

    for rows in [1_000, 10_000].iter() {
        let data = generate_export(*rows, 10, '\t');
        let temp = write_temp(&data, ".tsv");

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &temp, |b, temp| {
            let loader = Loader::new();
            b.iter(|| black_box(loader.load_path(temp.path()).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark the chunked strategy's structural pass.
fn bench_load_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_chunked");

    for rows in [1_000, 10_000, 50_000].iter() {
        let data = generate_export(*rows, 10, ',');
        let temp = write_temp(&data, ".csv");

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows), &temp, |b, temp| {
            let loader = Loader::new().with_threshold_bytes(0);
            b.iter(|| black_box(loader.load_path(temp.path()).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark loading from a stream with no declared size.
fn bench_load_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_reader");

    let data = generate_export(10_000, 10, ',');
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("undeclared_size", |b| {
        let loader = Loader::new();
        b.iter(|| black_box(loader.load_reader(data.as_bytes(), "trend.csv", None).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_load_csv,
    bench_load_tsv,
    bench_load_chunked,
    bench_load_reader,
);
criterion_main!(benches);
