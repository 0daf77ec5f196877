//! Decode throughput: bzip2 decompression, line splitting and header parsing.
//!
//! Run with: `cargo bench --package eddn-replay-bench`

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use eddn_replay_bench::archive;
use eddn_replay_fetch::{DEFAULT_MAX_LINE_BYTES, bz2_lines};
use eddn_replay_types::Record;
use std::hint::black_box;

const SIZES: [u64; 3] = [1_000, 10_000, 50_000];

fn fixture_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
}

fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for records in SIZES {
        let fixture = archive(fixture_day(), records);
        group.throughput(Throughput::Bytes(fixture.raw_bytes));

        group.bench_with_input(
            BenchmarkId::new("bz2_lines", records),
            &fixture.compressed,
            |b, compressed| {
                b.iter(|| {
                    let mut lines = 0u64;
                    for line in bz2_lines(compressed.as_slice(), DEFAULT_MAX_LINE_BYTES) {
                        black_box(line.unwrap());
                        lines += 1;
                    }
                    assert_eq!(lines, records);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("bz2_lines_and_header", records),
            &fixture.compressed,
            |b, compressed| {
                b.iter(|| {
                    for line in bz2_lines(compressed.as_slice(), DEFAULT_MAX_LINE_BYTES) {
                        let record = Record::from_line(&line.unwrap()).unwrap();
                        black_box(record.gateway_timestamp().len());
                    }
                });
            },
        );
    }

    group.finish();
}

fn header_benchmark(c: &mut Criterion) {
    let line = eddn_replay_bench::fsd_jump_record(fixture_day(), 7);

    let mut group = c.benchmark_group("header");
    group.throughput(Throughput::Elements(1));
    group.bench_function("from_line", |b| {
        b.iter(|| Record::from_line(black_box(line.as_bytes())).unwrap());
    });
    group.finish();
}

criterion_group!(benches, decode_benchmark, header_benchmark);
criterion_main!(benches);
