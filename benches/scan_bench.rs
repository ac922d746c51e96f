//! Benchmarks for tablefile scan and seek paths

use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};
use tablefile::{Codec, TableBuilder, TableOptions, TableReader};

/// Build a 100k-entry table in memory.
fn build_fixture(codec: Codec) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut builder = TableBuilder::new(
        &mut buf,
        TableOptions::builder().block_size(64 * 1024).codec(codec).build(),
    );
    for i in 0..100_000u32 {
        let key = format!("key{:08}", i);
        let value = format!("value-for-entry-number-{:08}", i);
        builder.add(key.as_bytes(), value.as_bytes()).unwrap();
    }
    builder.finish().unwrap();
    buf
}

fn open(bytes: &[u8]) -> TableReader<Cursor<Vec<u8>>> {
    TableReader::open(
        Cursor::new(bytes.to_vec()),
        bytes.len() as u64,
        TableOptions::default(),
    )
    .unwrap()
}

fn scan_benchmarks(c: &mut Criterion) {
    let raw = build_fixture(Codec::None);
    let snappy = build_fixture(Codec::Snappy);

    c.bench_function("full_scan_100k_raw", |b| {
        b.iter(|| {
            let mut reader = open(&raw);
            let mut n = 0u64;
            reader.rewind().unwrap();
            while !reader.at_end() {
                n += reader.entry().unwrap().value.len() as u64;
                reader.advance().unwrap();
            }
            n
        })
    });

    c.bench_function("full_scan_100k_snappy", |b| {
        b.iter(|| {
            let mut reader = open(&snappy);
            let mut n = 0u64;
            reader.rewind().unwrap();
            while !reader.at_end() {
                n += reader.entry().unwrap().value.len() as u64;
                reader.advance().unwrap();
            }
            n
        })
    });

    c.bench_function("seek_random_1k", |b| {
        let mut reader = open(&raw);
        let mut state = 0x9e3779b9u32;
        b.iter(|| {
            let mut hits = 0u32;
            for _ in 0..1_000 {
                // xorshift for cheap pseudo-random targets
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let key = format!("key{:08}", state % 100_000);
                if reader.seek_to(key.as_bytes()).unwrap() {
                    hits += 1;
                }
            }
            hits
        })
    });
}

criterion_group!(benches, scan_benchmarks);
criterion_main!(benches);
