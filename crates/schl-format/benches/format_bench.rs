//! Benchmarks for SCHl recognition: header parsing and body scans.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use schl_format::block::{scan_total_samples, BlockWalker};
use schl_format::{parse_header, Recognizer, SliceSource};

/// Header with every commonly seen tag, on PC.
fn header_stream() -> Vec<u8> {
    let mut out = vec![b'P', b'T', 0x00, 0x00];
    for (tag, value) in [
        (0x06u8, 0x65u32),
        (0x80, 3),
        (0x82, 2),
        (0xA0, 0x0A),
        (0x84, 44100),
        (0x85, 441_000),
        (0x86, 0),
        (0x87, 440_000),
    ] {
        out.push(tag);
        out.push(4);
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.push(0xFF);
    while (out.len() + 8) % 4 != 0 {
        out.push(0);
    }
    out
}

fn block(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32 + 8).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// A full stream with `blocks` data blocks of 1 KiB each.
fn build_file(blocks: u32) -> Vec<u8> {
    let mut file = block(b"SCHl", &header_stream());
    file.extend(block(b"SCCl", &blocks.to_le_bytes()));
    let mut payload = 441u32.to_le_bytes().to_vec();
    payload.resize(1024, 0x33);
    for _ in 0..blocks {
        file.extend(block(b"SCDl", &payload));
    }
    file.extend(block(b"SCEl", &[]));
    file
}

fn bench_parse_header(c: &mut Criterion) {
    let header = header_stream();
    c.bench_function("parse_header", |b| {
        b.iter(|| {
            let desc = parse_header(black_box(header.as_slice()), 0, header.len() as u64).unwrap();
            black_box(desc);
        });
    });
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_walk");
    for blocks in [16u32, 256, 4096] {
        let file = build_file(blocks);
        group.bench_with_input(BenchmarkId::new("blocks", blocks), &file, |b, file| {
            b.iter(|| black_box(BlockWalker::new(file.as_slice(), 0).count()));
        });
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_total_samples");
    for blocks in [16u32, 256, 4096] {
        let file = build_file(blocks);
        let header_size = header_stream().len() as u64 + 8;
        let desc = parse_header(file.as_slice(), 8, header_size - 8).unwrap();
        group.bench_with_input(BenchmarkId::new("blocks", blocks), &file, |b, file| {
            b.iter(|| {
                let total =
                    scan_total_samples(black_box(file.as_slice()), header_size, &desc).unwrap();
                black_box(total);
            });
        });
    }
    group.finish();
}

fn bench_recognize(c: &mut Criterion) {
    let mut group = c.benchmark_group("recognize");
    let recognizer = Recognizer::new();
    for blocks in [16u32, 4096] {
        let file = build_file(blocks);
        group.bench_with_input(BenchmarkId::new("blocks", blocks), &file, |b, file| {
            b.iter(|| {
                let source = SliceSource::new(black_box(file));
                black_box(recognizer.recognize(&source, "bench.asf").unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_header,
    bench_walk,
    bench_scan,
    bench_recognize
);
criterion_main!(benches);
