//! Criterion benchmark untuk Ring Buffer
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ringlat::core::{Backing, RingBuffer};
use ringlat::harness::{pingpong, PingPongConfig, RECORD_SIZE};

const CAPACITY: usize = 1 << 16;

fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");
    group.throughput(Throughput::Bytes(RECORD_SIZE as u64));

    let record = [0xABu8; RECORD_SIZE];

    // Benchmark write
    group.bench_function("write_16b", |b| {
        let mut rb = RingBuffer::with_capacity(CAPACITY).unwrap();
        let mut out = [0u8; RECORD_SIZE];
        b.iter(|| {
            if rb.write(black_box(&record)).is_err() {
                rb.read(&mut out).unwrap();
                rb.write(black_box(&record)).unwrap();
            }
        });
    });

    // Benchmark read
    group.bench_function("read_16b", |b| {
        let mut rb = RingBuffer::with_capacity(CAPACITY).unwrap();
        // Pre-fill setengah
        for _ in 0..CAPACITY / (2 * RECORD_SIZE) {
            rb.write(&record).unwrap();
        }
        let mut out = [0u8; RECORD_SIZE];
        b.iter(|| {
            rb.read(black_box(&mut out)).unwrap();
            rb.write(&out).unwrap();
        });
    });

    // Benchmark write+read cycle, dengan dan tanpa wraparound
    for (name, capacity) in [("cycle_aligned", CAPACITY), ("cycle_wrapping", 100)] {
        group.bench_function(name, |b| {
            let mut rb = RingBuffer::with_capacity(capacity).unwrap();
            let mut out = [0u8; RECORD_SIZE];
            b.iter(|| {
                rb.write(black_box(&record)).unwrap();
                rb.read(black_box(&mut out)).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    for chunk in [16usize, 256, 4096].iter() {
        group.throughput(Throughput::Bytes(*chunk as u64 * 64));
        group.bench_function(format!("chunk_{}", chunk), |b| {
            let mut rb = RingBuffer::with_backing(1 << 20, Backing::Mapped).unwrap();
            let data = vec![0x5Au8; *chunk];
            let mut out = vec![0u8; *chunk];
            b.iter(|| {
                for _ in 0..64 {
                    rb.write(black_box(&data)).unwrap();
                }
                for _ in 0..64 {
                    rb.read(black_box(&mut out)).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn bench_pingpong(c: &mut Criterion) {
    let mut group = c.benchmark_group("pingpong");
    group.sample_size(10);

    const ROUND_TRIPS: u32 = 10_000;
    group.throughput(Throughput::Elements(ROUND_TRIPS as u64));
    group.bench_function("round_trips_10k", |b| {
        let config = PingPongConfig {
            iterations: ROUND_TRIPS,
            ping_cpu: None,
            pong_cpu: None,
            ..PingPongConfig::default()
        };
        b.iter(|| pingpong::run(black_box(&config)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_write_read, bench_throughput, bench_pingpong);
criterion_main!(benches);
