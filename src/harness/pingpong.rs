//! Ping-pong latency benchmark
//!
//! Dua thread, dua ring buffer:
//! - thread `ping` tulis ke q1, baca dari q2
//! - thread `pong` tulis ke q2, baca dari q1
//!
//! Waktu total dibagi jumlah iterasi = rata-rata round trip.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use super::{
    first_failure, guarded, join_named, spawn_named, HarnessError, PeerAbort, Record, RECORD_SIZE,
};
use crate::core::{Backing, Consumer, Producer, RingBuffer};
use crate::poll::{read_with, write_with, Timeout};

/// Konfigurasi ping-pong run
#[derive(Debug, Clone)]
pub struct PingPongConfig {
    pub iterations: u32,
    pub capacity: usize,
    pub backing: Backing,
    pub ping_cpu: Option<usize>,
    pub pong_cpu: Option<usize>,
    /// Batas tunggu satu write/read sebelum run dianggap macet
    pub stall_timeout: Timeout,
}

impl Default for PingPongConfig {
    fn default() -> Self {
        Self {
            iterations: super::DEFAULT_ITERATIONS,
            capacity: super::DEFAULT_CAPACITY,
            backing: Backing::Heap,
            ping_cpu: Some(0),
            pong_cpu: Some(1),
            stall_timeout: Timeout::Duration(Duration::from_secs(10)),
        }
    }
}

/// Hasil ping-pong run
#[derive(Debug, Clone, Copy)]
pub struct PingPongReport {
    pub iterations: u32,
    pub total: Duration,
}

impl PingPongReport {
    /// Rata-rata waktu satu round trip
    pub fn round_trip(&self) -> Duration {
        if self.iterations == 0 {
            return Duration::ZERO;
        }
        self.total / self.iterations
    }

    pub fn round_trips_per_sec(&self) -> f64 {
        self.iterations as f64 / self.total.as_secs_f64()
    }
}

/// Satu sisi ping-pong: tulis dulu, lalu tunggu balasan
fn exchange(
    role: &'static str,
    cpu: Option<usize>,
    tx: Producer<'_>,
    rx: Consumer<'_>,
    iterations: u32,
    timeout: Timeout,
    poll: &mut PeerAbort<'_>,
) -> Result<(), HarnessError> {
    super::affinity::try_pin(role, cpu);

    let mut buf = [0u8; RECORD_SIZE];
    for count in (1..=iterations).rev() {
        Record::new(count).encode(&mut buf);
        write_with(&tx, &buf, poll, timeout)?;
        read_with(&rx, &mut buf, poll, timeout)?;
    }
    Ok(())
}

/// Jalankan ping-pong benchmark.
///
/// # Errors
/// Error ring buffer (termasuk stall timeout) atau thread panic. Kalau satu
/// thread gagal, thread lainnya berhenti menunggu dan error pertama yang
/// dikembalikan.
pub fn run(config: &PingPongConfig) -> Result<PingPongReport, HarnessError> {
    let mut q1 = RingBuffer::with_backing(config.capacity, config.backing)?;
    let mut q2 = RingBuffer::with_backing(config.capacity, config.backing)?;

    info!(
        iterations = config.iterations,
        capacity = config.capacity,
        backing = ?config.backing,
        "starting ping-pong"
    );

    let iterations = config.iterations;
    let timeout = config.stall_timeout;
    let (ping_cpu, pong_cpu) = (config.ping_cpu, config.pong_cpu);

    let (p1, c1) = q1.split();
    let (p2, c2) = q2.split();
    let failed = AtomicBool::new(false);
    let failed = &failed;

    let start = Instant::now();
    std::thread::scope(|s| -> Result<(), HarnessError> {
        let ping = spawn_named(s, "ping", move || {
            guarded("ping", failed, |poll| {
                exchange("ping", ping_cpu, p1, c2, iterations, timeout, poll)
            })
        })?;
        let pong = spawn_named(s, "pong", move || {
            guarded("pong", failed, |poll| {
                exchange("pong", pong_cpu, p2, c1, iterations, timeout, poll)
            })
        })
        .map_err(|e| {
            // ping sudah jalan; tanpa flag ini scope menunggu ping selamanya
            failed.store(true, Ordering::Release);
            e
        })?;

        let ping_result = join_named("ping", ping);
        let pong_result = join_named("pong", pong);
        first_failure(ping_result, pong_result)
    })?;
    let total = start.elapsed();

    // Kedua thread sudah di-join, aman untuk release storage
    q1.destroy();
    q2.destroy();

    let report = PingPongReport { iterations, total };
    info!(
        total_ns = total.as_nanos() as u64,
        round_trip_ns = report.round_trip().as_nanos() as u64,
        "ping-pong complete"
    );
    Ok(report)
}
