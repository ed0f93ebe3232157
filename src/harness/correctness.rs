//! Correctness stress test
//!
//! Producer menulis record dengan counter menurun dari N sampai 1,
//! consumer memastikan urutan yang diterima persis sama: tidak ada
//! record yang hilang, duplikat, atau korup setelah banyak wraparound.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info};

use super::{
    first_failure, guarded, join_named, spawn_named, HarnessError, PeerAbort, Record, RECORD_SIZE,
};
use crate::core::{Backing, Consumer, Producer, RingBuffer};
use crate::poll::{read_with, write_with, Timeout};

/// Konfigurasi stress run
#[derive(Debug, Clone)]
pub struct StressConfig {
    pub records: u32,
    pub capacity: usize,
    pub backing: Backing,
    pub producer_cpu: Option<usize>,
    pub consumer_cpu: Option<usize>,
    /// Batas tunggu satu write/read; mencegah producer hang kalau consumer berhenti
    pub stall_timeout: Timeout,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            records: super::DEFAULT_ITERATIONS,
            capacity: super::DEFAULT_CAPACITY,
            backing: Backing::Heap,
            producer_cpu: Some(0),
            consumer_cpu: Some(1),
            stall_timeout: Timeout::Duration(Duration::from_secs(10)),
        }
    }
}

/// Hasil stress run
#[derive(Debug, Clone, Copy)]
pub struct StressReport {
    pub records: u32,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl StressReport {
    pub fn records_per_sec(&self) -> f64 {
        self.records as f64 / self.elapsed.as_secs_f64()
    }
}

fn produce(
    tx: Producer<'_>,
    cpu: Option<usize>,
    records: u32,
    timeout: Timeout,
    poll: &mut PeerAbort<'_>,
) -> Result<(), HarnessError> {
    super::affinity::try_pin("producer", cpu);

    let mut buf = [0u8; RECORD_SIZE];
    for count in (1..=records).rev() {
        Record::new(count).encode(&mut buf);
        write_with(&tx, &buf, poll, timeout)?;
    }
    Ok(())
}

fn verify(
    rx: Consumer<'_>,
    cpu: Option<usize>,
    records: u32,
    timeout: Timeout,
    poll: &mut PeerAbort<'_>,
) -> Result<(), HarnessError> {
    super::affinity::try_pin("consumer", cpu);

    let mut buf = [0u8; RECORD_SIZE];
    for (index, expected) in (1..=records).rev().enumerate() {
        read_with(&rx, &mut buf, poll, timeout)?;
        let observed = Record::decode(&buf).count;
        if observed != expected {
            error!(index, expected, observed, "record out of order");
            return Err(HarnessError::OutOfOrder {
                index: index as u32,
                expected,
                observed,
            });
        }
    }
    Ok(())
}

/// Jalankan correctness stress test.
///
/// # Errors
/// [`HarnessError::OutOfOrder`] kalau urutan record rusak; error ring buffer
/// atau thread panic lainnya. Producer yang sedang menunggu dihentikan
/// begitu consumer gagal, juga dengan `Timeout::Infinite`.
pub fn run(config: &StressConfig) -> Result<StressReport, HarnessError> {
    let mut queue = RingBuffer::with_backing(config.capacity, config.backing)?;

    info!(
        records = config.records,
        capacity = config.capacity,
        backing = ?config.backing,
        "starting correctness stress test"
    );

    let records = config.records;
    let timeout = config.stall_timeout;
    let (producer_cpu, consumer_cpu) = (config.producer_cpu, config.consumer_cpu);
    let (tx, rx) = queue.split();
    let failed = AtomicBool::new(false);
    let failed = &failed;

    let start = Instant::now();
    std::thread::scope(|s| -> Result<(), HarnessError> {
        let producer = spawn_named(s, "producer", move || {
            guarded("producer", failed, |poll| {
                produce(tx, producer_cpu, records, timeout, poll)
            })
        })?;
        let consumer = spawn_named(s, "consumer", move || {
            guarded("consumer", failed, |poll| {
                verify(rx, consumer_cpu, records, timeout, poll)
            })
        })
        .map_err(|e| {
            failed.store(true, Ordering::Release);
            e
        })?;

        // Error consumer lebih informatif (producer biasanya hanya timeout)
        let consumer_result = join_named("consumer", consumer);
        let producer_result = join_named("producer", producer);
        first_failure(consumer_result, producer_result)
    })?;
    let elapsed = start.elapsed();

    queue.destroy();

    let report = StressReport {
        records,
        bytes: records as u64 * RECORD_SIZE as u64,
        elapsed,
    };
    info!(
        records,
        elapsed_ms = elapsed.as_millis() as u64,
        "correctness stress test passed"
    );
    Ok(report)
}
