//! Poll strategies untuk caller yang busy-poll
//!
//! Core ring buffer tidak pernah spin atau sleep. Kalau caller mau menunggu
//! sampai write/read berhasil, strategi menunggunya dipilih di sini.

use std::hint;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::{Consumer, Producer, RingError};

/// Timeout untuk retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Tunggu tanpa batas
    Infinite,
    /// Tunggu paling lama durasi ini
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl Timeout {
    /// Deadline absolut; durasi yang tidak bisa direpresentasikan sebagai
    /// `Instant` diperlakukan sama dengan `Infinite`.
    fn deadline(self) -> Option<Instant> {
        match self {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Instant::now().checked_add(d),
        }
    }
}

/// Apa yang dilakukan caller di antara dua percobaan yang gagal
pub trait PollStrategy {
    /// Dipanggil setelah operasi berhasil
    fn reset(&mut self);

    /// Dipanggil setelah operasi gagal dengan error retryable
    fn idle(&mut self);

    /// `true` kalau retry loop harus berhenti sekarang (misalnya sisi lain
    /// sudah gagal). Error retryable terakhir yang dikembalikan.
    #[inline(always)]
    fn should_abort(&self) -> bool {
        false
    }
}

/// Pure busy-wait dengan `spin_loop` hint. Latency terendah, CPU 100%.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl PollStrategy for Spin {
    #[inline(always)]
    fn reset(&mut self) {}

    #[inline(always)]
    fn idle(&mut self) {
        hint::spin_loop();
    }
}

/// Serahkan time slice ke scheduler setiap percobaan gagal
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldNow;

impl PollStrategy for YieldNow {
    #[inline(always)]
    fn reset(&mut self) {}

    #[inline]
    fn idle(&mut self) {
        thread::yield_now();
    }
}

/// Exponential spin, lalu yield setelah `SPIN_LIMIT` langkah
#[derive(Debug, Default, Clone, Copy)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6;
    const YIELD_LIMIT: u32 = 10;

    pub const fn new() -> Self {
        Self { step: 0 }
    }

    /// `true` kalau backoff sudah masuk fase yield
    pub fn is_yielding(&self) -> bool {
        self.step > Self::SPIN_LIMIT
    }
}

impl PollStrategy for Backoff {
    #[inline(always)]
    fn reset(&mut self) {
        self.step = 0;
    }

    #[inline]
    fn idle(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            for _ in 0..1u32 << self.step {
                hint::spin_loop();
            }
        } else {
            thread::yield_now();
        }
        if self.step <= Self::YIELD_LIMIT {
            self.step += 1;
        }
    }
}

/// Retry loop generik: berhenti di sukses, error permanent, atau deadline.
#[inline]
fn retry<S, F>(strategy: &mut S, timeout: Timeout, mut op: F) -> Result<usize, RingError>
where
    S: PollStrategy + ?Sized,
    F: FnMut() -> Result<usize, RingError>,
{
    let deadline = timeout.deadline();
    loop {
        match op() {
            Ok(n) => {
                strategy.reset();
                return Ok(n);
            }
            Err(e) if e.is_retryable() => {
                if strategy.should_abort() {
                    return Err(e);
                }
                if let Some(dl) = deadline {
                    if Instant::now() >= dl {
                        return Err(e);
                    }
                }
                strategy.idle();
            }
            Err(e) => return Err(e),
        }
    }
}

/// Ulangi `producer.write(data)` sampai berhasil.
///
/// # Errors
/// Error permanent (`ExceedsCapacity`, `Destroyed`) dikembalikan langsung;
/// `InsufficientSpace` terakhir dikembalikan kalau deadline lewat.
pub fn write_with<S>(
    producer: &Producer<'_>,
    data: &[u8],
    strategy: &mut S,
    timeout: Timeout,
) -> Result<usize, RingError>
where
    S: PollStrategy + ?Sized,
{
    retry(strategy, timeout, || producer.write(data))
}

/// Ulangi `consumer.read(buf)` sampai berhasil.
///
/// # Errors
/// Sama dengan [`write_with`], dengan `InsufficientData` sebagai error retryable.
pub fn read_with<S>(
    consumer: &Consumer<'_>,
    buf: &mut [u8],
    strategy: &mut S,
    timeout: Timeout,
) -> Result<usize, RingError>
where
    S: PollStrategy + ?Sized,
{
    retry(strategy, timeout, || consumer.read(buf))
}
