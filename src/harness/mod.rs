//! Harness: ping-pong latency benchmark dan correctness stress test
//!
//! Dua thread, masing-masing di-pin ke CPU berbeda, bertukar record 16 byte
//! lewat ring buffer dengan busy-poll sampai berhasil.

mod affinity;
pub mod correctness;
pub mod pingpong;
mod record;

use std::hint;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};

use thiserror::Error;

use crate::core::RingError;
use crate::poll::PollStrategy;

pub use affinity::pin_current_thread;
pub use correctness::{StressConfig, StressReport};
pub use pingpong::{PingPongConfig, PingPongReport};
pub use record::{Record, RECORD_SIZE};

/// Ukuran default setiap ring buffer harness (1 MiB)
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// Jumlah iterasi default
pub const DEFAULT_ITERATIONS: u32 = 1_000_000;

/// Error dari harness run
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Ring(#[from] RingError),

    /// Consumer melihat counter yang tidak sesuai urutan
    #[error("record {index}: expected count {expected}, observed {observed}")]
    OutOfOrder {
        index: u32,
        expected: u32,
        observed: u32,
    },

    #[error("failed to spawn {role} thread")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    /// Thread berhenti menunggu karena thread lain sudah gagal
    #[error("{0} thread stopped after its peer failed")]
    Aborted(&'static str),
}

/// Busy-wait yang berhenti begitu thread lain di run yang sama gagal.
///
/// Tanpa ini, `Timeout::Infinite` membuat sisi yang masih hidup spin
/// selamanya menunggu data atau ruang yang tidak akan pernah datang.
pub(crate) struct PeerAbort<'a> {
    failed: &'a AtomicBool,
}

impl PollStrategy for PeerAbort<'_> {
    #[inline(always)]
    fn reset(&mut self) {}

    #[inline(always)]
    fn idle(&mut self) {
        hint::spin_loop();
    }

    #[inline(always)]
    fn should_abort(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }
}

/// Set flag `failed` kalau thread unwind karena panic
struct FailOnUnwind<'a>(&'a AtomicBool);

impl Drop for FailOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::Release);
        }
    }
}

/// Jalankan satu sisi harness dengan flag `failed` bersama.
///
/// Error dari `side` menandai flag supaya sisi lain berhenti. Error retryable
/// yang muncul setelah sisi lain gagal dilaporkan sebagai `Aborted`.
fn guarded<F>(role: &'static str, failed: &AtomicBool, side: F) -> Result<(), HarnessError>
where
    F: FnOnce(&mut PeerAbort<'_>) -> Result<(), HarnessError>,
{
    let _unwind = FailOnUnwind(failed);
    let mut poll = PeerAbort { failed };
    let err = match side(&mut poll) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    let peer_failed = failed.swap(true, Ordering::AcqRel);
    match err {
        HarnessError::Ring(ref e) if peer_failed && e.is_retryable() => {
            Err(HarnessError::Aborted(role))
        }
        e => Err(e),
    }
}

/// Gabungkan hasil dua thread: error asli menang atas `Aborted`
fn first_failure(
    first: Result<(), HarnessError>,
    second: Result<(), HarnessError>,
) -> Result<(), HarnessError> {
    match (first, second) {
        (Err(HarnessError::Aborted(_)), Err(e)) => Err(e),
        (Err(e), _) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

/// Spawn thread bernama di dalam scope (nama muncul di tracing output)
fn spawn_named<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    role: &'static str,
    f: F,
) -> Result<ScopedJoinHandle<'scope, Result<(), HarnessError>>, HarnessError>
where
    F: FnOnce() -> Result<(), HarnessError> + Send + 'scope,
{
    std::thread::Builder::new()
        .name(role.to_string())
        .spawn_scoped(scope, f)
        .map_err(|source| HarnessError::Spawn { role, source })
}

/// Join thread; panic diubah menjadi `ThreadPanicked`
fn join_named(
    role: &'static str,
    handle: ScopedJoinHandle<'_, Result<(), HarnessError>>,
) -> Result<(), HarnessError> {
    handle
        .join()
        .map_err(|_| HarnessError::ThreadPanicked(role))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RingBuffer;
    use crate::poll::{write_with, Timeout};

    #[test]
    fn test_peer_failure_stops_infinite_wait() {
        let mut queue = RingBuffer::with_capacity(8).unwrap();
        queue.write(&[0u8; 7]).unwrap();
        let (tx, _rx) = queue.split();
        let failed = AtomicBool::new(false);
        let failed = &failed;

        let result = thread::scope(|s| {
            let writer = s.spawn(move || {
                guarded("writer", failed, |poll| {
                    // Ring penuh dan tidak ada reader: hanya abort yang bisa menghentikan ini
                    write_with(&tx, &[1u8; 4], poll, Timeout::Infinite)?;
                    Ok(())
                })
            });
            let other = s.spawn(move || {
                guarded("other", failed, |_| {
                    Err(HarnessError::OutOfOrder {
                        index: 0,
                        expected: 2,
                        observed: 1,
                    })
                })
            });
            let other_result = other.join().unwrap();
            let writer_result = writer.join().unwrap();
            assert!(matches!(writer_result, Err(HarnessError::Aborted("writer"))));
            first_failure(writer_result, other_result)
        });

        assert!(matches!(result, Err(HarnessError::OutOfOrder { index: 0, .. })));
    }

    #[test]
    fn test_peer_panic_stops_infinite_wait() {
        let mut queue = RingBuffer::with_capacity(8).unwrap();
        let (_tx, rx) = queue.split();
        let failed = AtomicBool::new(false);
        let failed = &failed;

        thread::scope(|s| {
            let reader = s.spawn(move || {
                guarded("reader", failed, |poll| {
                    let mut buf = [0u8; 4];
                    crate::poll::read_with(&rx, &mut buf, poll, Timeout::Infinite)?;
                    Ok(())
                })
            });
            let other = s.spawn(move || guarded("other", failed, |_| panic!("side failed")));
            assert!(other.join().is_err());
            assert!(matches!(
                reader.join().unwrap(),
                Err(HarnessError::Aborted("reader"))
            ));
        });
    }

    #[test]
    fn test_timeout_without_peer_failure_is_not_aborted() {
        let mut queue = RingBuffer::with_capacity(8).unwrap();
        let (_tx, rx) = queue.split();
        let failed = AtomicBool::new(false);

        let err = guarded("reader", &failed, |poll| {
            let mut buf = [0u8; 4];
            crate::poll::read_with(
                &rx,
                &mut buf,
                poll,
                Timeout::Duration(std::time::Duration::from_millis(5)),
            )?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Ring(RingError::InsufficientData { .. })
        ));
        assert!(failed.load(Ordering::Acquire));
    }

    #[test]
    fn test_first_failure_prefers_real_error() {
        let real = || Err(HarnessError::ThreadPanicked("pong"));
        assert!(matches!(
            first_failure(Err(HarnessError::Aborted("ping")), real()),
            Err(HarnessError::ThreadPanicked("pong"))
        ));
        assert!(matches!(
            first_failure(real(), Err(HarnessError::Aborted("ping"))),
            Err(HarnessError::ThreadPanicked("pong"))
        ));
        assert!(first_failure(Ok(()), Ok(())).is_ok());
    }
}
