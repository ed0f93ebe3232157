//! Error taxonomy untuk ring buffer
//!
//! Dua kelas error:
//! - Retryable: `InsufficientSpace` / `InsufficientData` (backpressure, coba lagi)
//! - Permanent: sisanya, retry tidak akan pernah berhasil

use std::io;

use thiserror::Error;

/// Error dari operasi ring buffer
///
/// Tidak ada operasi yang gagal setelah melakukan mutasi sebagian:
/// setiap error berarti state buffer tidak berubah.
#[derive(Debug, Error)]
pub enum RingError {
    /// Storage tidak bisa dialokasikan saat create
    #[error("failed to allocate {capacity} bytes of ring storage")]
    AllocationFailure {
        capacity: usize,
        #[source]
        source: io::Error,
    },

    /// Kapasitas minimal 2 byte (1 byte dikorbankan untuk full/empty)
    #[error("ring capacity must be at least 2 bytes, got {0}")]
    InvalidCapacity(usize),

    /// Write tidak muat sekarang, consumer belum cukup membaca
    #[error("insufficient space: requested {requested} bytes, {free} free")]
    InsufficientSpace { requested: usize, free: usize },

    /// Read tidak bisa dipenuhi, producer belum cukup menulis
    #[error("insufficient data: requested {requested} bytes, {available} available")]
    InsufficientData { requested: usize, available: usize },

    /// Request lebih besar dari usable capacity (C - 1), tidak akan pernah muat
    #[error("request of {requested} bytes exceeds usable capacity of {usable} bytes")]
    ExceedsCapacity { requested: usize, usable: usize },

    /// Storage sudah di-release via `destroy`
    #[error("ring buffer has been destroyed")]
    Destroyed,
}

impl RingError {
    /// `true` kalau operasi yang sama bisa berhasil jika diulang nanti.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientSpace { .. } | Self::InsufficientData { .. }
        )
    }
}
