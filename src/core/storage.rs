//! Backing storage untuk ring buffer
//!
//! Dua pilihan backing, keduanya fixed-length dan zero-filled:
//! - Heap: satu slice pre-allocated, alokasi gagal = error (tidak abort)
//! - Mapped: anonymous mmap, halaman di-manage kernel
//!
//! Storage hanya dialokasikan sekali saat create, tidak pernah resize.

use std::io;
use std::ptr::NonNull;

use memmap2::{MmapMut, MmapOptions};

use super::RingError;

/// Sumber memory untuk storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backing {
    /// Heap allocation biasa
    #[default]
    Heap,
    /// Anonymous private mapping (memmap2)
    Mapped,
}

/// Pemilik memory yang sebenarnya.
///
/// Untuk heap, slice di-leak ke raw pointer saat alokasi dan
/// direkonstruksi lagi di `Drop`, supaya pointer yang dipakai
/// producer/consumer tidak pernah di-invalidate oleh move.
enum Owner {
    Heap,
    // Dipegang hanya supaya mapping di-unmap saat drop
    Mapped(#[allow(dead_code)] MmapMut),
}

/// Fixed-length byte storage dengan pointer stabil
pub(crate) struct Storage {
    ptr: NonNull<u8>,
    len: usize,
    owner: Owner,
}

impl Storage {
    /// Alokasi `len` byte zero-filled.
    pub(crate) fn allocate(len: usize, backing: Backing) -> Result<Self, RingError> {
        match backing {
            Backing::Heap => Self::allocate_heap(len),
            Backing::Mapped => Self::allocate_mapped(len),
        }
    }

    fn allocate_heap(len: usize) -> Result<Self, RingError> {
        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|e| RingError::AllocationFailure {
                capacity: len,
                source: io::Error::new(io::ErrorKind::OutOfMemory, e),
            })?;
        buf.resize(len, 0);

        let raw = Box::into_raw(buf.into_boxed_slice());
        // SAFETY: Box::into_raw tidak pernah mengembalikan null
        let ptr = unsafe { NonNull::new_unchecked(raw as *mut u8) };

        Ok(Self {
            ptr,
            len,
            owner: Owner::Heap,
        })
    }

    fn allocate_mapped(len: usize) -> Result<Self, RingError> {
        let mut mmap = MmapOptions::new()
            .len(len)
            .map_anon()
            .map_err(|source| RingError::AllocationFailure {
                capacity: len,
                source,
            })?;

        // Pointer ke mapping stabil walaupun MmapMut di-move
        let ptr = NonNull::new(mmap.as_mut_ptr()).ok_or_else(|| RingError::AllocationFailure {
            capacity: len,
            source: io::Error::new(io::ErrorKind::Other, "mmap returned null"),
        })?;

        Ok(Self {
            ptr,
            len,
            owner: Owner::Mapped(mmap),
        })
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn backing(&self) -> Backing {
        match self.owner {
            Owner::Heap => Backing::Heap,
            Owner::Mapped(_) => Backing::Mapped,
        }
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let Owner::Heap = self.owner {
            // SAFETY: ptr/len berasal dari Box::into_raw di allocate_heap,
            // dan Drop hanya jalan sekali.
            unsafe {
                let slice = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
                drop(Box::from_raw(slice));
            }
        }
    }
}

// SAFETY: Storage memiliki memory-nya secara eksklusif. Akses konkuren
// ke isi storage diatur oleh protokol SPSC di RingBuffer.
unsafe impl Send for Storage {}
unsafe impl Sync for Storage {}
