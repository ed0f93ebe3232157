//! Lock-Free Single-Producer Single-Consumer (SPSC) Byte Ring Buffer
//!
//! Lamport queue di atas fixed-length byte storage. Tidak ada Mutex,
//! tidak ada CAS, tidak ada alokasi setelah inisialisasi.
//!
//! Aturan kepemilikan index:
//! - `tail` hanya ditulis producer, dibaca consumer
//! - `head` hanya ditulis consumer, dibaca producer
//!
//! Karena setiap index hanya punya satu writer, masalahnya tinggal
//! visibility: producer publish `tail` dengan Release setelah payload
//! selesai di-copy, consumer load `tail` dengan Acquire sebelum membaca
//! payload. Kebalikannya berlaku untuk `head`.
//!
//! Satu byte storage selalu dikorbankan untuk membedakan full dan empty,
//! jadi buffer dengan kapasitas `C` menampung paling banyak `C - 1` byte.

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use super::storage::{Backing, Storage};
use super::RingError;

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// Jumlah byte yang belum dibaca.
#[inline(always)]
fn occupancy(head: usize, tail: usize, capacity: usize) -> usize {
    if tail >= head {
        tail - head
    } else {
        tail + capacity - head
    }
}

/// Pecah range `[start, start + len)` di ujung fisik storage.
///
/// Returns `(first, second)`: `first` byte di `start`, `second` byte di offset 0.
#[inline(always)]
fn segments(start: usize, len: usize, capacity: usize) -> (usize, usize) {
    let first = (capacity - start).min(len);
    (first, len - first)
}

/// `(index + len) mod capacity`, dengan `len < capacity`.
#[inline(always)]
fn advance(index: usize, len: usize, capacity: usize) -> usize {
    let next = index + len;
    if next >= capacity {
        next - capacity
    } else {
        next
    }
}

/// Lock-Free SPSC Byte Ring Buffer
///
/// Untuk pemakaian satu thread, pakai [`RingBuffer::write`] dan
/// [`RingBuffer::read`] langsung. Untuk dua thread, [`RingBuffer::split`]
/// menghasilkan satu [`Producer`] dan satu [`Consumer`].
#[repr(C)]
pub struct RingBuffer {
    // Consumer side - cache line aligned
    head: CacheLinePadded<AtomicUsize>,
    // Producer side - cache line aligned
    tail: CacheLinePadded<AtomicUsize>,
    // None setelah destroy
    storage: Option<Storage>,
    capacity: usize,
}

impl RingBuffer {
    /// Membuat ring buffer dengan heap storage sebesar `capacity` byte.
    ///
    /// Usable capacity adalah `capacity - 1`.
    ///
    /// # Errors
    /// - [`RingError::InvalidCapacity`] jika `capacity < 2`
    /// - [`RingError::AllocationFailure`] jika storage tidak bisa dialokasikan
    pub fn with_capacity(capacity: usize) -> Result<Self, RingError> {
        Self::with_backing(capacity, Backing::Heap)
    }

    /// Sama dengan [`RingBuffer::with_capacity`], dengan pilihan backing storage.
    pub fn with_backing(capacity: usize, backing: Backing) -> Result<Self, RingError> {
        if capacity < 2 {
            return Err(RingError::InvalidCapacity(capacity));
        }

        let storage = Storage::allocate(capacity, backing)?;
        debug!(capacity, ?backing, "ring buffer created");

        Ok(Self {
            head: CacheLinePadded::new(AtomicUsize::new(0)),
            tail: CacheLinePadded::new(AtomicUsize::new(0)),
            storage: Some(storage),
            capacity,
        })
    }

    /// Tulis seluruh `data` (exclusive access, satu thread).
    ///
    /// All-or-nothing: tidak ada partial write.
    ///
    /// # Errors
    /// Lihat [`Producer::write`].
    #[inline]
    pub fn write(&mut self, data: &[u8]) -> Result<usize, RingError> {
        // SAFETY: &mut self menjamin tidak ada producer lain
        unsafe { self.produce(data) }
    }

    /// Baca tepat `buf.len()` byte (exclusive access, satu thread).
    ///
    /// # Errors
    /// Lihat [`Consumer::read`].
    #[inline]
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, RingError> {
        // SAFETY: &mut self menjamin tidak ada consumer lain
        unsafe { self.consume(buf) }
    }

    /// Pisahkan buffer menjadi satu producer dan satu consumer.
    ///
    /// Borrow `&mut self` menjamin hanya ada satu pasangan handle pada satu
    /// waktu, dan `destroy` tidak bisa dipanggil selama handle masih hidup.
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let ring: &RingBuffer = self;
        (
            Producer {
                ring,
                _unsync: PhantomData,
            },
            Consumer {
                ring,
                _unsync: PhantomData,
            },
        )
    }

    /// Release storage. Idempotent: panggilan kedua adalah no-op.
    ///
    /// Semua operasi setelah destroy mengembalikan [`RingError::Destroyed`].
    pub fn destroy(&mut self) {
        if let Some(storage) = self.storage.take() {
            debug!(
                capacity = self.capacity,
                backing = ?storage.backing(),
                "ring buffer destroyed"
            );
            drop(storage);
        }
    }

    /// Cek apakah storage sudah di-release
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.storage.is_none()
    }

    /// Kapasitas storage mentah (`C`)
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte maksimum yang bisa ditampung sekaligus (`C - 1`)
    #[inline(always)]
    pub const fn usable_capacity(&self) -> usize {
        self.capacity - 1
    }

    /// Jumlah byte yang belum dibaca
    #[inline]
    pub fn occupancy(&self) -> usize {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        occupancy(head, tail, self.capacity)
    }

    /// Ruang kosong yang bisa ditulis saat ini
    #[inline]
    pub fn free_space(&self) -> usize {
        self.usable_capacity() - self.occupancy()
    }

    /// Cek apakah buffer kosong
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    /// Producer path.
    ///
    /// # Safety
    /// Hanya satu thread yang boleh memanggil ini pada satu waktu.
    #[inline]
    unsafe fn produce(&self, data: &[u8]) -> Result<usize, RingError> {
        let storage = self.storage.as_ref().ok_or(RingError::Destroyed)?;
        let capacity = self.capacity;
        let len = data.len();

        if len == 0 {
            return Ok(0);
        }
        if len >= capacity {
            return Err(RingError::ExceedsCapacity {
                requested: len,
                usable: capacity - 1,
            });
        }

        // tail milik kita sendiri; head harus Acquire supaya read consumer
        // atas region yang akan ditimpa sudah selesai
        let tail = self.tail.value.load(Ordering::Relaxed);
        let head = self.head.value.load(Ordering::Acquire);

        let occupied = occupancy(head, tail, capacity);
        if occupied + len >= capacity {
            return Err(RingError::InsufficientSpace {
                requested: len,
                free: capacity - 1 - occupied,
            });
        }

        let (first, second) = segments(tail, len, capacity);
        debug_assert!(tail + first <= storage.len());

        // SAFETY: region [tail, tail + len) mod C berada di luar
        // [head, tail), jadi consumer tidak sedang membacanya. first dan
        // second tidak melewati batas storage.
        unsafe {
            let base = storage.as_ptr();
            std::ptr::copy_nonoverlapping(data.as_ptr(), base.add(tail), first);
            if second > 0 {
                std::ptr::copy_nonoverlapping(data.as_ptr().add(first), base, second);
            }
        }

        // Publish: payload di atas visible sebelum tail baru terlihat
        self.tail
            .value
            .store(advance(tail, len, capacity), Ordering::Release);

        Ok(len)
    }

    /// Consumer path.
    ///
    /// # Safety
    /// Hanya satu thread yang boleh memanggil ini pada satu waktu.
    #[inline]
    unsafe fn consume(&self, buf: &mut [u8]) -> Result<usize, RingError> {
        let storage = self.storage.as_ref().ok_or(RingError::Destroyed)?;
        let capacity = self.capacity;
        let len = buf.len();

        if len == 0 {
            return Ok(0);
        }
        if len >= capacity {
            return Err(RingError::ExceedsCapacity {
                requested: len,
                usable: capacity - 1,
            });
        }

        // head milik kita sendiri; tail harus Acquire supaya payload
        // producer di belakangnya sudah visible
        let head = self.head.value.load(Ordering::Relaxed);
        let tail = self.tail.value.load(Ordering::Acquire);

        let available = occupancy(head, tail, capacity);
        if available < len {
            return Err(RingError::InsufficientData {
                requested: len,
                available,
            });
        }

        let (first, second) = segments(head, len, capacity);
        debug_assert!(head + first <= storage.len());

        // SAFETY: region [head, head + len) mod C sudah di-publish producer
        // dan tidak akan ditimpa sampai head baru di-publish.
        unsafe {
            let base = storage.as_ptr();
            std::ptr::copy_nonoverlapping(base.add(head), buf.as_mut_ptr(), first);
            if second > 0 {
                std::ptr::copy_nonoverlapping(base, buf.as_mut_ptr().add(first), second);
            }
        }

        // Publish: copy di atas selesai sebelum producer boleh menimpa region ini
        self.head
            .value
            .store(advance(head, len, capacity), Ordering::Release);

        Ok(len)
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("head", &self.head.value.load(Ordering::Relaxed))
            .field("tail", &self.tail.value.load(Ordering::Relaxed))
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Marker untuk opt-out dari `Sync` tapi tetap `Send`
type PhantomUnsync = PhantomData<Cell<&'static ()>>;

/// Write end dari ring buffer.
///
/// `Send` tapi bukan `Sync`: bisa dipindah ke thread lain, tapi tidak bisa
/// dipakai dua thread sekaligus.
pub struct Producer<'a> {
    ring: &'a RingBuffer,
    _unsync: PhantomUnsync,
}

/// Read end dari ring buffer. Aturan thread safety sama dengan [`Producer`].
pub struct Consumer<'a> {
    ring: &'a RingBuffer,
    _unsync: PhantomUnsync,
}

impl Producer<'_> {
    /// Tulis seluruh `data` ke buffer (wait-free, tidak pernah spin).
    ///
    /// Berhasil hanya jika `occupancy + data.len() < capacity`.
    /// Write dengan panjang 0 selalu `Ok(0)` tanpa mutasi.
    ///
    /// # Errors
    /// - [`RingError::InsufficientSpace`] jika belum muat (retryable)
    /// - [`RingError::ExceedsCapacity`] jika `data.len() > capacity - 1`
    /// - [`RingError::Destroyed`] jika storage sudah di-release
    #[inline]
    pub fn write(&self, data: &[u8]) -> Result<usize, RingError> {
        // SAFETY: Producer tunggal dijamin oleh split(&mut self) dan !Sync
        unsafe { self.ring.produce(data) }
    }

    /// Ruang kosong saat ini (bisa bertambah kapan saja oleh consumer)
    #[inline]
    pub fn free_space(&self) -> usize {
        self.ring.free_space()
    }

    /// Ring buffer asal handle ini, untuk query read-only seperti
    /// [`RingBuffer::capacity`]. Write/read tetap lewat handle.
    #[inline]
    pub fn ring(&self) -> &RingBuffer {
        self.ring
    }
}

impl Consumer<'_> {
    /// Baca tepat `buf.len()` byte dari buffer (wait-free, tidak pernah spin).
    ///
    /// Read dengan panjang 0 selalu `Ok(0)` tanpa mutasi.
    ///
    /// # Errors
    /// - [`RingError::InsufficientData`] jika data belum cukup (retryable)
    /// - [`RingError::ExceedsCapacity`] jika `buf.len() > capacity - 1`
    /// - [`RingError::Destroyed`] jika storage sudah di-release
    #[inline]
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, RingError> {
        // SAFETY: Consumer tunggal dijamin oleh split(&mut self) dan !Sync
        unsafe { self.ring.consume(buf) }
    }

    /// Byte yang siap dibaca saat ini
    #[inline]
    pub fn available(&self) -> usize {
        self.ring.occupancy()
    }

    /// Ring buffer asal handle ini, untuk query read-only seperti
    /// [`RingBuffer::capacity`]. Write/read tetap lewat handle.
    #[inline]
    pub fn ring(&self) -> &RingBuffer {
        self.ring
    }
}
