//! Core module: Lock-Free SPSC Byte Ring Buffer
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic load/store, tidak ada Mutex/CAS
//! - No-Allocation: Storage pre-allocated saat create, tidak pernah resize
//! - Non-Blocking: write/read langsung return, busy-poll urusan caller

mod error;
mod ring_buffer;
mod storage;

pub use error::RingError;
pub use ring_buffer::{Consumer, Producer, RingBuffer};
pub use storage::Backing;
