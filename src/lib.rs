//! Ringlat - Lock-Free SPSC Byte Ring Buffer
//!
//! Arsitektur:
//! - Core: byte ring buffer dengan satu writer per index (tanpa CAS)
//! - Poll: strategi busy-poll di sisi caller, core tidak pernah spin
//! - Harness: ping-pong latency benchmark dan correctness stress test
//! - Shell: command runner dengan readiness-polled pipes

pub mod config;
pub mod core;
pub mod harness;
pub mod poll;
#[cfg(unix)]
pub mod shell;
pub mod trace;

pub use crate::core::{Backing, Consumer, Producer, RingBuffer, RingError};
