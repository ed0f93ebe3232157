//! Shell command runner
//!
//! Komponen terpisah dari ring buffer: tidak berbagi struktur data atau
//! sinkronisasi apa pun dengan core. Hanya pipe I/O lewat mio.

mod output;
mod runner;

pub use runner::{run, CommandOutput, ShellError, StreamKind};
