//! Growable output buffer untuk pipe non-blocking
//!
//! Buffer tumbuh per `GROW_UNIT` byte setiap kali penuh, lalu di-truncate
//! ke panjang data sebenarnya saat selesai.

use std::io::{self, Read};

/// Unit pertumbuhan buffer
const GROW_UNIT: usize = 1024;

/// Status pipe setelah satu kali drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipeState {
    /// Masih terbuka, data berikutnya datang lewat readiness event
    Open,
    /// EOF, writer sudah menutup pipe
    Closed,
}

/// Output buffer dengan write position
#[derive(Debug, Default)]
pub(crate) struct OutputBuffer {
    buf: Vec<u8>,
    len: usize,
}

impl OutputBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Baca dari `src` sampai `WouldBlock` atau EOF.
    ///
    /// Returns state pipe dan jumlah byte yang dibaca di panggilan ini.
    pub(crate) fn fill_from<R: Read>(&mut self, src: &mut R) -> io::Result<(PipeState, usize)> {
        let mut total = 0;
        loop {
            // Expand buffer jika penuh
            if self.len == self.buf.len() {
                self.buf.resize(self.len + GROW_UNIT, 0);
            }

            match src.read(&mut self.buf[self.len..]) {
                Ok(0) => return Ok((PipeState::Closed, total)),
                Ok(n) => {
                    self.len += n;
                    total += n;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok((PipeState::Open, total))
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.len);
        self.buf
    }
}
