//! Fixed 16-byte record yang dipertukarkan oleh harness
//!
//! Layout (little-endian):
//! ┌────────────┬──────────────────────┐
//! │ count: u32 │ pad: [u8; 12]        │
//! └────────────┴──────────────────────┘

pub const RECORD_SIZE: usize = 16;

/// Record dengan counter di 4 byte pertama
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Record {
    pub count: u32,
    pub pad: [u8; 12],
}

impl Record {
    #[inline(always)]
    pub const fn new(count: u32) -> Self {
        Self {
            count,
            pad: [0; 12],
        }
    }

    #[inline(always)]
    pub fn encode(&self, buf: &mut [u8; RECORD_SIZE]) {
        buf[..4].copy_from_slice(&self.count.to_le_bytes());
        buf[4..].copy_from_slice(&self.pad);
    }

    #[inline(always)]
    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut count = [0u8; 4];
        count.copy_from_slice(&buf[..4]);
        let mut pad = [0u8; 12];
        pad.copy_from_slice(&buf[4..]);
        Self {
            count: u32::from_le_bytes(count),
            pad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_little_endian() {
        let mut buf = [0xFFu8; RECORD_SIZE];
        Record::new(0x0102_0304).encode(&mut buf);
        assert_eq!(&buf[..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[4..], &[0u8; 12]);
        assert_eq!(Record::decode(&buf).count, 0x0102_0304);
    }
}
