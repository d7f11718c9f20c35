//! Growable in-memory destination for the encoder.

use std::io;

/// Buffer growth step, in bytes.
pub const GROW_STEP: usize = 4096;

/// Collects encoder output, growing its buffer in [`GROW_STEP`] chunks.
pub struct MemoryDestination {
    buf: Vec<u8>,
    len: usize,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::with_capacity_hint(0)
    }

    /// Start with room for roughly `hint` bytes.
    pub fn with_capacity_hint(hint: usize) -> Self {
        let chunks = hint / GROW_STEP + 1;
        Self {
            buf: vec![0; chunks * GROW_STEP],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn put(&mut self, bytes: &[u8]) {
        let needed = self.len + bytes.len();
        if needed > self.buf.len() {
            let chunks = (needed - self.buf.len()).div_ceil(GROW_STEP);
            self.buf.resize(self.buf.len() + chunks * GROW_STEP, 0);
        }
        self.buf[self.len..needed].copy_from_slice(bytes);
        self.len = needed;
    }

    pub fn put_u8(&mut self, byte: u8) {
        self.put(&[byte]);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.put(&value.to_be_bytes());
    }

    /// Write a marker followed by a length-prefixed payload.
    pub fn put_segment(&mut self, marker: u8, payload: &[u8]) {
        self.put(&[0xFF, marker]);
        self.put_u16((payload.len() + 2) as u16);
        self.put(payload);
    }

    /// Hand back exactly the bytes written.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.truncate(self.len);
        self.buf
    }
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for MemoryDestination {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_grows_in_steps() {
        let mut dst = MemoryDestination::new();
        dst.put(&vec![7u8; GROW_STEP + 10]);
        assert_eq!(dst.len(), GROW_STEP + 10);
        assert_eq!(dst.buf.len(), 2 * GROW_STEP);
        let out = dst.finish();
        assert_eq!(out.len(), GROW_STEP + 10);
        assert!(out.iter().all(|&b| b == 7));
    }

    #[test]
    fn test_segment_layout() {
        let mut dst = MemoryDestination::new();
        dst.put_segment(0xFE, b"hi");
        assert_eq!(dst.finish(), vec![0xFF, 0xFE, 0x00, 0x04, b'h', b'i']);
    }

    #[test]
    fn test_io_write() {
        let mut dst = MemoryDestination::with_capacity_hint(10);
        write!(dst, "abc").unwrap();
        dst.put_u16(0x0102);
        assert_eq!(dst.finish(), vec![b'a', b'b', b'c', 1, 2]);
    }
}
