//! In-memory byte source for the decoder.

use log::warn;

use super::marker::EOI;
use super::CodecError;

const FAKE_EOI: [u8; 2] = [0xFF, EOI];

/// Reads a JPEG stream out of a borrowed byte slice.
///
/// Header fields are read strictly: running out of data is an error.
/// Entropy-coded data is read with [`MemorySource::fill_byte`], which keeps
/// serving an EOI marker once the slice is exhausted so that a truncated
/// image still decodes (with the missing part left at zero).
pub struct MemorySource<'a> {
    data: &'a [u8],
    pos: usize,
    fake_bytes: usize,
}

impl<'a> MemorySource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            fake_bytes: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// True once the source had to make up an EOI marker.
    pub fn truncated(&self) -> bool {
        self.fake_bytes > 0
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let hi = self.read_u8()?;
        let lo = self.read_u8()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).ok_or(CodecError::Truncated)?;
        let bytes = self.data.get(self.pos..end).ok_or(CodecError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Read the payload of a length-prefixed marker segment.
    pub fn read_segment(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_u16()? as usize;
        if len < 2 {
            return Err(CodecError::Malformed("marker segment length below 2"));
        }
        self.read_bytes(len - 2)
    }

    /// Next byte of entropy-coded data, or a synthetic EOI past the end.
    pub fn fill_byte(&mut self) -> u8 {
        if let Some(&byte) = self.data.get(self.pos) {
            self.pos += 1;
            return byte;
        }
        if self.fake_bytes == 0 {
            warn!("image is incomplete, {} bytes of JPEG data read", self.data.len());
        }
        let byte = FAKE_EOI[self.fake_bytes % 2];
        self.fake_bytes += 1;
        byte
    }

    /// Scan forward to the next marker and return its code.
    ///
    /// Garbage between segments is skipped with a warning. Past the end of
    /// the data this yields EOI.
    pub fn next_marker(&mut self) -> u8 {
        let mut skipped = 0usize;
        loop {
            let mut byte = self.fill_byte();
            while byte != 0xFF {
                skipped += 1;
                byte = self.fill_byte();
            }
            let mut code = self.fill_byte();
            while code == 0xFF {
                code = self.fill_byte();
            }
            if code != 0 {
                if skipped > 0 {
                    warn!(
                        "skipped {} extraneous bytes before marker 0x{:02X}",
                        skipped, code
                    );
                }
                return code;
            }
            // Stuffed 0xFF00 outside of a scan is just more garbage.
            skipped += 2;
        }
    }
}
