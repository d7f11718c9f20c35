//! Entropy-coded segment bit I/O.

use log::warn;

use super::destination::MemoryDestination;
use super::huffman::{extend, DecodeTable, EncodeTable};
use super::marker::{is_rst, EOI, RST0};
use super::source::MemorySource;

/// Reads bits MSB-first out of an entropy-coded segment.
///
/// Stuffed `0xFF 0x00` pairs are undone. Once a marker shows up it is
/// remembered and only zero bits are produced until the caller deals with
/// it, which is how the decoder runs past the end of truncated data.
pub(crate) struct BitReader<'s, 'a> {
    src: &'s mut MemorySource<'a>,
    acc: u32,
    count: u32,
    /// Zero bits at the bottom of `acc` that were not in the data.
    padding: u32,
    marker: Option<u8>,
    insufficient: bool,
    warned_corrupt: bool,
}

impl<'s, 'a> BitReader<'s, 'a> {
    pub fn new(src: &'s mut MemorySource<'a>) -> Self {
        Self {
            src,
            acc: 0,
            count: 0,
            padding: 0,
            marker: None,
            insufficient: false,
            warned_corrupt: false,
        }
    }

    fn fill(&mut self) {
        while self.count <= 24 {
            let byte = if self.marker.is_some() {
                self.padding += 8;
                0
            } else {
                match self.src.fill_byte() {
                    0xFF => {
                        let mut next = self.src.fill_byte();
                        while next == 0xFF {
                            next = self.src.fill_byte();
                        }
                        if next == 0 {
                            0xFF
                        } else {
                            self.marker = Some(next);
                            self.padding += 8;
                            0
                        }
                    }
                    byte => byte,
                }
            };
            self.acc |= u32::from(byte) << (24 - self.count);
            self.count += 8;
        }
    }

    #[inline]
    pub fn bit(&mut self) -> u32 {
        self.bits(1)
    }

    /// Read `n` (at most 16) bits.
    #[inline]
    pub fn bits(&mut self, n: u8) -> u32 {
        if n == 0 {
            return 0;
        }
        if self.count < u32::from(n) {
            self.fill();
        }
        let n32 = u32::from(n);
        let real = self.count - self.padding;
        if n32 > real {
            self.insufficient = true;
            self.padding -= n32 - real;
        }
        let value = self.acc >> (32 - n32);
        self.acc <<= n;
        self.count -= n32;
        value
    }

    /// True once a read needed bits beyond the end of the segment.
    pub fn insufficient(&self) -> bool {
        self.insufficient
    }

    /// Read `size` bits and sign-extend them into a coefficient.
    #[inline]
    pub fn receive_extend(&mut self, size: u8) -> i32 {
        let size = size.min(16);
        extend(self.bits(size) as i32, size)
    }

    /// Decode one Huffman symbol; corrupt codes decode as 0 with a warning.
    pub fn decode(&mut self, table: &DecodeTable) -> u8 {
        let mut code = self.bit() as i32;
        let mut len = 1usize;
        while len <= 16 && table.exceeds(code, len) {
            code = (code << 1) | self.bit() as i32;
            len += 1;
        }
        match table.lookup(code, len) {
            Some(symbol) => symbol,
            None => {
                if !self.warned_corrupt && !self.src.truncated() {
                    warn!("corrupt JPEG data: bad Huffman code");
                    self.warned_corrupt = true;
                }
                0
            }
        }
    }

    /// Skip to the expected restart marker and start a fresh byte.
    pub fn restart(&mut self, expected: u8) {
        self.acc = 0;
        self.count = 0;
        self.padding = 0;
        let marker = match self.marker {
            Some(m) => m,
            None => self.src.next_marker(),
        };
        if marker == RST0 + expected {
            self.marker = None;
            self.insufficient = false;
        } else if is_rst(marker) {
            warn!(
                "corrupt JPEG data: found RST{} where RST{} was expected",
                marker - RST0,
                expected
            );
            self.marker = None;
            self.insufficient = false;
        } else {
            // EOI or some other marker: leave it pending, feed zeros.
            self.marker = Some(marker);
        }
    }

    /// End the segment and return the marker that follows it.
    pub fn finish(self) -> u8 {
        match self.marker {
            Some(m) => m,
            None => self.src.next_marker(),
        }
    }

    /// True when the reader is past a (possibly synthetic) EOI.
    pub fn at_eoi(&self) -> bool {
        self.marker == Some(EOI)
    }
}

/// Writes bits MSB-first with 0xFF byte stuffing.
pub(crate) struct BitWriter<'d> {
    dst: &'d mut MemoryDestination,
    acc: u64,
    count: u32,
}

impl<'d> BitWriter<'d> {
    pub fn new(dst: &'d mut MemoryDestination) -> Self {
        Self { dst, acc: 0, count: 0 }
    }

    /// Append the low `size` bits of `value`.
    #[inline]
    pub fn put(&mut self, value: u32, size: u8) {
        if size == 0 {
            return;
        }
        let mask = (1u64 << size) - 1;
        self.acc = (self.acc << size) | (u64::from(value) & mask);
        self.count += u32::from(size);
        while self.count >= 8 {
            let byte = (self.acc >> (self.count - 8)) as u8;
            self.dst.put_u8(byte);
            if byte == 0xFF {
                self.dst.put_u8(0);
            }
            self.count -= 8;
        }
        self.acc &= (1u64 << self.count) - 1;
    }

    #[inline]
    pub fn put_symbol(&mut self, table: &EncodeTable, symbol: u8) {
        let (code, size) = table.get(symbol);
        self.put(u32::from(code), size);
    }

    /// Pad the last byte with one bits.
    pub fn flush(&mut self) {
        if self.count > 0 {
            let pad = 8 - self.count as u8;
            self.put((1u32 << pad) - 1, pad);
        }
    }
}
