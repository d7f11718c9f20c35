//! Marker codes and coefficient ordering tables.

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DQT: u8 = 0xDB;
pub const DNL: u8 = 0xDC;
pub const DRI: u8 = 0xDD;
pub const DHT: u8 = 0xC4;
pub const DAC: u8 = 0xCC;
pub const JPG: u8 = 0xC8;
pub const SOF0: u8 = 0xC0;
pub const SOF1: u8 = 0xC1;
pub const SOF2: u8 = 0xC2;
pub const SOF9: u8 = 0xC9;
pub const SOF10: u8 = 0xCA;
pub const RST0: u8 = 0xD0;
pub const TEM: u8 = 0x01;
pub const APP0: u8 = 0xE0;
pub const APP1: u8 = 0xE1;
pub const COM: u8 = 0xFE;

pub fn is_app(marker: u8) -> bool {
    (0xE0..=0xEF).contains(&marker)
}

pub fn is_rst(marker: u8) -> bool {
    (RST0..=RST0 + 7).contains(&marker)
}

/// SOF markers for the lossless and hierarchical processes.
pub fn is_unsupported_sof(marker: u8) -> bool {
    (0xC3..=0xCF).contains(&marker)
        && !matches!(marker, DHT | JPG | DAC | SOF9 | SOF10)
}

/// Markers that stand alone, without a length field.
pub fn is_standalone(marker: u8) -> bool {
    marker == SOI || marker == EOI || marker == TEM || is_rst(marker)
}

/// A marker segment kept verbatim (APPn and COM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSegment {
    pub marker: u8,
    /// Payload without the marker and length bytes.
    pub data: Vec<u8>,
}

impl MarkerSegment {
    pub fn new(marker: u8, data: Vec<u8>) -> Self {
        Self { marker, data }
    }
}

/// Zigzag position to natural (row-major) index.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];
