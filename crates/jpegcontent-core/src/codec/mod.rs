//! Coefficient-domain JPEG codec.
//!
//! Reads Huffman-coded JPEG streams into quantized DCT coefficients without
//! ever going to the pixel domain, transforms them losslessly and writes
//! them back out.
//!
//! # Architecture
//!
//! - `source` / `destination` - in-memory byte adapters; the source invents
//!   an EOI marker when the input runs dry so truncated files still decode
//! - `header` - marker segment walking, frame/table parsing and the
//!   header-only probe
//! - `huffman` / `bitio` / `scan` - entropy decoding (sequential and
//!   progressive) and baseline encoding with optimized tables
//! - `coefficients` - the decoded image as per-component block grids
//! - `lossless` - the eight dihedral transforms on those grids
//!
//! Supported input: baseline (SOF0), extended sequential (SOF1) and
//! progressive (SOF2) Huffman-coded 8-bit JPEG. Output is always a single
//! interleaved sequential scan.
//!
//! # Examples
//!
//! ```ignore
//! use jpegcontent_core::codec::{read_header, transform_jpeg};
//! use jpegcontent_core::orientation::TransformCode;
//!
//! let header = read_header(&bytes)?;
//! println!("{}x{}", header.frame.width, header.frame.height);
//!
//! let rotated = transform_jpeg(&bytes, TransformCode::Rot90)?;
//! assert_eq!(read_header(&rotated.data)?.frame.width, header.frame.height);
//! ```

mod bitio;
mod coefficients;
mod destination;
mod header;
mod huffman;
mod lossless;
mod marker;
mod scan;
mod source;

pub use coefficients::{CoefficientGrid, CoefficientImage};
pub use header::{read_header, Component, Frame, FrameKind, Header, QuantTable};
pub use lossless::{transform_jpeg, Transformed};
pub use marker::MarkerSegment;

pub(crate) use header::split_segments;
pub(crate) use marker::{is_app, APP0, APP1, COM};

use thiserror::Error;

/// Error types for the coefficient codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The data does not start with an SOI marker.
    #[error("Not a JPEG file")]
    NotJpeg,

    /// A marker segment ends past the end of the data.
    #[error("JPEG data ends inside a marker segment")]
    Truncated,

    /// Structurally invalid JPEG data.
    #[error("Malformed JPEG: {0}")]
    Malformed(&'static str),

    /// Valid JPEG, but a coding process this codec does not handle.
    #[error("Unsupported JPEG: {0}")]
    Unsupported(&'static str),

    /// A scan references a Huffman or quantization table that was never defined.
    #[error("Scan references undefined {kind} table {id}")]
    MissingTable { kind: &'static str, id: u8 },

    /// Frame dimensions beyond what the codec will allocate.
    #[error("Image too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },
}
