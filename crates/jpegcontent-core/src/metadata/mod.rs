//! Exif and comment metadata.
//!
//! The Exif block is parsed with `kamadak-exif` into an [`ExifModel`] that
//! can be edited in memory and serialized back into an APP1 segment.
//! [`write_metadata`] splices a new Exif segment and comment into an
//! existing JPEG file without touching its image data.

mod model;
mod segments;

pub use model::{ExifModel, EXIF_HEADER};
pub use segments::{read_metadata, write_metadata};

use thiserror::Error;

use crate::codec::CodecError;

/// Error types for metadata handling.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The Exif block could not be parsed or serialized.
    #[error("Invalid Exif data: {0}")]
    Exif(#[from] exif::Error),

    /// The file's marker segments could not be walked.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A segment payload does not fit the 16-bit segment length.
    #[error("Marker segment too large: {0} bytes")]
    SegmentTooLarge(usize),
}
