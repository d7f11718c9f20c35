//! jpegcontent Core - lossless JPEG orientation and metadata editing
//!
//! This crate reads the size and Exif metadata of a JPEG file without
//! decoding it, accumulates orientation changes, and on save rotates or
//! mirrors the compressed image losslessly while rewriting its Exif block,
//! comment and embedded thumbnail.

pub mod codec;
pub mod content;
pub mod metadata;
pub mod orientation;
pub mod thumbnail;

#[cfg(test)]
mod test_support;

pub use codec::{read_header, transform_jpeg, CodecError, Header};
pub use content::{ContentError, JpegContent, Size};
pub use metadata::{ExifModel, MetadataError};
pub use orientation::{Orientation, TransformCode, TransformError};
pub use thumbnail::{render_thumbnail, ThumbnailError};

/// Settings for a [`JpegContent`]
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContentOptions {
    /// JPEG quality for regenerated thumbnails (1 to 100)
    pub thumbnail_quality: u8,
    /// Longest edge of regenerated thumbnails, in pixels
    pub thumbnail_max_edge: u32,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            thumbnail_quality: 75,
            thumbnail_max_edge: 128,
        }
    }
}

impl ContentOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Thumbnail quality clamped to the range JPEG encoders accept
    pub fn quality(&self) -> u8 {
        self.thumbnail_quality.clamp(1, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_options_default() {
        let options = ContentOptions::new();
        assert_eq!(options.thumbnail_quality, 75);
        assert_eq!(options.thumbnail_max_edge, 128);
    }

    #[test]
    fn test_content_options_quality_clamped() {
        let mut options = ContentOptions::new();
        options.thumbnail_quality = 0;
        assert_eq!(options.quality(), 1);
        options.thumbnail_quality = 250;
        assert_eq!(options.quality(), 100);
    }
}
