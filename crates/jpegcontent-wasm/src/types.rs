//! Plain data types handed to JavaScript through `serde-wasm-bindgen`.

use std::collections::BTreeMap;

use jpegcontent_core::{read_header, ContentError, JpegContent, Orientation};
use serde::{Deserialize, Serialize};

/// Header probe result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    /// Stored width, before orientation is applied
    pub width: u32,
    /// Stored height, before orientation is applied
    pub height: u32,
    /// Exif orientation value, 0 when absent
    pub orientation: u8,
}

impl ImageInfo {
    /// Read the header and metadata of `bytes` without decoding the image.
    pub fn probe(bytes: &[u8]) -> Result<Self, ContentError> {
        let header = read_header(bytes)?;
        let (exif, _) = jpegcontent_core::metadata::read_metadata(&header.markers)?;
        Ok(Self {
            width: header.width(),
            height: header.height(),
            orientation: exif.orientation() as u8,
        })
    }
}

/// Snapshot of a document's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifSummary {
    pub width: u32,
    pub height: u32,
    pub orientation: u8,
    pub comment: String,
    pub aperture: Option<String>,
    pub exposure_time: Option<String>,
    pub iso: Option<String>,
    pub focal_length: Option<String>,
    pub dots_per_meter_x: u32,
    pub dots_per_meter_y: u32,
    pub has_thumbnail: bool,
    /// Every Exif field, keyed like `Exif.Image.Make`
    pub fields: BTreeMap<String, String>,
}

impl ExifSummary {
    pub fn from_content(content: &JpegContent) -> Self {
        let size = content.size();
        Self {
            width: size.width,
            height: size.height,
            orientation: content.orientation() as u8,
            comment: content.comment().to_string(),
            aperture: content.aperture(),
            exposure_time: content.exposure_time(),
            iso: content.iso(),
            focal_length: content.focal_length(),
            dots_per_meter_x: content.dots_per_meter_x(),
            dots_per_meter_y: content.dots_per_meter_y(),
            has_thumbnail: content.exif().thumbnail().is_some(),
            fields: content.exif_fields(),
        }
    }
}

/// Map a JavaScript orientation number onto the enum; unknown values become `NotAvailable`.
pub fn orientation_from_u8(value: u8) -> Orientation {
    Orientation::from_exif(u32::from(value))
}
