//! The JPEG content manager.
//!
//! [`JpegContent`] holds the bytes of one JPEG file together with the
//! metadata read from it. Orientation changes are only recorded until
//! [`JpegContent::save`], which applies them losslessly to the compressed
//! data, writes the edited metadata back and reloads from the result.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use exif::Tag;
use image::DynamicImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{read_header, transform_jpeg, CodecError};
use crate::metadata::{read_metadata, write_metadata, ExifModel, MetadataError};
use crate::orientation::{Orientation, TransformCode, TransformError};
use crate::thumbnail::{decode_thumbnail, encode_thumbnail, ThumbnailError};
use crate::ContentOptions;

/// Error types for loading and saving JPEG content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Load was given no bytes
    #[error("No JPEG data to load")]
    Empty,

    /// Save was called before a successful load
    #[error("No JPEG content loaded")]
    NotLoaded,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// Everything derived from a file's bytes, built before anything is committed.
struct Parsed {
    size: Size,
    comment: String,
    exif: ExifModel,
}

/// Output of a save, parsed and ready to become the new content.
struct Rendered {
    raw: Vec<u8>,
    parsed: Parsed,
    truncated: bool,
}

fn parse(raw: &[u8]) -> Result<Parsed, ContentError> {
    let header = read_header(raw)?;
    let (exif, comment) = read_metadata(&header.markers)?;
    let size = Size::new(header.width(), header.height());
    let size = if exif.orientation().swaps_dimensions() {
        size.transposed()
    } else {
        size
    };
    Ok(Parsed {
        size,
        comment,
        exif,
    })
}

/// One JPEG file's bytes, metadata and pending orientation change.
#[derive(Debug, Clone, Default)]
pub struct JpegContent {
    raw: Vec<u8>,
    size: Size,
    comment: String,
    exif: ExifModel,
    pending: Option<TransformCode>,
    options: ContentOptions,
    truncated: bool,
}

impl JpegContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ContentOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &ContentOptions {
        &self.options
    }

    /// Load from bytes.
    ///
    /// Either everything is replaced or, on error, the content is left
    /// unloaded. Any pending transform is dropped.
    pub fn load(&mut self, data: &[u8]) -> Result<(), ContentError> {
        self.load_owned(data.to_vec())
    }

    /// Load from a file.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        match fs::read(path) {
            Ok(data) => self.load_owned(data),
            Err(e) => {
                self.clear();
                Err(e.into())
            }
        }
    }

    fn load_owned(&mut self, raw: Vec<u8>) -> Result<(), ContentError> {
        self.clear();
        if raw.is_empty() {
            return Err(ContentError::Empty);
        }
        let parsed = parse(&raw)?;
        debug!(
            "loaded {} bytes, {}x{}, orientation {:?}",
            raw.len(),
            parsed.size.width,
            parsed.size.height,
            parsed.exif.orientation()
        );
        self.raw = raw;
        self.size = parsed.size;
        self.comment = parsed.comment;
        self.exif = parsed.exif;
        Ok(())
    }

    fn clear(&mut self) {
        *self = Self::with_options(self.options.clone());
    }

    pub fn is_loaded(&self) -> bool {
        !self.raw.is_empty()
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw
    }

    /// Dimensions as displayed, after the Exif orientation is taken into account.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Takes effect on the next save.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn orientation(&self) -> Orientation {
        self.exif.orientation()
    }

    /// Mark the image as upright; takes effect on the next save.
    pub fn reset_orientation(&mut self) {
        self.exif.reset_orientation();
    }

    pub fn dots_per_meter_x(&self) -> u32 {
        self.exif.dots_per_meter(Tag::XResolution)
    }

    pub fn dots_per_meter_y(&self) -> u32 {
        self.exif.dots_per_meter(Tag::YResolution)
    }

    pub fn aperture(&self) -> Option<String> {
        self.exif.display(Tag::FNumber)
    }

    pub fn exposure_time(&self) -> Option<String> {
        self.exif.display(Tag::ExposureTime)
    }

    pub fn iso(&self) -> Option<String> {
        self.exif.display(Tag::PhotographicSensitivity)
    }

    pub fn focal_length(&self) -> Option<String> {
        self.exif.display(Tag::FocalLength)
    }

    pub fn exif(&self) -> &ExifModel {
        &self.exif
    }

    /// Every Exif field under its exiv2-style key.
    pub fn exif_fields(&self) -> BTreeMap<String, String> {
        self.exif.entries()
    }

    pub fn exif_value(&self, key: &str) -> Option<String> {
        self.exif.entries().remove(key)
    }

    /// Queue the transform that `orientation` stands for.
    ///
    /// Transforms accumulate: each one is applied after those already
    /// pending. `NotAvailable` and `Normal` change nothing.
    pub fn transform(&mut self, orientation: Orientation) {
        let Some(code) = orientation.transform_code() else {
            return;
        };
        if code == TransformCode::None {
            return;
        }
        let composed = self.pending.unwrap_or_default().then(code);
        debug!("queued {:?}, pending is now {:?}", code, composed);
        self.pending = Some(composed);
    }

    pub fn pending_transform(&self) -> Option<TransformCode> {
        self.pending
    }

    /// The embedded Exif thumbnail, if there is one and it decodes.
    pub fn thumbnail(&self) -> Option<DynamicImage> {
        let bytes = self.exif.thumbnail()?;
        match decode_thumbnail(bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("ignoring embedded thumbnail: {}", e);
                None
            }
        }
    }

    /// Replace the embedded thumbnail; does nothing when there is no Exif data.
    pub fn set_thumbnail(&mut self, image: &DynamicImage) {
        if self.exif.is_empty() {
            return;
        }
        match encode_thumbnail(image, self.options.quality()) {
            Ok(jpeg) => self.exif.set_thumbnail(jpeg),
            Err(e) => warn!("could not encode thumbnail: {}", e),
        }
    }

    /// Whether the data written by the last save came from truncated input.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Produce the bytes a save would write, already parsed back.
    ///
    /// Everything that can fail happens here, before any byte leaves.
    fn render(&self) -> Result<Rendered, ContentError> {
        if !self.is_loaded() {
            return Err(ContentError::NotLoaded);
        }
        let (data, truncated) = match self.pending {
            Some(code) if code != TransformCode::None => {
                let transformed = transform_jpeg(&self.raw, code)?;
                if transformed.truncated {
                    warn!("saved image is incomplete: the source data was truncated");
                }
                (Cow::Owned(transformed.data), transformed.truncated)
            }
            _ => (Cow::Borrowed(self.raw.as_slice()), false),
        };
        let app1 = self.exif.to_app1()?;
        let raw = write_metadata(&data, app1.as_deref(), &self.comment)?;
        let parsed = parse(&raw)?;
        Ok(Rendered {
            raw,
            parsed,
            truncated,
        })
    }

    /// Replace the content with freshly saved bytes.
    fn commit(&mut self, rendered: Rendered) {
        debug!(
            "saved {} bytes, {}x{}",
            rendered.raw.len(),
            rendered.parsed.size.width,
            rendered.parsed.size.height
        );
        self.raw = rendered.raw;
        self.size = rendered.parsed.size;
        self.comment = rendered.parsed.comment;
        self.exif = rendered.parsed.exif;
        self.pending = None;
        self.truncated = rendered.truncated;
    }

    /// Write the transformed image with its edited metadata to `sink`.
    ///
    /// On success the pending transform is cleared and the content reloads
    /// from what was written. On failure nothing changes.
    pub fn save<W: Write>(&mut self, sink: &mut W) -> Result<(), ContentError> {
        let rendered = self.render()?;
        sink.write_all(&rendered.raw)?;
        sink.flush()?;
        self.commit(rendered);
        Ok(())
    }

    pub fn save_to_vec(&mut self) -> Result<Vec<u8>, ContentError> {
        let rendered = self.render()?;
        let out = rendered.raw.clone();
        self.commit(rendered);
        Ok(out)
    }

    /// Save to a file. The file is only created once the image has been rendered.
    pub fn save_to_path(&mut self, path: impl AsRef<Path>) -> Result<(), ContentError> {
        let rendered = self.render()?;
        fs::write(path, &rendered.raw)?;
        self.commit(rendered);
        Ok(())
    }
}
