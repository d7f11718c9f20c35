//! Editable Exif model.

use std::collections::BTreeMap;
use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Context, Exif, Field, In, Reader, Tag, Value};

use super::MetadataError;
use crate::orientation::Orientation;

/// Signature that starts the payload of an Exif APP1 segment.
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest payload a marker segment can carry.
pub(crate) const MAX_SEGMENT_PAYLOAD: usize = 65533;

const INCHES_PER_METER: f64 = 100.0 / 2.54;

/// Exif fields of a file plus its embedded thumbnail.
///
/// Fields that only describe the layout of the TIFF structure (IFD
/// pointers, thumbnail offset and length) are not kept; the writer
/// regenerates them.
#[derive(Debug, Clone, Default)]
pub struct ExifModel {
    fields: Vec<Field>,
    little_endian: bool,
    thumbnail: Option<Vec<u8>>,
}

impl ExifModel {
    /// Parse the payload of an Exif APP1 segment, `Exif\0\0` header included.
    pub fn from_app1_payload(payload: &[u8]) -> Result<Self, MetadataError> {
        let tiff = payload.strip_prefix(EXIF_HEADER).unwrap_or(payload);
        let exif = Reader::new().read_raw(tiff.to_vec())?;
        let thumbnail = embedded_thumbnail(&exif);
        let fields = exif.fields().filter(|f| is_carried(f)).cloned().collect();
        Ok(Self {
            fields,
            little_endian: exif.little_endian(),
            thumbnail,
        })
    }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.thumbnail.is_none()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, tag: Tag) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.tag == tag && f.ifd_num == In::PRIMARY)
    }

    fn uint(&self, tag: Tag) -> Option<u32> {
        self.get(tag).and_then(|f| f.value.get_uint(0))
    }

    /// Human readable value of a primary-image field.
    pub fn display(&self, tag: Tag) -> Option<String> {
        self.get(tag).map(value_string)
    }

    pub fn orientation(&self) -> Orientation {
        self.uint(Tag::Orientation)
            .map(Orientation::from_exif)
            .unwrap_or(Orientation::NotAvailable)
    }

    /// Set Orientation to Normal if the tag is present.
    pub fn reset_orientation(&mut self) {
        if let Some(field) = self
            .fields
            .iter_mut()
            .find(|f| f.tag == Tag::Orientation && f.ifd_num == In::PRIMARY)
        {
            field.value = Value::Short(vec![Orientation::Normal as u16]);
        }
    }

    /// Resolution along one axis (`XResolution` or `YResolution`) in dots per meter, 0 if unknown.
    pub fn dots_per_meter(&self, tag: Tag) -> u32 {
        let Some(unit) = self.uint(Tag::ResolutionUnit) else {
            return 0;
        };
        let Some(Value::Rational(values)) = self.get(tag).map(|f| &f.value) else {
            return 0;
        };
        let Some(resolution) = values.first() else {
            return 0;
        };
        let num = u64::from(resolution.num);
        let den = u64::from(resolution.denom.max(1));
        let dots = match unit {
            // dots per centimeter
            3 => (num * 100 / den) as f64,
            _ => num as f64 * INCHES_PER_METER / den as f64,
        };
        dots.min(f64::from(u32::MAX)) as u32
    }

    /// All fields keyed the way exiv2 names them, e.g. `Exif.Image.Make`.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (key_for(f), value_string(f)))
            .collect()
    }

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, jpeg: Vec<u8>) {
        self.thumbnail = Some(jpeg);
    }

    /// Serialize into an APP1 payload; `None` when the model is empty.
    pub fn to_app1(&self) -> Result<Option<Vec<u8>>, MetadataError> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        if let Some(jpeg) = &self.thumbnail {
            writer.set_jpeg(jpeg, In::THUMBNAIL);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, self.little_endian)?;

        let mut payload = EXIF_HEADER.to_vec();
        payload.extend_from_slice(&tiff.into_inner());
        if payload.len() > MAX_SEGMENT_PAYLOAD {
            return Err(MetadataError::SegmentTooLarge(payload.len()));
        }
        Ok(Some(payload))
    }
}

fn embedded_thumbnail(exif: &Exif) -> Option<Vec<u8>> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    exif.buf()
        .get(offset..offset.checked_add(len)?)
        .map(<[u8]>::to_vec)
}

/// Fields that survive a rewrite.
fn is_carried(field: &Field) -> bool {
    let structural = matches!(
        field.tag,
        Tag::ExifIFDPointer
            | Tag::GPSInfoIFDPointer
            | Tag::InteropIFDPointer
            | Tag::JPEGInterchangeFormat
            | Tag::JPEGInterchangeFormatLength
            | Tag::StripOffsets
            | Tag::StripByteCounts
            | Tag::TileOffsets
            | Tag::TileByteCounts
    );
    let writable = !matches!(field.value, Value::Unknown(..));
    (field.ifd_num == In::PRIMARY || field.ifd_num == In::THUMBNAIL) && !structural && writable
}

fn key_for(field: &Field) -> String {
    let group = match field.tag.context() {
        Context::Tiff if field.ifd_num == In::THUMBNAIL => "Thumbnail",
        Context::Tiff => "Image",
        Context::Exif => "Photo",
        Context::Gps => "GPSInfo",
        Context::Interop => "Iop",
        _ => "Unknown",
    };
    let name = if field.tag.description().is_some() {
        field.tag.to_string()
    } else {
        format!("0x{:04x}", field.tag.number())
    };
    format!("Exif.{}.{}", group, name)
}

fn value_string(field: &Field) -> String {
    match &field.value {
        Value::Ascii(strings) => strings
            .iter()
            .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string())
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().to_string(),
    }
}
