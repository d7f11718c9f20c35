//! Fixtures generated in-process for the unit tests.

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::metadata::{write_metadata, EXIF_HEADER};

pub const FIXTURE_WIDTH: u32 = 128;
pub const FIXTURE_HEIGHT: u32 = 64;
pub const FIXTURE_COMMENT: &str = "a comment";

fn encode(pixels: &[u8], width: u32, height: u32, quality: u8, color: ExtendedColorType) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(pixels, width, height, color)
        .unwrap();
    out.into_inner()
}

pub fn encode_rgb(pixels: &[u8], width: u32, height: u32, quality: u8) -> Vec<u8> {
    encode(pixels, width, height, quality, ExtendedColorType::Rgb8)
}

pub fn encode_gray(pixels: &[u8], width: u32, height: u32, quality: u8) -> Vec<u8> {
    encode(pixels, width, height, quality, ExtendedColorType::L8)
}

/// Deterministic RGB noise over a soft gradient.
pub fn noise_rgb(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            for channel in 0..3 {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let base = (x * 2 + y * 3 + channel * 40) % 256;
                let jitter = (state >> 26) as i32 - 32;
                pixels.push((base as i32 + jitter).clamp(0, 255) as u8);
            }
        }
    }
    pixels
}

/// Smooth diagonal ramp, easy to compare after requantization.
pub fn gradient_gray(width: u32, height: u32) -> Vec<u8> {
    let span = (width + height).saturating_sub(2).max(1);
    (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x + y) * 255 / span) as u8))
        .collect()
}

fn rational(num: u32, denom: u32) -> Value {
    Value::Rational(vec![Rational { num, denom }])
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// A camera-like set of primary image fields.
pub fn sample_fields(orientation: u16) -> Vec<Field> {
    vec![
        field(Tag::Make, Value::Ascii(vec![b"Acme".to_vec()])),
        field(Tag::Orientation, Value::Short(vec![orientation])),
        field(Tag::XResolution, rational(72, 1)),
        field(Tag::YResolution, rational(72, 1)),
        field(Tag::ResolutionUnit, Value::Short(vec![2])),
        field(Tag::FNumber, rational(28, 10)),
        field(Tag::ExposureTime, rational(1, 250)),
        field(Tag::PhotographicSensitivity, Value::Short(vec![200])),
        field(Tag::FocalLength, rational(50, 1)),
    ]
}

/// APP1 payload holding `fields` and an optional thumbnail.
pub fn exif_payload(fields: &[Field], thumbnail: Option<&[u8]>) -> Vec<u8> {
    let mut writer = Writer::new();
    for f in fields {
        writer.push_field(f);
    }
    if let Some(jpeg) = thumbnail {
        writer.set_jpeg(jpeg, In::THUMBNAIL);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let mut payload = EXIF_HEADER.to_vec();
    payload.extend_from_slice(&tiff.into_inner());
    payload
}

pub fn thumbnail_jpeg() -> Vec<u8> {
    encode_rgb(&noise_rgb(16, 8, 2), 16, 8, 75)
}

/// 128x64 photo tagged Rotate90 (displayed as 64x128), with a thumbnail and a comment.
pub fn orient6_jpeg() -> Vec<u8> {
    let pixels = noise_rgb(FIXTURE_WIDTH, FIXTURE_HEIGHT, 1);
    let jpeg = encode_rgb(&pixels, FIXTURE_WIDTH, FIXTURE_HEIGHT, 90);
    let thumb = thumbnail_jpeg();
    let payload = exif_payload(&sample_fields(6), Some(&thumb));
    write_metadata(&jpeg, Some(&payload), FIXTURE_COMMENT).unwrap()
}

/// The fixture cut off halfway through its entropy-coded data.
pub fn truncated_jpeg() -> Vec<u8> {
    let full = orient6_jpeg();
    full[..full.len() / 2].to_vec()
}

/// Rewrite the frame header of `jpeg` in place: its SOF marker code and
/// dimensions. Only the header changes, the scans are left as they are.
pub fn with_frame(jpeg: &[u8], sof: u8, width: u16, height: u16) -> Vec<u8> {
    let mut out = jpeg.to_vec();
    let mut pos = 2;
    while pos + 4 <= out.len() {
        let marker = out[pos + 1];
        let len = u16::from_be_bytes([out[pos + 2], out[pos + 3]]) as usize;
        if (0xC0..=0xC2).contains(&marker) {
            out[pos + 1] = sof;
            out[pos + 5..pos + 7].copy_from_slice(&height.to_be_bytes());
            out[pos + 7..pos + 9].copy_from_slice(&width.to_be_bytes());
            return out;
        }
        pos += 2 + len;
    }
    panic!("no frame header in fixture");
}
