//! JPEG files for the binding tests.

use std::io::Cursor;

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use jpegcontent_core::metadata::{write_metadata, EXIF_HEADER};

fn encode(width: u32, height: u32) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width * height * 3).map(|i| (i * 7 % 251) as u8).collect();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, 85)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out.into_inner()
}

/// A JPEG without any metadata.
pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height)
}

/// A 40x24 JPEG with Make, the given orientation and a thumbnail.
pub fn tagged_jpeg(orientation: u16) -> Vec<u8> {
    let fields = [
        Field {
            tag: Tag::Make,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"Acme".to_vec()]),
        },
        Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![orientation]),
        },
    ];
    let thumbnail = encode(10, 6);
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    writer.set_jpeg(&thumbnail, In::THUMBNAIL);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, true).unwrap();

    let mut payload = EXIF_HEADER.to_vec();
    payload.extend_from_slice(&tiff.into_inner());
    write_metadata(&encode(40, 24), Some(&payload), "").unwrap()
}
