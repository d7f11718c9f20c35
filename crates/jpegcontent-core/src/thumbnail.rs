//! Embedded Exif thumbnail decoding and encoding.
//!
//! Thumbnails are small enough that they are handled in the pixel domain
//! with the `image` crate, unlike the main image.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::orientation::TransformCode;

/// Error types for thumbnail handling.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The image data could not be decoded
    #[error("Thumbnail decoding failed: {0}")]
    DecodeFailed(String),

    /// JPEG encoding failed
    #[error("Thumbnail encoding failed: {0}")]
    EncodeFailed(String),
}

/// Decode thumbnail (or any image) bytes.
pub fn decode_thumbnail(bytes: &[u8]) -> Result<DynamicImage, ThumbnailError> {
    image::load_from_memory(bytes).map_err(|e| ThumbnailError::DecodeFailed(e.to_string()))
}

/// Encode an image as a baseline RGB JPEG.
///
/// `quality` is clamped to 1-100.
pub fn encode_thumbnail(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ThumbnailError::EncodeFailed(e.to_string()))?;
    Ok(out.into_inner())
}

/// Apply a dihedral transform in the pixel domain.
pub fn apply_transform(image: DynamicImage, code: TransformCode) -> DynamicImage {
    match code {
        TransformCode::None => image,
        TransformCode::FlipH => image.fliph(),
        TransformCode::FlipV => image.flipv(),
        TransformCode::Transpose => image.rotate90().fliph(),
        TransformCode::Transverse => image.rotate270().fliph(),
        TransformCode::Rot90 => image.rotate90(),
        TransformCode::Rot180 => image.rotate180(),
        TransformCode::Rot270 => image.rotate270(),
    }
}

/// Render a thumbnail of a whole image as it will look once `pending` is applied.
///
/// The result fits in a `max_edge` square and keeps the aspect ratio.
pub fn render_thumbnail(
    bytes: &[u8],
    pending: Option<TransformCode>,
    max_edge: u32,
) -> Result<DynamicImage, ThumbnailError> {
    let image = decode_thumbnail(bytes)?;
    let image = match pending {
        Some(code) => apply_transform(image, code),
        None => image,
    };
    let edge = max_edge.max(1);
    Ok(image.thumbnail(edge, edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::encode_rgb;
    use image::GenericImageView;

    /// 32x16, white on the left half, black on the right.
    fn split_jpeg() -> Vec<u8> {
        let mut pixels = Vec::new();
        for _y in 0..16 {
            for x in 0..32 {
                let v = if x < 16 { 255 } else { 0 };
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        encode_rgb(&pixels, 32, 16, 90)
    }

    #[test]
    fn test_encode_decode_thumbnail() {
        let image = DynamicImage::new_rgb8(20, 10);
        let jpeg = encode_thumbnail(&image, 0).unwrap();
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(decode_thumbnail(&jpeg).unwrap().dimensions(), (20, 10));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_thumbnail(b"nope"),
            Err(ThumbnailError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_render_scales_to_fit() {
        let thumb = render_thumbnail(&split_jpeg(), None, 8).unwrap();
        assert_eq!(thumb.dimensions(), (8, 4));
        let rotated = render_thumbnail(&split_jpeg(), Some(TransformCode::Rot90), 8).unwrap();
        assert_eq!(rotated.dimensions(), (4, 8));
    }

    #[test]
    fn test_render_applies_rotation() {
        let rotated = render_thumbnail(&split_jpeg(), Some(TransformCode::Rot90), 32)
            .unwrap()
            .to_luma8();
        assert_eq!(rotated.dimensions(), (16, 32));
        assert!(rotated.get_pixel(8, 4)[0] > 200);
        assert!(rotated.get_pixel(8, 28)[0] < 50);
    }

    #[test]
    fn test_transpose_matches_rotation_and_flip() {
        let image = decode_thumbnail(&split_jpeg()).unwrap();
        let a = apply_transform(image.clone(), TransformCode::Transpose).to_luma8();
        let b = apply_transform(
            apply_transform(image, TransformCode::Rot90),
            TransformCode::FlipH,
        )
        .to_luma8();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
