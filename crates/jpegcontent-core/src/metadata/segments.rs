//! Reading metadata out of marker segments and splicing it back in.

use std::borrow::Cow;

use log::debug;

use super::model::{ExifModel, EXIF_HEADER, MAX_SEGMENT_PAYLOAD};
use super::MetadataError;
use crate::codec::{is_app, split_segments, MarkerSegment, APP0, APP1, COM};

/// Exif model and comment from the header segments of a file.
///
/// The first Exif APP1 and the first COM segment win. A file without Exif
/// yields an empty model.
pub fn read_metadata(markers: &[MarkerSegment]) -> Result<(ExifModel, String), MetadataError> {
    let exif = match markers.iter().find(|m| is_exif(m.marker, &m.data)) {
        Some(segment) => ExifModel::from_app1_payload(&segment.data)?,
        None => ExifModel::default(),
    };
    let comment = markers
        .iter()
        .find(|m| m.marker == COM)
        .map(|m| {
            String::from_utf8_lossy(&m.data)
                .trim_end_matches('\0')
                .to_string()
        })
        .unwrap_or_default();
    Ok((exif, comment))
}

/// Replace the Exif segment and comment of `data`.
///
/// Old Exif APP1 and COM segments are dropped. The new Exif segment goes
/// after any leading APP0 (JFIF) segments, the comment after the last APPn
/// segment. Everything from the first SOS on is copied as is.
pub fn write_metadata(
    data: &[u8],
    exif_app1: Option<&[u8]>,
    comment: &str,
) -> Result<Vec<u8>, MetadataError> {
    let layout = split_segments(data)?;

    let mut segments: Vec<(u8, Cow<'_, [u8]>)> = layout
        .segments
        .iter()
        .filter(|s| s.marker != COM && !is_exif(s.marker, s.payload))
        .map(|s| (s.marker, Cow::Borrowed(s.bytes)))
        .collect();

    if let Some(payload) = exif_app1 {
        let at = segments.iter().take_while(|(m, _)| *m == APP0).count();
        segments.insert(at, (APP1, Cow::Owned(encode_segment(APP1, payload)?)));
    }
    if !comment.is_empty() {
        let at = segments
            .iter()
            .rposition(|(m, _)| is_app(*m))
            .map_or(0, |i| i + 1);
        segments.insert(at, (COM, Cow::Owned(encode_segment(COM, comment.as_bytes())?)));
    }

    let size = 2 + segments.iter().map(|(_, b)| b.len()).sum::<usize>() + layout.tail.len();
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&data[..2]);
    for (_, bytes) in &segments {
        out.extend_from_slice(bytes);
    }
    out.extend_from_slice(layout.tail);
    debug!("rewrote metadata: {} -> {} bytes", data.len(), out.len());
    Ok(out)
}

fn is_exif(marker: u8, payload: &[u8]) -> bool {
    marker == APP1 && payload.starts_with(EXIF_HEADER)
}

fn encode_segment(marker: u8, payload: &[u8]) -> Result<Vec<u8>, MetadataError> {
    if payload.len() > MAX_SEGMENT_PAYLOAD {
        return Err(MetadataError::SegmentTooLarge(payload.len()));
    }
    let len = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{read_header, split_segments};
    use crate::test_support::{encode_gray, exif_payload, gradient_gray, sample_fields};

    fn markers_of(data: &[u8]) -> Vec<u8> {
        split_segments(data)
            .unwrap()
            .segments
            .iter()
            .map(|s| s.marker)
            .collect()
    }

    fn jfif_jpeg() -> Vec<u8> {
        encode_gray(&gradient_gray(16, 16), 16, 16, 80)
    }

    #[test]
    fn test_read_metadata_without_exif() {
        let header = read_header(&jfif_jpeg()).unwrap();
        let (exif, comment) = read_metadata(&header.markers).unwrap();
        assert!(exif.is_empty());
        assert_eq!(comment, "");
    }

    #[test]
    fn test_comment_trailing_nuls_trimmed() {
        let markers = vec![MarkerSegment::new(COM, b"hello\0\0".to_vec())];
        let (_, comment) = read_metadata(&markers).unwrap();
        assert_eq!(comment, "hello");
    }

    #[test]
    fn test_corrupt_exif_is_an_error() {
        let mut data = EXIF_HEADER.to_vec();
        data.extend_from_slice(b"II*\0\xff\xff\xff\xff");
        let markers = vec![MarkerSegment::new(APP1, data)];
        assert!(read_metadata(&markers).is_err());
    }

    #[test]
    fn test_write_places_segments() {
        let jpeg = jfif_jpeg();
        let payload = exif_payload(&sample_fields(6), None);
        let out = write_metadata(&jpeg, Some(&payload), "hi").unwrap();

        let markers = markers_of(&out);
        let app1 = markers.iter().position(|&m| m == APP1).unwrap();
        let com = markers.iter().position(|&m| m == COM).unwrap();
        assert!(markers[..app1].iter().all(|&m| m == APP0));
        assert_eq!(com, app1 + 1);

        let header = read_header(&out).unwrap();
        let (exif, comment) = read_metadata(&header.markers).unwrap();
        assert_eq!(comment, "hi");
        assert!(!exif.is_empty());
    }

    #[test]
    fn test_write_replaces_old_segments() {
        let jpeg = jfif_jpeg();
        let payload = exif_payload(&sample_fields(6), None);
        let once = write_metadata(&jpeg, Some(&payload), "first").unwrap();
        let twice = write_metadata(&once, Some(&payload), "second").unwrap();

        let markers = markers_of(&twice);
        assert_eq!(markers.iter().filter(|&&m| m == APP1).count(), 1);
        assert_eq!(markers.iter().filter(|&&m| m == COM).count(), 1);
        let (_, comment) = read_metadata(&read_header(&twice).unwrap().markers).unwrap();
        assert_eq!(comment, "second");
    }

    #[test]
    fn test_write_keeps_image_data() {
        let jpeg = jfif_jpeg();
        let out = write_metadata(&jpeg, None, "").unwrap();
        assert_eq!(out, jpeg);

        let tail = split_segments(&jpeg).unwrap().tail.to_vec();
        let with_comment = write_metadata(&jpeg, None, "note").unwrap();
        assert!(with_comment.ends_with(&tail));
    }

    #[test]
    fn test_write_rejects_oversized_comment() {
        let comment = "x".repeat(70_000);
        assert!(matches!(
            write_metadata(&jfif_jpeg(), None, &comment),
            Err(MetadataError::SegmentTooLarge(70_000))
        ));
    }
}
