//! Marker segment parsing and the header-only probe.

use log::debug;

use super::huffman::{parse_dht, HuffmanSpec};
use super::marker::{
    is_app, is_rst, is_standalone, is_unsupported_sof, MarkerSegment, COM, DAC, DHT, DQT, DRI,
    EOI, SOF0, SOF1, SOF10, SOF2, SOF9, SOI, SOS, TEM, ZIGZAG_TO_NATURAL,
};
use super::source::MemorySource;
use super::CodecError;

/// Largest pixel count the codec will allocate coefficient grids for.
const MAX_PIXELS: u64 = 1 << 28;

/// Coding process announced by the SOF marker.
///
/// The arithmetic-coded processes are recognised so their headers can be
/// probed, but their scans cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Baseline,
    Extended,
    Progressive,
    ArithmeticSequential,
    ArithmeticProgressive,
}

impl FrameKind {
    fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            SOF0 => Some(FrameKind::Baseline),
            SOF1 => Some(FrameKind::Extended),
            SOF2 => Some(FrameKind::Progressive),
            SOF9 => Some(FrameKind::ArithmeticSequential),
            SOF10 => Some(FrameKind::ArithmeticProgressive),
            _ => None,
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            FrameKind::ArithmeticSequential | FrameKind::ArithmeticProgressive
        )
    }
}

/// One component of the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub id: u8,
    /// Horizontal sampling factor (1-4).
    pub h: u8,
    /// Vertical sampling factor (1-4).
    pub v: u8,
    /// Quantization table selector.
    pub tq: u8,
}

/// Frame header (SOFn).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: Vec<Component>,
}

impl Frame {
    fn parse(kind: FrameKind, payload: &[u8]) -> Result<Self, CodecError> {
        if payload.len() < 6 {
            return Err(CodecError::Malformed("short SOF segment"));
        }
        let precision = payload[0];
        let height = u16::from_be_bytes([payload[1], payload[2]]);
        let width = u16::from_be_bytes([payload[3], payload[4]]);
        let count = payload[5] as usize;

        if precision != 8 {
            return Err(CodecError::Unsupported("sample precision other than 8 bits"));
        }
        if width == 0 || height == 0 {
            return Err(CodecError::Malformed("zero image dimension"));
        }
        if !(1..=4).contains(&count) || payload.len() < 6 + 3 * count {
            return Err(CodecError::Malformed("bad component count in SOF"));
        }
        let mut components: Vec<Component> = Vec::with_capacity(count);
        for chunk in payload[6..6 + 3 * count].chunks_exact(3) {
            let component = Component {
                id: chunk[0],
                h: chunk[1] >> 4,
                v: chunk[1] & 0x0F,
                tq: chunk[2],
            };
            if !(1..=4).contains(&component.h) || !(1..=4).contains(&component.v) {
                return Err(CodecError::Malformed("bad sampling factor"));
            }
            if component.tq > 3 {
                return Err(CodecError::Malformed("bad quantization table selector"));
            }
            if components.iter().any(|c| c.id == component.id) {
                return Err(CodecError::Malformed("duplicate component id"));
            }
            components.push(component);
        }

        Ok(Frame {
            kind,
            precision,
            width,
            height,
            components,
        })
    }

    /// Fail unless the scans of this frame can be decoded into coefficient grids.
    pub(crate) fn check_decodable(&self) -> Result<(), CodecError> {
        if self.kind.is_arithmetic() {
            return Err(CodecError::Unsupported("arithmetic coding"));
        }
        if u64::from(self.width) * u64::from(self.height) > MAX_PIXELS {
            return Err(CodecError::TooLarge {
                width: u32::from(self.width),
                height: u32::from(self.height),
            });
        }
        Ok(())
    }

    /// SOF payload for this frame.
    pub(crate) fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + 3 * self.components.len());
        out.push(self.precision);
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.push(self.components.len() as u8);
        for c in &self.components {
            out.extend_from_slice(&[c.id, (c.h << 4) | c.v, c.tq]);
        }
        out
    }

    pub fn max_h(&self) -> usize {
        self.components.iter().map(|c| c.h as usize).max().unwrap_or(1)
    }

    pub fn max_v(&self) -> usize {
        self.components.iter().map(|c| c.v as usize).max().unwrap_or(1)
    }

    /// MCU columns of an interleaved scan.
    pub fn mcu_cols(&self) -> usize {
        (self.width as usize).div_ceil(8 * self.max_h())
    }

    /// MCU rows of an interleaved scan.
    pub fn mcu_rows(&self) -> usize {
        (self.height as usize).div_ceil(8 * self.max_v())
    }

    /// Blocks covering the component's samples; what a non-interleaved scan visits.
    pub fn block_dims(&self, index: usize) -> (usize, usize) {
        let c = &self.components[index];
        (
            (self.width as usize * c.h as usize).div_ceil(8 * self.max_h()),
            (self.height as usize * c.v as usize).div_ceil(8 * self.max_v()),
        )
    }

    /// Blocks stored per component, padded out to whole MCUs.
    pub fn grid_dims(&self, index: usize) -> (usize, usize) {
        if self.components.len() == 1 {
            return self.block_dims(index);
        }
        let c = &self.components[index];
        (
            self.mcu_cols() * c.h as usize,
            self.mcu_rows() * c.v as usize,
        )
    }

    /// The frame after exchanging the x and y axes.
    pub fn transposed(&self) -> Frame {
        Frame {
            width: self.height,
            height: self.width,
            components: self
                .components
                .iter()
                .map(|c| Component {
                    h: c.v,
                    v: c.h,
                    ..*c
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// Quantization table in natural (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    pub values: [u16; 64],
}

impl QuantTable {
    pub fn transposed(&self) -> QuantTable {
        let mut values = [0u16; 64];
        for (i, v) in values.iter_mut().enumerate() {
            *v = self.values[(i % 8) * 8 + i / 8];
        }
        QuantTable { values }
    }

    /// DQT payload for this table under the given id.
    pub(crate) fn to_payload(&self, id: u8) -> Vec<u8> {
        let wide = self.values.iter().any(|&v| v > 255);
        let mut out = Vec::with_capacity(1 + 128);
        out.push(((wide as u8) << 4) | id);
        for &n in &ZIGZAG_TO_NATURAL {
            let v = self.values[n];
            if wide {
                out.extend_from_slice(&v.to_be_bytes());
            } else {
                out.push(v as u8);
            }
        }
        out
    }

    pub(crate) fn is_wide(&self) -> bool {
        self.values.iter().any(|&v| v > 255)
    }
}

fn parse_dqt(payload: &[u8]) -> Result<Vec<(u8, QuantTable)>, CodecError> {
    let mut tables = Vec::new();
    let mut rest = payload;
    while let Some((&pq_tq, tail)) = rest.split_first() {
        let wide = pq_tq >> 4;
        let id = pq_tq & 0x0F;
        if wide > 1 || id > 3 {
            return Err(CodecError::Malformed("bad DQT table header"));
        }
        let size = if wide == 1 { 128 } else { 64 };
        if tail.len() < size {
            return Err(CodecError::Malformed("short DQT segment"));
        }
        let mut values = [0u16; 64];
        for (k, &n) in ZIGZAG_TO_NATURAL.iter().enumerate() {
            values[n] = if wide == 1 {
                u16::from_be_bytes([tail[2 * k], tail[2 * k + 1]])
            } else {
                u16::from(tail[k])
            };
        }
        tables.push((id, QuantTable { values }));
        rest = &tail[size..];
    }
    Ok(tables)
}

fn parse_dri(payload: &[u8]) -> Result<u16, CodecError> {
    match payload {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(CodecError::Malformed("DRI segment length")),
    }
}

/// Component selector of a scan header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScanComponent {
    /// Index into the frame's component list.
    pub index: usize,
    pub dc: usize,
    pub ac: usize,
}

/// Scan header (SOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScanHeader {
    pub components: Vec<ScanComponent>,
    /// Spectral selection start.
    pub ss: usize,
    /// Spectral selection end.
    pub se: usize,
    /// Successive approximation high bit.
    pub ah: u8,
    /// Successive approximation low bit.
    pub al: u8,
}

pub(crate) fn parse_sos(payload: &[u8], frame: &Frame) -> Result<ScanHeader, CodecError> {
    let count = *payload.first().ok_or(CodecError::Malformed("empty SOS"))? as usize;
    if !(1..=4).contains(&count) || payload.len() != 1 + 2 * count + 3 {
        return Err(CodecError::Malformed("bad SOS length"));
    }

    let mut components = Vec::with_capacity(count);
    for pair in payload[1..1 + 2 * count].chunks_exact(2) {
        let index = frame
            .components
            .iter()
            .position(|c| c.id == pair[0])
            .ok_or(CodecError::Malformed("scan references unknown component"))?;
        let dc = (pair[1] >> 4) as usize;
        let ac = (pair[1] & 0x0F) as usize;
        if dc > 3 || ac > 3 {
            return Err(CodecError::Malformed("bad Huffman table selector"));
        }
        components.push(ScanComponent { index, dc, ac });
    }

    let tail = &payload[1 + 2 * count..];
    let scan = ScanHeader {
        components,
        ss: tail[0] as usize,
        se: tail[1] as usize,
        ah: tail[2] >> 4,
        al: tail[2] & 0x0F,
    };

    if scan.components.len() > 1 {
        let blocks: usize = scan
            .components
            .iter()
            .map(|sc| {
                let c = &frame.components[sc.index];
                c.h as usize * c.v as usize
            })
            .sum();
        if blocks > 10 {
            return Err(CodecError::Malformed("too many blocks per MCU"));
        }
    }

    if frame.kind == FrameKind::Progressive {
        let dc_scan = scan.ss == 0;
        if scan.se > 63 || scan.ss > scan.se || (dc_scan && scan.se != 0) {
            return Err(CodecError::Malformed("bad progressive spectral selection"));
        }
        if !dc_scan && scan.components.len() != 1 {
            return Err(CodecError::Malformed("interleaved progressive AC scan"));
        }
        if scan.al > 13 || scan.ah > 13 {
            return Err(CodecError::Malformed("bad successive approximation"));
        }
    }

    Ok(scan)
}

/// Everything the header segments define before (and between) scans.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub frame: Option<Frame>,
    pub quant: [Option<QuantTable>; 4],
    pub dc: [Option<HuffmanSpec>; 4],
    pub ac: [Option<HuffmanSpec>; 4],
    pub restart_interval: u16,
    pub markers: Vec<MarkerSegment>,
}

impl Tables {
    /// Consume one marker other than SOS/EOI.
    pub fn process(&mut self, marker: u8, src: &mut MemorySource<'_>) -> Result<(), CodecError> {
        if let Some(kind) = FrameKind::from_marker(marker) {
            if self.frame.is_some() {
                return Err(CodecError::Malformed("more than one frame header"));
            }
            self.frame = Some(Frame::parse(kind, src.read_segment()?)?);
            return Ok(());
        }
        if is_unsupported_sof(marker) {
            return Err(CodecError::Unsupported(match marker {
                0xC3 | 0xCB => "lossless process",
                _ => "hierarchical process",
            }));
        }

        match marker {
            DAC => {
                debug!("skipping arithmetic conditioning table");
                src.read_segment()?;
                Ok(())
            }
            DHT => {
                for spec in parse_dht(src.read_segment()?)? {
                    let id = spec.id as usize;
                    if spec.class == 0 {
                        self.dc[id] = Some(spec);
                    } else {
                        self.ac[id] = Some(spec);
                    }
                }
                Ok(())
            }
            DQT => {
                for (id, table) in parse_dqt(src.read_segment()?)? {
                    self.quant[id as usize] = Some(table);
                }
                Ok(())
            }
            DRI => {
                self.restart_interval = parse_dri(src.read_segment()?)?;
                Ok(())
            }
            SOI => Err(CodecError::Malformed("unexpected SOI")),
            m if is_app(m) || m == COM => {
                let data = src.read_segment()?.to_vec();
                self.markers.push(MarkerSegment::new(m, data));
                Ok(())
            }
            m if is_rst(m) || m == TEM => {
                debug!("ignoring stray marker 0x{:02X}", m);
                Ok(())
            }
            m => {
                debug!("skipping marker segment 0x{:02X}", m);
                src.read_segment()?;
                Ok(())
            }
        }
    }
}

pub(crate) fn expect_soi(src: &mut MemorySource<'_>) -> Result<(), CodecError> {
    match (src.read_u8(), src.read_u8()) {
        (Ok(0xFF), Ok(SOI)) => Ok(()),
        _ => Err(CodecError::NotJpeg),
    }
}

/// Result of the header-only probe.
#[derive(Debug, Clone)]
pub struct Header {
    pub frame: Frame,
    /// APPn and COM segments, in file order.
    pub markers: Vec<MarkerSegment>,
}

impl Header {
    pub fn width(&self) -> u32 {
        u32::from(self.frame.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.frame.height)
    }
}

/// Read frame dimensions and the metadata segments without decoding.
///
/// Stops at the first SOS; the entropy-coded data and EOI are never looked
/// at, so a file cut short after its header still probes fine. Frames the
/// codec could not transform (arithmetic coding, very large images) still
/// probe; the coefficient reader is where those are refused.
pub fn read_header(data: &[u8]) -> Result<Header, CodecError> {
    let mut src = MemorySource::new(data);
    expect_soi(&mut src)?;
    let mut tables = Tables::default();

    loop {
        match src.next_marker() {
            SOS => break,
            EOI if src.truncated() => return Err(CodecError::Truncated),
            EOI => return Err(CodecError::Malformed("no image before EOI")),
            marker => tables.process(marker, &mut src)?,
        }
    }

    let frame = tables
        .frame
        .ok_or(CodecError::Malformed("scan before frame header"))?;
    Ok(Header {
        frame,
        markers: tables.markers,
    })
}

/// A marker segment as it sits in the file.
pub(crate) struct RawSegment<'a> {
    pub marker: u8,
    pub payload: &'a [u8],
    /// Marker, length and payload.
    pub bytes: &'a [u8],
}

pub(crate) struct SegmentLayout<'a> {
    pub segments: Vec<RawSegment<'a>>,
    /// Everything from the first SOS (or EOI) on.
    pub tail: &'a [u8],
}

/// Split the header part of a file into its segments without interpreting them.
pub(crate) fn split_segments(data: &[u8]) -> Result<SegmentLayout<'_>, CodecError> {
    if !data.starts_with(&[0xFF, SOI]) {
        return Err(CodecError::NotJpeg);
    }
    let mut segments = Vec::new();
    let mut pos = 2;

    loop {
        if pos >= data.len() {
            return Err(CodecError::Truncated);
        }
        if data[pos] != 0xFF {
            return Err(CodecError::Malformed("expected a marker"));
        }
        let start = pos;
        while pos < data.len() && data[pos] == 0xFF {
            pos += 1;
        }
        let marker = *data.get(pos).ok_or(CodecError::Truncated)?;
        pos += 1;

        if marker == SOS || marker == EOI {
            return Ok(SegmentLayout {
                segments,
                tail: &data[start..],
            });
        }
        if is_standalone(marker) {
            segments.push(RawSegment {
                marker,
                payload: &[],
                bytes: &data[start..pos],
            });
            continue;
        }

        let len_bytes = data.get(pos..pos + 2).ok_or(CodecError::Truncated)?;
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if len < 2 {
            return Err(CodecError::Malformed("marker segment length below 2"));
        }
        let end = pos + len;
        let payload = data.get(pos + 2..end).ok_or(CodecError::Truncated)?;
        segments.push(RawSegment {
            marker,
            payload,
            bytes: &data[start..end],
        });
        pos = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sof_payload(width: u16, height: u16, comps: &[(u8, u8, u8, u8)]) -> Vec<u8> {
        let mut p = vec![8];
        p.extend_from_slice(&height.to_be_bytes());
        p.extend_from_slice(&width.to_be_bytes());
        p.push(comps.len() as u8);
        for &(id, h, v, tq) in comps {
            p.extend_from_slice(&[id, (h << 4) | v, tq]);
        }
        p
    }

    fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn ycc420(width: u16, height: u16) -> Frame {
        Frame::parse(
            FrameKind::Baseline,
            &sof_payload(width, height, &[(1, 2, 2, 0), (2, 1, 1, 1), (3, 1, 1, 1)]),
        )
        .unwrap()
    }

    #[test]
    fn test_frame_geometry_420() {
        let frame = ycc420(100, 50);
        assert_eq!(frame.max_h(), 2);
        assert_eq!(frame.mcu_cols(), 7);
        assert_eq!(frame.mcu_rows(), 4);
        assert_eq!(frame.block_dims(0), (13, 7));
        assert_eq!(frame.block_dims(1), (7, 4));
        assert_eq!(frame.grid_dims(0), (14, 8));
        assert_eq!(frame.grid_dims(1), (7, 4));
    }

    #[test]
    fn test_frame_geometry_grayscale() {
        let frame = Frame::parse(FrameKind::Baseline, &sof_payload(17, 9, &[(1, 1, 1, 0)])).unwrap();
        assert_eq!(frame.grid_dims(0), (3, 2));
        assert_eq!(frame.block_dims(0), (3, 2));
    }

    #[test]
    fn test_frame_transposed() {
        let frame = Frame::parse(
            FrameKind::Progressive,
            &sof_payload(64, 32, &[(1, 2, 1, 0), (2, 1, 1, 1), (3, 1, 1, 1)]),
        )
        .unwrap();
        let t = frame.transposed();
        assert_eq!((t.width, t.height), (32, 64));
        assert_eq!((t.components[0].h, t.components[0].v), (1, 2));
        assert_eq!(t.kind, FrameKind::Progressive);
        assert_eq!(t.grid_dims(0), (frame.grid_dims(0).1, frame.grid_dims(0).0));
    }

    #[test]
    fn test_frame_payload_roundtrip() {
        let payload = sof_payload(640, 480, &[(1, 2, 2, 0), (2, 1, 1, 1), (3, 1, 1, 1)]);
        let frame = Frame::parse(FrameKind::Baseline, &payload).unwrap();
        assert_eq!(frame.to_payload(), payload);
    }

    #[test]
    fn test_frame_rejects_bad_headers() {
        let mut twelve_bit = sof_payload(8, 8, &[(1, 1, 1, 0)]);
        twelve_bit[0] = 12;
        assert!(matches!(
            Frame::parse(FrameKind::Extended, &twelve_bit),
            Err(CodecError::Unsupported(_))
        ));
        assert!(Frame::parse(FrameKind::Baseline, &sof_payload(0, 8, &[(1, 1, 1, 0)])).is_err());
        assert!(Frame::parse(FrameKind::Baseline, &sof_payload(8, 8, &[(1, 5, 1, 0)])).is_err());
        assert!(
            Frame::parse(FrameKind::Baseline, &sof_payload(8, 8, &[(1, 1, 1, 0), (1, 1, 1, 0)]))
                .is_err()
        );
    }

    #[test]
    fn test_dqt_zigzag_to_natural() {
        let mut payload = vec![0x00];
        payload.extend((1..=64).map(|v| v as u8));
        let tables = parse_dqt(&payload).unwrap();
        assert_eq!(tables.len(), 1);
        let table = &tables[0].1;
        assert_eq!(table.values[0], 1);
        assert_eq!(table.values[1], 2);
        assert_eq!(table.values[8], 3);
        assert_eq!(table.to_payload(0), payload);
    }

    #[test]
    fn test_dqt_sixteen_bit() {
        let mut payload = vec![0x11];
        for _ in 0..64 {
            payload.extend_from_slice(&300u16.to_be_bytes());
        }
        let tables = parse_dqt(&payload).unwrap();
        assert_eq!(tables[0].0, 1);
        assert!(tables[0].1.is_wide());
        assert_eq!(tables[0].1.to_payload(1), payload);
    }

    #[test]
    fn test_quant_transpose() {
        let mut values = [0u16; 64];
        values[1] = 5; // row 0, col 1
        let t = QuantTable { values }.transposed();
        assert_eq!(t.values[8], 5);
        assert_eq!(t.values[1], 0);
    }

    #[test]
    fn test_parse_sos_progressive_rules() {
        let frame = Frame::parse(
            FrameKind::Progressive,
            &sof_payload(16, 16, &[(1, 1, 1, 0), (2, 1, 1, 1)]),
        )
        .unwrap();
        let dc = parse_sos(&[2, 1, 0x00, 2, 0x11, 0, 0, 0x01], &frame).unwrap();
        assert_eq!(dc.components.len(), 2);
        assert_eq!(dc.al, 1);
        assert_eq!(dc.components[1].dc, 1);

        // AC scans must be single-component
        assert!(parse_sos(&[2, 1, 0x00, 2, 0x11, 1, 5, 0x00], &frame).is_err());
        // DC scan must stop at 0
        assert!(parse_sos(&[1, 1, 0x00, 0, 5, 0x00], &frame).is_err());
        // unknown component
        assert!(parse_sos(&[1, 9, 0x00, 1, 5, 0x00], &frame).is_err());
    }

    #[test]
    fn test_read_header_keeps_app_and_com() {
        let mut data = vec![0xFF, SOI];
        data.extend(segment(0xE0, b"JFIF\0"));
        data.extend(segment(COM, b"hello"));
        data.extend(segment(SOF0, &sof_payload(33, 17, &[(1, 1, 1, 0)])));
        data.extend(segment(SOS, &[1, 1, 0x00, 0, 63, 0]));
        // no entropy data, no EOI

        let header = read_header(&data).unwrap();
        assert_eq!((header.width(), header.height()), (33, 17));
        assert_eq!(header.markers.len(), 2);
        assert_eq!(header.markers[1], MarkerSegment::new(COM, b"hello".to_vec()));
    }

    #[test]
    fn test_read_header_errors() {
        assert!(matches!(read_header(&[]), Err(CodecError::NotJpeg)));
        assert!(matches!(read_header(b"GIF89a"), Err(CodecError::NotJpeg)));

        let mut eoi_only = vec![0xFF, SOI, 0xFF, EOI];
        assert!(matches!(read_header(&eoi_only), Err(CodecError::Malformed(_))));

        eoi_only.truncate(2);
        assert!(matches!(read_header(&eoi_only), Err(CodecError::Truncated)));

        let mut lossless = vec![0xFF, SOI];
        lossless.extend(segment(0xC3, &sof_payload(8, 8, &[(1, 1, 1, 0)])));
        assert!(matches!(read_header(&lossless), Err(CodecError::Unsupported(_))));

        let mut cut = vec![0xFF, SOI];
        cut.extend(segment(0xE1, &[0u8; 40]));
        cut.truncate(20);
        assert!(matches!(read_header(&cut), Err(CodecError::Truncated)));
    }

    #[test]
    fn test_read_header_accepts_what_it_cannot_decode() {
        let mut data = vec![0xFF, SOI];
        data.extend(segment(DAC, &[0x00, 0x10]));
        data.extend(segment(SOF9, &sof_payload(20000, 20000, &[(1, 1, 1, 0)])));
        data.extend(segment(SOS, &[1, 1, 0x00, 0, 63, 0]));

        let header = read_header(&data).unwrap();
        assert_eq!((header.width(), header.height()), (20000, 20000));
        assert_eq!(header.frame.kind, FrameKind::ArithmeticSequential);
        assert!(matches!(
            header.frame.check_decodable(),
            Err(CodecError::Unsupported(_))
        ));

        let huge = Frame::parse(
            FrameKind::Baseline,
            &sof_payload(20000, 20000, &[(1, 1, 1, 0)]),
        )
        .unwrap();
        assert!(matches!(
            huge.check_decodable(),
            Err(CodecError::TooLarge {
                width: 20000,
                height: 20000
            })
        ));
        assert!(ycc420(640, 480).check_decodable().is_ok());
    }

    #[test]
    fn test_split_segments() {
        let mut data = vec![0xFF, SOI];
        data.extend(segment(0xE0, b"JFIF\0"));
        data.extend(segment(0xE1, b"Exif\0\0"));
        data.extend(segment(SOS, &[1, 1, 0, 0, 63, 0]));
        data.extend([0x12, 0x34, 0xFF, EOI]);

        let layout = split_segments(&data).unwrap();
        assert_eq!(layout.segments.len(), 2);
        assert_eq!(layout.segments[0].marker, 0xE0);
        assert_eq!(layout.segments[0].payload, b"JFIF\0");
        assert_eq!(layout.segments[1].bytes.len(), 2 + 2 + 6);
        assert_eq!(&layout.tail[..2], &[0xFF, SOS]);
        assert_eq!(&layout.tail[layout.tail.len() - 2..], &[0xFF, EOI]);
    }
}
