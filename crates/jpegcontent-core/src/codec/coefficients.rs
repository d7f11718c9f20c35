//! A JPEG image held as quantized DCT coefficients.

use log::debug;

use super::destination::MemoryDestination;
use super::header::{expect_soi, parse_sos, Frame, QuantTable, Tables};
use super::marker::{MarkerSegment, DHT, DQT, EOI, SOF0, SOF1, SOI, SOS};
use super::scan::{decode_scan, encode_scan, optimal_tables};
use super::source::MemorySource;
use super::CodecError;

/// Coefficient blocks of one component, row-major, each block in natural order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientGrid {
    blocks_wide: usize,
    blocks_tall: usize,
    blocks: Vec<[i16; 64]>,
}

impl CoefficientGrid {
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            blocks: vec![[0; 64]; blocks_wide * blocks_tall],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    pub fn block(&self, bx: usize, by: usize) -> &[i16; 64] {
        &self.blocks[by * self.blocks_wide + bx]
    }

    pub fn block_mut(&mut self, bx: usize, by: usize) -> &mut [i16; 64] {
        &mut self.blocks[by * self.blocks_wide + bx]
    }
}

/// Decoded coefficient image plus what is needed to write it back.
#[derive(Debug, Clone)]
pub struct CoefficientImage {
    pub frame: Frame,
    pub quant_tables: [Option<QuantTable>; 4],
    pub grids: Vec<CoefficientGrid>,
    /// APPn and COM segments to carry over, in file order.
    pub markers: Vec<MarkerSegment>,
    /// The entropy-coded data ended early and was padded out.
    pub truncated: bool,
}

impl CoefficientImage {
    /// Decode every scan of `data` into coefficient grids.
    pub fn read(data: &[u8]) -> Result<Self, CodecError> {
        let mut src = MemorySource::new(data);
        expect_soi(&mut src)?;

        let mut tables = Tables::default();
        let mut image: Option<(Frame, Vec<CoefficientGrid>)> = None;
        let mut scans = 0usize;
        let mut marker = src.next_marker();

        loop {
            match marker {
                EOI => break,
                SOS => {
                    let frame_header = tables
                        .frame
                        .as_ref()
                        .ok_or(CodecError::Malformed("scan before frame header"))?;
                    frame_header.check_decodable()?;
                    let scan = parse_sos(src.read_segment()?, frame_header)?;
                    let (frame, grids) = image.get_or_insert_with(|| allocate(frame_header));
                    marker = decode_scan(&mut src, frame, &scan, &tables, grids)?;
                    scans += 1;
                    continue;
                }
                other => tables.process(other, &mut src)?,
            }
            marker = src.next_marker();
        }

        let Some((frame, grids)) = image else {
            return Err(if src.truncated() {
                CodecError::Truncated
            } else {
                CodecError::Malformed("no image before EOI")
            });
        };
        for c in &frame.components {
            if tables.quant[c.tq as usize].is_none() {
                return Err(CodecError::MissingTable {
                    kind: "quantization",
                    id: c.tq,
                });
            }
        }
        debug!(
            "decoded {}x{} JPEG, {} scan(s), {} component(s)",
            frame.width,
            frame.height,
            scans,
            frame.components.len()
        );

        Ok(CoefficientImage {
            frame,
            quant_tables: tables.quant,
            grids,
            markers: tables.markers,
            truncated: src.truncated(),
        })
    }

    /// Encode as a baseline sequential JPEG with optimized Huffman tables.
    pub fn write(&self) -> Result<Vec<u8>, CodecError> {
        let coefficient_bytes: usize = self.grids.iter().map(|g| g.blocks.len() * 16).sum();
        let mut dst = MemoryDestination::with_capacity_hint(coefficient_bytes);
        dst.put(&[0xFF, SOI]);

        for m in &self.markers {
            dst.put_segment(m.marker, &m.data);
        }

        let mut wide = false;
        for id in 0..4u8 {
            if !self.frame.components.iter().any(|c| c.tq == id) {
                continue;
            }
            let table = self.quant_tables[id as usize]
                .as_ref()
                .ok_or(CodecError::MissingTable {
                    kind: "quantization",
                    id,
                })?;
            wide |= table.is_wide();
            dst.put_segment(DQT, &table.to_payload(id));
        }

        // 16-bit quantization tables are not allowed in baseline frames.
        let sof = if wide { SOF1 } else { SOF0 };
        dst.put_segment(sof, &self.frame.to_payload());

        let specs = optimal_tables(&self.frame, &self.grids);
        let mut dht = Vec::new();
        for spec in &specs {
            dht.extend(spec.to_payload());
        }
        dst.put_segment(DHT, &dht);

        let mut sos = vec![self.frame.components.len() as u8];
        for (i, c) in self.frame.components.iter().enumerate() {
            let t = u8::from(i > 0);
            sos.extend_from_slice(&[c.id, (t << 4) | t]);
        }
        sos.extend_from_slice(&[0, 63, 0]);
        dst.put_segment(SOS, &sos);

        encode_scan(&self.frame, &self.grids, &specs, &mut dst)?;
        dst.put(&[0xFF, EOI]);
        Ok(dst.finish())
    }
}

/// Grids for every component; single-component frames are normalized to 1x1 sampling.
fn allocate(header: &Frame) -> (Frame, Vec<CoefficientGrid>) {
    let mut frame = header.clone();
    if let [only] = frame.components.as_mut_slice() {
        only.h = 1;
        only.v = 1;
    }
    let grids = (0..frame.components.len())
        .map(|i| {
            let (w, h) = frame.grid_dims(i);
            CoefficientGrid::new(w, h)
        })
        .collect();
    (frame, grids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FrameKind;
    use crate::test_support::{encode_gray, encode_rgb, gradient_gray, noise_rgb, with_frame};

    #[test]
    fn test_read_baseline_rgb() {
        let jpeg = encode_rgb(&noise_rgb(48, 32, 7), 48, 32, 85);
        let image = CoefficientImage::read(&jpeg).unwrap();
        assert_eq!((image.frame.width, image.frame.height), (48, 32));
        assert_eq!(image.frame.kind, FrameKind::Baseline);
        assert_eq!(image.grids.len(), 3);
        assert!(!image.truncated);
        for (i, grid) in image.grids.iter().enumerate() {
            assert_eq!(
                (grid.blocks_wide(), grid.blocks_tall()),
                image.frame.grid_dims(i)
            );
        }
        // noise has energy well beyond DC
        assert!(image.grids[0].blocks.iter().any(|b| b[1..].iter().any(|&c| c != 0)));
    }

    #[test]
    fn test_rewrite_preserves_coefficients() {
        let jpeg = encode_rgb(&noise_rgb(40, 24, 3), 40, 24, 90);
        let image = CoefficientImage::read(&jpeg).unwrap();
        let rewritten = image.write().unwrap();
        let again = CoefficientImage::read(&rewritten).unwrap();
        assert_eq!(again.frame, image.frame);
        assert_eq!(again.grids, image.grids);
        assert_eq!(again.quant_tables, image.quant_tables);
    }

    #[test]
    fn test_rewrite_decodes_to_same_pixels() {
        let jpeg = encode_gray(&gradient_gray(33, 17), 33, 17, 90);
        let rewritten = CoefficientImage::read(&jpeg).unwrap().write().unwrap();
        let a = image::load_from_memory(&jpeg).unwrap().to_luma8();
        let b = image::load_from_memory(&rewritten).unwrap().to_luma8();
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_markers_carried_over() {
        let jpeg = encode_gray(&gradient_gray(16, 16), 16, 16, 80);
        let mut image = CoefficientImage::read(&jpeg).unwrap();
        image
            .markers
            .push(MarkerSegment::new(0xFE, b"kept".to_vec()));
        let rewritten = image.write().unwrap();
        let again = CoefficientImage::read(&rewritten).unwrap();
        assert_eq!(again.markers.last().unwrap().data, b"kept");
    }

    #[test]
    fn test_truncated_scan_is_padded() {
        let jpeg = encode_rgb(&noise_rgb(64, 64, 11), 64, 64, 90);
        let cut = &jpeg[..jpeg.len() * 2 / 3];
        let image = CoefficientImage::read(cut).unwrap();
        assert!(image.truncated);
        let last = image.grids[0].block(7, 7);
        assert!(last.iter().all(|&c| c == 0));
        assert!(image.write().is_ok());
    }

    #[test]
    fn test_refuses_frames_it_cannot_decode() {
        let jpeg = encode_gray(&gradient_gray(16, 16), 16, 16, 80);

        let arithmetic = with_frame(&jpeg, 0xC9, 16, 16);
        assert!(matches!(
            CoefficientImage::read(&arithmetic),
            Err(CodecError::Unsupported("arithmetic coding"))
        ));

        let huge = with_frame(&jpeg, 0xC0, 20000, 20000);
        assert!(matches!(
            CoefficientImage::read(&huge),
            Err(CodecError::TooLarge {
                width: 20000,
                height: 20000
            })
        ));
    }

    #[test]
    fn test_rejects_header_only_file() {
        let jpeg = encode_gray(&gradient_gray(16, 16), 16, 16, 80);
        let header = crate::codec::read_header(&jpeg).unwrap();
        assert_eq!(header.width(), 16);
        assert!(CoefficientImage::read(&jpeg[..20]).is_err());
    }
}
