//! Lossless rotation and mirroring of coefficient images.
//!
//! Every transform is expressed as an optional transpose followed by
//! optional mirrors in x and y. Mirroring a block negates its odd
//! frequencies along that axis, transposing a block transposes its
//! coefficients, and whole blocks move to their mirrored positions.
//!
//! Only blocks inside the area covered by complete iMCUs can be mirrored
//! exactly; partial edge blocks keep their position along the mirrored
//! axis (they are still transposed). This matches `jpegtran` without
//! `-trim`: the image never loses pixels, but a right or bottom edge that
//! is not a multiple of the iMCU size ends up on the wrong side.

use log::debug;

use super::coefficients::{CoefficientGrid, CoefficientImage};
use super::CodecError;
use crate::orientation::TransformCode;

/// Output of [`transform_jpeg`].
#[derive(Debug, Clone)]
pub struct Transformed {
    pub data: Vec<u8>,
    /// The input had to be padded because its entropy-coded data was cut short.
    pub truncated: bool,
}

/// Apply `code` to a JPEG file without re-quantizing.
///
/// The identity transform returns the input unchanged.
pub fn transform_jpeg(data: &[u8], code: TransformCode) -> Result<Transformed, CodecError> {
    if code == TransformCode::None {
        return Ok(Transformed {
            data: data.to_vec(),
            truncated: false,
        });
    }
    let image = CoefficientImage::read(data)?;
    let truncated = image.truncated;
    let out = image.transformed(code).write()?;
    debug!("applied {:?}: {} -> {} bytes", code, data.len(), out.len());
    Ok(Transformed {
        data: out,
        truncated,
    })
}

impl CoefficientImage {
    /// This image with `code` applied in the coefficient domain.
    pub fn transformed(&self, code: TransformCode) -> CoefficientImage {
        let (transpose, mirror_x, mirror_y) = code.steps();
        let frame = if transpose {
            self.frame.transposed()
        } else {
            self.frame.clone()
        };
        let quant_tables = if transpose {
            self.quant_tables
                .clone()
                .map(|t| t.map(|table| table.transposed()))
        } else {
            self.quant_tables.clone()
        };

        let max_h = frame.max_h();
        let max_v = frame.max_v();
        let mcu_cols = frame.width as usize / (8 * max_h);
        let mcu_rows = frame.height as usize / (8 * max_v);

        let grids = frame
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (w, h) = frame.grid_dims(i);
                let mirror_w = mcu_cols * c.h as usize;
                let mirror_h = mcu_rows * c.v as usize;
                let src = &self.grids[i];
                let mut dst = CoefficientGrid::new(w, h);
                for by in 0..h {
                    for bx in 0..w {
                        let mx = mirror_x && bx < mirror_w;
                        let my = mirror_y && by < mirror_h;
                        let tx = if mx { mirror_w - 1 - bx } else { bx };
                        let ty = if my { mirror_h - 1 - by } else { by };
                        let source = if transpose {
                            src.block(ty, tx)
                        } else {
                            src.block(tx, ty)
                        };
                        *dst.block_mut(bx, by) = transform_block(source, transpose, mx, my);
                    }
                }
                dst
            })
            .collect();

        CoefficientImage {
            frame,
            quant_tables,
            grids,
            markers: self.markers.clone(),
            truncated: self.truncated,
        }
    }
}

/// Transpose and/or mirror the coefficients of one block.
fn transform_block(src: &[i16; 64], transpose: bool, mirror_x: bool, mirror_y: bool) -> [i16; 64] {
    let mut out = [0i16; 64];
    for r in 0..8 {
        for c in 0..8 {
            let value = if transpose { src[c * 8 + r] } else { src[r * 8 + c] };
            let negate = (mirror_x && c % 2 == 1) != (mirror_y && r % 2 == 1);
            out[r * 8 + c] = if negate { value.wrapping_neg() } else { value };
        }
    }
    out
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn code_strategy() -> impl Strategy<Value = TransformCode> {
        (0usize..8).prop_map(|i| TransformCode::ALL[i])
    }

    fn block_strategy() -> impl Strategy<Value = [i16; 64]> {
        prop::collection::vec(-1024i16..1024, 64).prop_map(|v| {
            let mut b = [0i16; 64];
            b.copy_from_slice(&v);
            b
        })
    }

    proptest! {
        /// Property: block transforms compose like the group elements they stand for.
        #[test]
        fn prop_block_transform_composes(
            block in block_strategy(),
            a in code_strategy(),
            b in code_strategy(),
        ) {
            let apply = |blk: &[i16; 64], code: TransformCode| {
                let (t, x, y) = code.steps();
                transform_block(blk, t, x, y)
            };
            prop_assert_eq!(apply(&apply(&block, a), b), apply(&block, a.then(b)));
        }
    }
}
