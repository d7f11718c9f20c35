//! Scan decoding (sequential and progressive) and baseline scan encoding.
//!
//! The progressive block decoders follow the four procedures of JPEG
//! Annex G (DC first, DC refinement, AC first with end-of-band runs, AC
//! refinement) in the shape libjpeg's `jdphuff.c` gives them.

use log::warn;

use super::bitio::{BitReader, BitWriter};
use super::coefficients::CoefficientGrid;
use super::destination::MemoryDestination;
use super::header::{Frame, FrameKind, ScanHeader, Tables};
use super::huffman::{build_optimal, category, DecodeTable, EncodeTable, HuffmanSpec};
use super::marker::ZIGZAG_TO_NATURAL;
use super::source::MemorySource;
use super::CodecError;

#[inline]
fn clamp_coef(value: i32) -> i16 {
    value.clamp(-32767, 32767) as i16
}

/// Largest DC difference and AC magnitude a baseline stream can code
/// (categories 11 and 10).
const MAX_DC_DIFF: i32 = 2047;
const MAX_AC: i32 = 1023;

/// Add one refinement bit of weight `p1` away from zero.
#[inline]
fn refine(coef: &mut i16, p1: i32) {
    let step = if *coef >= 0 { p1 } else { -p1 };
    *coef = clamp_coef(i32::from(*coef) + step);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Sequential,
    DcFirst,
    DcRefine,
    AcFirst,
    AcRefine,
}

impl Pass {
    fn of(frame: &Frame, scan: &ScanHeader) -> Self {
        if frame.kind != FrameKind::Progressive {
            return Pass::Sequential;
        }
        match (scan.ss == 0, scan.ah == 0) {
            (true, true) => Pass::DcFirst,
            (true, false) => Pass::DcRefine,
            (false, true) => Pass::AcFirst,
            (false, false) => Pass::AcRefine,
        }
    }

    fn needs_dc(self) -> bool {
        matches!(self, Pass::Sequential | Pass::DcFirst)
    }

    fn needs_ac(self) -> bool {
        matches!(self, Pass::Sequential | Pass::AcFirst | Pass::AcRefine)
    }
}

fn decode_table(
    specs: &[Option<HuffmanSpec>; 4],
    id: usize,
    kind: &'static str,
) -> Result<DecodeTable, CodecError> {
    let spec = specs[id].as_ref().ok_or(CodecError::MissingTable {
        kind,
        id: id as u8,
    })?;
    DecodeTable::new(spec)
}

/// Per-scan decoding state.
struct ScanDecoder {
    pass: Pass,
    dc: Vec<Option<DecodeTable>>,
    ac: Vec<Option<DecodeTable>>,
    ss: usize,
    se: usize,
    al: u8,
    preds: Vec<i32>,
    eobrun: u32,
    restart_interval: usize,
    next_rst: u8,
    mcus: usize,
    warned_refine: bool,
}

impl ScanDecoder {
    fn new(frame: &Frame, scan: &ScanHeader, tables: &Tables) -> Result<Self, CodecError> {
        let pass = Pass::of(frame, scan);
        let mut dc = Vec::with_capacity(scan.components.len());
        let mut ac = Vec::with_capacity(scan.components.len());
        for sc in &scan.components {
            dc.push(if pass.needs_dc() {
                Some(decode_table(&tables.dc, sc.dc, "DC")?)
            } else {
                None
            });
            ac.push(if pass.needs_ac() {
                Some(decode_table(&tables.ac, sc.ac, "AC")?)
            } else {
                None
            });
        }
        let (ss, se) = match pass {
            Pass::Sequential => (0, 63),
            _ => (scan.ss, scan.se),
        };
        Ok(Self {
            pass,
            dc,
            ac,
            ss,
            se,
            al: scan.al,
            preds: vec![0; scan.components.len()],
            eobrun: 0,
            restart_interval: tables.restart_interval as usize,
            next_rst: 0,
            mcus: 0,
            warned_refine: false,
        })
    }

    /// Count an MCU, handling the restart marker that may precede it.
    fn begin_mcu(&mut self, reader: &mut BitReader<'_, '_>) {
        let interval = self.restart_interval;
        if interval > 0 && self.mcus > 0 && self.mcus % interval == 0 {
            reader.restart(self.next_rst);
            self.next_rst = (self.next_rst + 1) % 8;
            self.preds.fill(0);
            self.eobrun = 0;
        }
        self.mcus += 1;
    }

    fn decode_block(&mut self, reader: &mut BitReader<'_, '_>, slot: usize, block: &mut [i16; 64]) {
        match self.pass {
            Pass::Sequential => self.sequential(reader, slot, block),
            Pass::DcFirst => self.dc_first(reader, slot, block),
            Pass::DcRefine => {
                if reader.bit() != 0 {
                    block[0] |= 1 << self.al;
                }
            }
            Pass::AcFirst => self.ac_first(reader, slot, block),
            Pass::AcRefine => self.ac_refine(reader, slot, block),
        }
    }

    fn dc_diff(&mut self, reader: &mut BitReader<'_, '_>, slot: usize) -> i32 {
        let Some(table) = &self.dc[slot] else {
            return self.preds[slot];
        };
        let size = reader.decode(table);
        let diff = reader.receive_extend(size);
        self.preds[slot] = self.preds[slot].wrapping_add(diff);
        self.preds[slot]
    }

    fn sequential(&mut self, reader: &mut BitReader<'_, '_>, slot: usize, block: &mut [i16; 64]) {
        block[0] = clamp_coef(self.dc_diff(reader, slot));
        let Some(table) = &self.ac[slot] else {
            return;
        };
        let mut k = 1;
        while k < 64 {
            let rs = reader.decode(table);
            let r = (rs >> 4) as usize;
            let s = rs & 0x0F;
            if s != 0 {
                k += r;
                if k > 63 {
                    break;
                }
                block[ZIGZAG_TO_NATURAL[k]] = clamp_coef(reader.receive_extend(s));
            } else if r == 15 {
                k += 15;
            } else {
                break;
            }
            k += 1;
        }
    }

    fn dc_first(&mut self, reader: &mut BitReader<'_, '_>, slot: usize, block: &mut [i16; 64]) {
        let value = self.dc_diff(reader, slot);
        block[0] = clamp_coef(value.wrapping_shl(u32::from(self.al)));
    }

    fn ac_first(&mut self, reader: &mut BitReader<'_, '_>, slot: usize, block: &mut [i16; 64]) {
        if self.eobrun > 0 {
            self.eobrun -= 1;
            return;
        }
        let Some(table) = &self.ac[slot] else {
            return;
        };
        let mut k = self.ss;
        while k <= self.se {
            let rs = reader.decode(table);
            let r = (rs >> 4) as usize;
            let s = rs & 0x0F;
            if s != 0 {
                k += r;
                if k > 63 {
                    break;
                }
                let value = reader.receive_extend(s) << self.al;
                block[ZIGZAG_TO_NATURAL[k]] = clamp_coef(value);
            } else if r == 15 {
                k += 15;
            } else {
                self.eobrun = 1 << r;
                if r != 0 {
                    self.eobrun += reader.bits(r as u8);
                }
                self.eobrun -= 1;
                break;
            }
            k += 1;
        }
    }

    fn ac_refine(&mut self, reader: &mut BitReader<'_, '_>, slot: usize, block: &mut [i16; 64]) {
        let p1: i16 = 1 << self.al;
        let m1: i16 = -1 << self.al;
        let mut k = self.ss;

        if self.eobrun == 0 {
            let Some(table) = &self.ac[slot] else {
                return;
            };
            while k <= self.se {
                let rs = reader.decode(table);
                let mut r = i32::from(rs >> 4);
                let s = rs & 0x0F;
                let mut value: i16 = 0;
                if s != 0 {
                    if s != 1 && !self.warned_refine {
                        warn!("corrupt JPEG data: bad AC refinement symbol");
                        self.warned_refine = true;
                    }
                    value = if reader.bit() != 0 { p1 } else { m1 };
                } else if r != 15 {
                    self.eobrun = 1 << r;
                    if r != 0 {
                        self.eobrun += reader.bits(r as u8);
                    }
                    break;
                }

                while k <= self.se {
                    let coef = &mut block[ZIGZAG_TO_NATURAL[k]];
                    if *coef != 0 {
                        if reader.bit() != 0 && (*coef & p1) == 0 {
                            refine(coef, i32::from(p1));
                        }
                    } else {
                        if r == 0 {
                            break;
                        }
                        r -= 1;
                    }
                    k += 1;
                }
                if value != 0 && k < 64 {
                    block[ZIGZAG_TO_NATURAL[k]] = value;
                }
                k += 1;
            }
        }

        if self.eobrun > 0 {
            while k <= self.se {
                let coef = &mut block[ZIGZAG_TO_NATURAL[k]];
                if *coef != 0 && reader.bit() != 0 && (*coef & p1) == 0 {
                    refine(coef, i32::from(p1));
                }
                k += 1;
            }
            self.eobrun -= 1;
        }
    }
}

/// Decode one scan into `grids` and return the marker that follows it.
pub(crate) fn decode_scan(
    src: &mut MemorySource<'_>,
    frame: &Frame,
    scan: &ScanHeader,
    tables: &Tables,
    grids: &mut [CoefficientGrid],
) -> Result<u8, CodecError> {
    let mut decoder = ScanDecoder::new(frame, scan, tables)?;
    let mut reader = BitReader::new(src);

    if let [sc] = scan.components.as_slice() {
        let (bw, bh) = frame.block_dims(sc.index);
        let grid = &mut grids[sc.index];
        for by in 0..bh {
            for bx in 0..bw {
                decoder.begin_mcu(&mut reader);
                if reader.insufficient() {
                    continue;
                }
                decoder.decode_block(&mut reader, 0, grid.block_mut(bx, by));
            }
        }
    } else {
        for my in 0..frame.mcu_rows() {
            for mx in 0..frame.mcu_cols() {
                decoder.begin_mcu(&mut reader);
                if reader.insufficient() {
                    continue;
                }
                for (slot, sc) in scan.components.iter().enumerate() {
                    let c = frame.components[sc.index];
                    let (h, v) = (c.h as usize, c.v as usize);
                    for y in 0..v {
                        for x in 0..h {
                            let block = grids[sc.index].block_mut(mx * h + x, my * v + y);
                            decoder.decode_block(&mut reader, slot, block);
                        }
                    }
                }
            }
        }
    }

    Ok(reader.finish())
}

/// Huffman table id used for a component in the output scan.
fn table_slot(component: usize) -> usize {
    usize::from(component > 0)
}

/// Visit blocks in the order of a single sequential scan over all components.
fn for_each_block(frame: &Frame, grids: &[CoefficientGrid], mut f: impl FnMut(usize, &[i16; 64])) {
    if frame.components.len() == 1 {
        let (bw, bh) = frame.block_dims(0);
        for by in 0..bh {
            for bx in 0..bw {
                f(0, grids[0].block(bx, by));
            }
        }
        return;
    }
    for my in 0..frame.mcu_rows() {
        for mx in 0..frame.mcu_cols() {
            for (ci, c) in frame.components.iter().enumerate() {
                let (h, v) = (c.h as usize, c.v as usize);
                for y in 0..v {
                    for x in 0..h {
                        f(ci, grids[ci].block(mx * h + x, my * v + y));
                    }
                }
            }
        }
    }
}

/// Emit the Huffman symbols (with their extra bits) of one baseline block.
///
/// Values outside what 8-bit baseline coding can express only come from
/// corrupt input; they are saturated, and `pred` follows what a decoder
/// will reconstruct.
fn block_symbols(block: &[i16; 64], pred: &mut i32, mut emit: impl FnMut(bool, u8, u32, u8)) {
    let diff = (i32::from(block[0]) - *pred).clamp(-MAX_DC_DIFF, MAX_DC_DIFF);
    *pred += diff;
    let size = category(diff);
    emit(false, size, extra_bits(diff), size);

    let mut run = 0u8;
    for &n in &ZIGZAG_TO_NATURAL[1..] {
        let value = i32::from(block[n]).clamp(-MAX_AC, MAX_AC);
        if value == 0 {
            run += 1;
            continue;
        }
        while run > 15 {
            emit(true, 0xF0, 0, 0);
            run -= 16;
        }
        let size = category(value);
        emit(true, (run << 4) | size, extra_bits(value), size);
        run = 0;
    }
    if run > 0 {
        emit(true, 0x00, 0, 0);
    }
}

#[inline]
fn extra_bits(value: i32) -> u32 {
    if value < 0 {
        (value - 1) as u32
    } else {
        value as u32
    }
}

/// Optimal DC/AC tables for a baseline encoding of `grids`.
///
/// Returned in the order DC0, AC0, then DC1, AC1 when there is more than
/// one component.
pub(crate) fn optimal_tables(frame: &Frame, grids: &[CoefficientGrid]) -> Vec<HuffmanSpec> {
    let slots = table_slot(frame.components.len() - 1) + 1;
    let mut dc_freq = vec![[0u32; 256]; slots];
    let mut ac_freq = vec![[0u32; 256]; slots];
    let mut preds = vec![0i32; frame.components.len()];

    for_each_block(frame, grids, |ci, block| {
        let slot = table_slot(ci);
        block_symbols(block, &mut preds[ci], |is_ac, symbol, _, _| {
            let freq = if is_ac { &mut ac_freq[slot] } else { &mut dc_freq[slot] };
            freq[symbol as usize] += 1;
        });
    });

    let mut specs = Vec::with_capacity(2 * slots);
    for slot in 0..slots {
        specs.push(build_optimal(0, slot as u8, &dc_freq[slot]));
        specs.push(build_optimal(1, slot as u8, &ac_freq[slot]));
    }
    specs
}

/// Entropy-code `grids` as one interleaved baseline scan.
pub(crate) fn encode_scan(
    frame: &Frame,
    grids: &[CoefficientGrid],
    specs: &[HuffmanSpec],
    dst: &mut MemoryDestination,
) -> Result<(), CodecError> {
    let mut dc_tables = Vec::new();
    let mut ac_tables = Vec::new();
    for spec in specs {
        let table = EncodeTable::new(spec)?;
        if spec.class == 0 {
            dc_tables.push(table);
        } else {
            ac_tables.push(table);
        }
    }

    let mut writer = BitWriter::new(dst);
    let mut preds = vec![0i32; frame.components.len()];
    for_each_block(frame, grids, |ci, block| {
        let slot = table_slot(ci);
        block_symbols(block, &mut preds[ci], |is_ac, symbol, bits, size| {
            let table = if is_ac { &ac_tables[slot] } else { &dc_tables[slot] };
            writer.put_symbol(table, symbol);
            writer.put(bits, size);
        });
    });
    writer.flush();
    Ok(())
}
