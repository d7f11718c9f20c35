//! Huffman table specs, lookup tables and optimal table generation.

use super::CodecError;

/// A DHT table as transmitted: code counts per length plus symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanSpec {
    /// 0 = DC, 1 = AC.
    pub class: u8,
    pub id: u8,
    /// Number of codes of each length 1..=16.
    pub bits: [u8; 16],
    /// Symbols in order of increasing code length.
    pub values: Vec<u8>,
}

impl HuffmanSpec {
    /// DHT payload for this single table.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(17 + self.values.len());
        out.push((self.class << 4) | self.id);
        out.extend_from_slice(&self.bits);
        out.extend_from_slice(&self.values);
        out
    }

    /// Canonical code lengths and codes, in symbol order (JPEG Annex C).
    fn codes(&self) -> Result<Vec<(u8, u16)>, CodecError> {
        let mut out = Vec::with_capacity(self.values.len());
        let mut code: u32 = 0;
        for (len_index, &count) in self.bits.iter().enumerate() {
            let len = len_index as u8 + 1;
            for _ in 0..count {
                out.push((len, code as u16));
                code += 1;
            }
            // The all-ones code of a length may not be used.
            if code >= (1u32 << len) {
                return Err(CodecError::Malformed("bad Huffman table"));
            }
            code <<= 1;
        }
        Ok(out)
    }
}

pub(crate) fn parse_dht(payload: &[u8]) -> Result<Vec<HuffmanSpec>, CodecError> {
    let mut specs = Vec::new();
    let mut rest = payload;
    while let Some((&tc_th, tail)) = rest.split_first() {
        let class = tc_th >> 4;
        let id = tc_th & 0x0F;
        if class > 1 || id > 3 {
            return Err(CodecError::Malformed("bad DHT table header"));
        }
        if tail.len() < 16 {
            return Err(CodecError::Malformed("short DHT segment"));
        }
        let mut bits = [0u8; 16];
        bits.copy_from_slice(&tail[..16]);
        let count: usize = bits.iter().map(|&b| b as usize).sum();
        if count > 256 || tail.len() < 16 + count {
            return Err(CodecError::Malformed("bad DHT symbol count"));
        }
        let spec = HuffmanSpec {
            class,
            id,
            bits,
            values: tail[16..16 + count].to_vec(),
        };
        spec.codes()?;
        specs.push(spec);
        rest = &tail[16 + count..];
    }
    Ok(specs)
}

/// Decoder lookup (libjpeg's maxcode/valoffset form).
#[derive(Debug, Clone)]
pub(crate) struct DecodeTable {
    /// Largest code of each length, -1 when there is none.
    maxcode: [i32; 17],
    /// Value index offset for codes of each length.
    valoffset: [i32; 17],
    values: Vec<u8>,
}

impl DecodeTable {
    pub fn new(spec: &HuffmanSpec) -> Result<Self, CodecError> {
        let codes = spec.codes()?;
        let mut maxcode = [-1i32; 17];
        let mut valoffset = [0i32; 17];
        let mut p = 0usize;
        for len in 1..=16usize {
            let count = spec.bits[len - 1] as usize;
            if count > 0 {
                valoffset[len] = p as i32 - i32::from(codes[p].1);
                p += count;
                maxcode[len] = i32::from(codes[p - 1].1);
            }
        }
        Ok(Self {
            maxcode,
            valoffset,
            values: spec.values.clone(),
        })
    }

    /// Resolve a code of `len` bits, if it is one.
    #[inline]
    pub fn lookup(&self, code: i32, len: usize) -> Option<u8> {
        if len > 16 || code > self.maxcode[len] {
            return None;
        }
        let index = code + self.valoffset[len];
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i).copied())
    }

    /// True when `code` is above every code of `len` bits, so more bits are needed.
    #[inline]
    pub fn exceeds(&self, code: i32, len: usize) -> bool {
        code > self.maxcode[len]
    }
}

/// Encoder lookup: code and length per symbol.
#[derive(Debug, Clone)]
pub(crate) struct EncodeTable {
    codes: [u16; 256],
    sizes: [u8; 256],
}

impl EncodeTable {
    pub fn new(spec: &HuffmanSpec) -> Result<Self, CodecError> {
        let mut codes = [0u16; 256];
        let mut sizes = [0u8; 256];
        for (&symbol, (len, code)) in spec.values.iter().zip(spec.codes()?) {
            codes[symbol as usize] = code;
            sizes[symbol as usize] = len;
        }
        Ok(Self { codes, sizes })
    }

    /// `(code, length)` of a symbol; length 0 means the symbol has no code.
    #[inline]
    pub fn get(&self, symbol: u8) -> (u16, u8) {
        (self.codes[symbol as usize], self.sizes[symbol as usize])
    }
}

/// Build the optimal table for the given symbol frequencies.
///
/// JPEG Annex K.2 with libjpeg's reserved pseudo-symbol 256, which keeps
/// every real symbol off the all-ones code. Lengths are then limited to
/// 16 bits with the Annex K.3 adjustment.
pub(crate) fn build_optimal(class: u8, id: u8, freq: &[u32; 256]) -> HuffmanSpec {
    let mut freq: Vec<u64> = freq.iter().map(|&f| u64::from(f)).collect();
    if freq.iter().all(|&f| f == 0) {
        // A table must contain at least one code.
        freq[0] = 1;
    }
    freq.push(1);

    let mut codesize = [0usize; 257];
    let mut others = [usize::MAX; 257];

    loop {
        let Some(c1) = smallest(&freq, None) else {
            break;
        };
        let Some(c2) = smallest(&freq, Some(c1)) else {
            break;
        };

        freq[c1] += freq[c2];
        freq[c2] = 0;

        let mut node = c1;
        codesize[node] += 1;
        while others[node] != usize::MAX {
            node = others[node];
            codesize[node] += 1;
        }
        others[node] = c2;

        let mut node = c2;
        codesize[node] += 1;
        while others[node] != usize::MAX {
            node = others[node];
            codesize[node] += 1;
        }
    }

    let max_len = codesize.iter().copied().max().unwrap_or(0);
    let mut bits = vec![0u32; max_len.max(16) + 1];
    for &size in codesize.iter().filter(|&&s| s > 0) {
        bits[size] += 1;
    }

    let mut i = bits.len() - 1;
    while i > 16 {
        while bits[i] > 0 {
            let mut j = i - 2;
            while j > 0 && bits[j] == 0 {
                j -= 1;
            }
            if j == 0 {
                break;
            }
            bits[i] -= 2;
            bits[i - 1] += 1;
            bits[j + 1] += 2;
            bits[j] -= 1;
        }
        i -= 1;
    }

    // Drop the pseudo-symbol from the longest remaining length.
    let mut i = 16;
    while i > 0 && bits[i] == 0 {
        i -= 1;
    }
    if i > 0 {
        bits[i] -= 1;
    }

    let mut values = Vec::new();
    for len in 1..=max_len {
        for (symbol, &size) in codesize.iter().enumerate().take(256) {
            if size == len {
                values.push(symbol as u8);
            }
        }
    }

    let mut spec_bits = [0u8; 16];
    for (len, slot) in spec_bits.iter_mut().enumerate() {
        *slot = bits[len + 1] as u8;
    }

    HuffmanSpec {
        class,
        id,
        bits: spec_bits,
        values,
    }
}

/// Index of the smallest non-zero frequency, preferring the highest index on ties.
fn smallest(freq: &[u64], skip: Option<usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &f) in freq.iter().enumerate() {
        if f == 0 || Some(i) == skip {
            continue;
        }
        match best {
            Some(b) if f > freq[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Number of bits needed for the magnitude of `value` (the JPEG "SSSS" category).
#[inline]
pub(crate) fn category(value: i32) -> u8 {
    (32 - value.unsigned_abs().leading_zeros()) as u8
}

/// Turn `size` received bits into a signed coefficient (JPEG F.2.2.1 EXTEND).
#[inline]
pub(crate) fn extend(bits: i32, size: u8) -> i32 {
    if size == 0 {
        return 0;
    }
    if bits < (1 << (size - 1)) {
        bits - (1 << size) + 1
    } else {
        bits
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
