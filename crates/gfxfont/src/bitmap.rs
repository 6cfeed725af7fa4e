//! Bit packing for glyph rasters.
//!
//! A glyph raster is scanned row-major into a flat bitstream without any
//! per-row padding. The stream is packed MSB-first into bytes; the final
//! partial byte of a glyph is filled with zero bits on the low side, so every
//! glyph starts on a byte boundary:
//!
//! ```text
//!  bits   1 1 0 1 1 0 1 0 | 1 1 1
//!  bytes  0xDA            | 0xE0
//! ```

use crate::{packed_len, GfxFontError};

/// Accumulates bits MSB-first into bytes.
#[derive(Debug, Default, Clone)]
pub struct BitPacker {
    bytes: Vec<u8>,
    acc: u8,
    bit: u8,
}

impl BitPacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bit: bool) {
        if bit {
            self.acc |= 0x80 >> self.bit;
        }
        self.bit += 1;
        if self.bit == 8 {
            self.bytes.push(self.acc);
            self.acc = 0;
            self.bit = 0;
        }
    }

    /// Number of bits pushed so far.
    pub fn len(&self) -> usize {
        self.bytes.len() * 8 + self.bit as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes a pending partial byte (zero filled on the low side) and returns the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit > 0 {
            self.bytes.push(self.acc);
        }
        self.bytes
    }
}

/// Packs a flat bit sequence into bytes, MSB first.
pub fn pack_bits<I: IntoIterator<Item = bool>>(bits: I) -> Vec<u8> {
    let mut packer = BitPacker::new();
    for bit in bits {
        packer.push(bit);
    }
    packer.finish()
}

/// Reads a single bit at bit position `pos`; `None` past the end of `bytes`.
#[inline]
pub fn bit_at(bytes: &[u8], pos: usize) -> Option<bool> {
    bytes.get(pos / 8).map(|b| (b >> (7 - pos % 8)) & 1 == 1)
}

/// Unpacks the first `count` bits of `bytes`.
pub fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    BitReader::new(bytes, 0, count).collect()
}

/// Iterates `count` bits of a packed buffer starting at bit `start`.
///
/// Iteration stops early when the buffer runs out.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8], start: usize, count: usize) -> Self {
        Self {
            bytes,
            pos: start,
            end: start + count,
        }
    }

    /// Reader over a glyph whose data begins at byte `offset`.
    pub fn for_glyph(bytes: &'a [u8], offset: usize, width: usize, height: usize) -> Self {
        Self::new(bytes, 8 * offset, width * height)
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.pos >= self.end {
            return None;
        }
        let bit = bit_at(self.bytes, self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let available = (self.bytes.len() * 8).saturating_sub(self.pos);
        let n = self.end.saturating_sub(self.pos).min(available);
        (n, Some(n))
    }
}

/// Flattens a monochrome raster whose rows are `pitch` bytes apart.
///
/// Row padding beyond `width` pixels is dropped; pixels are MSB first within each row byte.
pub fn raster_bits(buffer: &[u8], width: usize, rows: usize, pitch: usize) -> crate::Result<Vec<bool>> {
    let row_bytes = packed_len(width);
    if rows > 0 && pitch < row_bytes {
        return Err(GfxFontError::RasterTooShort {
            required: row_bytes,
            actual: pitch,
        });
    }
    let required = if rows == 0 { 0 } else { (rows - 1) * pitch + row_bytes };
    if buffer.len() < required {
        return Err(GfxFontError::RasterTooShort {
            required,
            actual: buffer.len(),
        });
    }

    let mut bits = Vec::with_capacity(width * rows);
    for y in 0..rows {
        let row = &buffer[y * pitch..y * pitch + row_bytes];
        for x in 0..width {
            bits.push(row[x / 8] & (0x80 >> (x & 7)) != 0);
        }
    }
    Ok(bits)
}
