use serde::{Deserialize, Serialize};

use crate::packed_len;

/// Metrics of a single glyph, one entry of the glyph table.
///
/// Offsets are measured from the cursor, which sits on the baseline, to the
/// upper left pixel of the raster. +Y is down, so `y_offset` is usually
/// negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Glyph {
    /// Index of the first byte of this glyph in the shared bitmap.
    pub bitmap_offset: u16,
    pub width: u8,
    pub height: u8,
    /// Distance to advance the cursor after drawing.
    pub x_advance: u8,
    pub x_offset: i8,
    pub y_offset: i8,
}

impl Glyph {
    pub fn new(bitmap_offset: u16, width: u8, height: u8, x_advance: u8, x_offset: i8, y_offset: i8) -> Self {
        Self {
            bitmap_offset,
            width,
            height,
            x_advance,
            x_offset,
            y_offset,
        }
    }

    /// Number of raster bits.
    pub fn bit_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of bytes the packed raster occupies.
    pub fn byte_len(&self) -> usize {
        packed_len(self.bit_count())
    }

    /// Byte index one past the end of this glyph's data.
    pub fn end_offset(&self) -> usize {
        self.bitmap_offset as usize + self.byte_len()
    }

    pub fn is_blank(&self) -> bool {
        self.bit_count() == 0
    }
}
