use serde::{Deserialize, Serialize};

use crate::{BitReader, GfxFontError, Glyph};

/// sizeof(GFXglyph) / sizeof(GFXfont) on AVR, used for the size estimate.
const GLYPH_RECORD_SIZE: usize = 7;
const FONT_RECORD_SIZE: usize = 7;

/// A packed bitmap font covering the contiguous codepoint range `first..=last`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GfxFont {
    pub name: String,
    /// Concatenated packed glyph bits, in codepoint order.
    pub bitmap: Vec<u8>,
    /// One entry per codepoint from `first` to `last`.
    pub glyphs: Vec<Glyph>,
    pub first: u16,
    pub last: u16,
    /// Newline distance.
    pub y_advance: u8,
}

impl GfxFont {
    pub fn new(name: impl Into<String>, bitmap: Vec<u8>, glyphs: Vec<Glyph>, first: u16, last: u16, y_advance: u8) -> Self {
        Self {
            name: name.into(),
            bitmap,
            glyphs,
            first,
            last,
            y_advance,
        }
    }

    /// `last - first + 1`; negative values mean the range itself is inverted.
    pub fn expected_glyph_count(&self) -> i64 {
        self.last as i64 - self.first as i64 + 1
    }

    /// Byte length the bitmap needs to hold every glyph.
    pub fn required_bitmap_len(&self) -> usize {
        self.glyphs.iter().map(Glyph::end_offset).max().unwrap_or(0)
    }

    pub fn glyph(&self, codepoint: u32) -> Option<&Glyph> {
        let index = codepoint.checked_sub(self.first as u32)?;
        self.glyphs.get(index as usize)
    }

    /// Iterates `(codepoint, glyph)` pairs.
    pub fn codepoints(&self) -> impl Iterator<Item = (u32, &Glyph)> + '_ {
        self.glyphs.iter().enumerate().map(move |(i, g)| (self.first as u32 + i as u32, g))
    }

    /// The raster bits of glyph `index`, row-major.
    pub fn glyph_bits(&self, index: usize) -> Option<BitReader<'_>> {
        let g = self.glyphs.get(index)?;
        Some(BitReader::for_glyph(&self.bitmap, g.bitmap_offset as usize, g.width as usize, g.height as usize))
    }

    /// Storage estimate based on AVR struct and pointer sizes.
    pub fn approximate_size(&self) -> usize {
        self.bitmap.len() + self.glyphs.len() * GLYPH_RECORD_SIZE + FONT_RECORD_SIZE
    }

    fn check_glyph_count(&self) -> crate::Result<()> {
        let expected = self.expected_glyph_count();
        if expected != self.glyphs.len() as i64 {
            return Err(GfxFontError::GlyphCountMismatch {
                expected,
                actual: self.glyphs.len(),
            });
        }
        Ok(())
    }

    /// Checks that every glyph can be read from the bitmap.
    ///
    /// This is the contract the formatter needs: the glyph table matches the
    /// codepoint range and no glyph reaches past the end of the bitmap.
    pub fn check_readable(&self) -> crate::Result<()> {
        self.check_glyph_count()?;
        let required = self.required_bitmap_len();
        if self.bitmap.len() < required {
            return Err(GfxFontError::BitmapTooShort {
                required,
                actual: self.bitmap.len(),
            });
        }
        Ok(())
    }

    /// Checks the full layout: glyph count, a gapless offset chain starting at
    /// byte 0 and a bitmap ending exactly after the last glyph.
    pub fn validate(&self) -> crate::Result<()> {
        self.check_glyph_count()?;
        let mut expected = 0;
        for (index, g) in self.glyphs.iter().enumerate() {
            if g.bitmap_offset as usize != expected {
                return Err(GfxFontError::OffsetMismatch {
                    index,
                    expected,
                    actual: g.bitmap_offset as usize,
                });
            }
            expected = g.end_offset();
        }
        if self.bitmap.len() != expected {
            return Err(GfxFontError::BitmapLengthMismatch {
                expected,
                actual: self.bitmap.len(),
            });
        }
        Ok(())
    }
}
