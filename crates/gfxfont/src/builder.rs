//! Assembles a [`GfxFont`] from rasterized glyphs.
//!
//! Rendering outlines is left to a [`Rasterizer`] implementation; the builder
//! walks the codepoint range, packs every raster into the shared bitmap and
//! converts the rasterizer metrics into glyph table entries.

use std::{collections::HashMap, path::Path};

use crate::{bitmap::raster_bits, narrow, pack_bits, GfxFont, Glyph};

const DEFAULT_FIRST: u16 = 0x20;
const DEFAULT_LAST: u16 = 0x7E;

/// A monochrome glyph raster as produced by a font renderer.
///
/// `bitmap_left` and `bitmap_top` are measured from the pen position with +Y
/// pointing up, `buffer` holds `rows` rows of `pitch` bytes each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterGlyph {
    pub width: usize,
    pub rows: usize,
    pub pitch: usize,
    pub buffer: Vec<u8>,
    pub advance_x: i32,
    pub bitmap_left: i32,
    pub bitmap_top: i32,
}

impl RasterGlyph {
    /// Raster bits row-major without the row padding.
    ///
    /// # Errors
    ///
    /// Fails if the buffer is shorter than `rows` rows of `pitch` bytes.
    pub fn bits(&self) -> crate::Result<Vec<bool>> {
        raster_bits(&self.buffer, self.width, self.rows, self.pitch)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }
}

pub trait Rasterizer {
    /// Renders `codepoint` as a monochrome raster.
    ///
    /// # Errors
    ///
    /// Implementations report renderer failures as
    /// [`crate::GfxFontError::Rasterizer`].
    fn rasterize(&mut self, codepoint: u32) -> crate::Result<RasterGlyph>;

    /// Line height of the face in pixels, if the renderer knows it.
    fn line_height(&self) -> Option<u8> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct GfxFontBuilder {
    name: String,
    first: u16,
    last: u16,
    remap: HashMap<u32, u32>,
}

impl GfxFontBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            first: DEFAULT_FIRST,
            last: DEFAULT_LAST,
            remap: HashMap::new(),
        }
    }

    /// Sets the codepoint range, swapping the bounds if they are inverted.
    pub fn with_range(mut self, first: u16, last: u16) -> Self {
        self.first = first.min(last);
        self.last = first.max(last);
        self
    }

    /// Renders the source codepoint in place of a target codepoint.
    ///
    /// `(target, source)` pairs, so `(0x41, 0x263A)` places the face's smiley
    /// in the slot of `A`.
    pub fn with_remap<I: IntoIterator<Item = (u32, u32)>>(mut self, remap: I) -> Self {
        self.remap.extend(remap);
        self
    }

    pub fn is_remapped(&self) -> bool {
        !self.remap.is_empty()
    }

    /// Rasterizes every codepoint of the range and packs the result.
    ///
    /// A codepoint the rasterizer fails on becomes an empty glyph. Without a
    /// line height from the rasterizer, yAdvance is the tallest glyph.
    ///
    /// # Errors
    ///
    /// Fails if a raster buffer is inconsistent with its dimensions or a
    /// metric does not fit its glyph table field.
    pub fn build<R: Rasterizer + ?Sized>(&self, rasterizer: &mut R) -> crate::Result<GfxFont> {
        let mut bitmap = Vec::new();
        let mut glyphs = Vec::with_capacity((self.last - self.first) as usize + 1);

        for codepoint in self.first as u32..=self.last as u32 {
            let source = self.remap.get(&codepoint).copied().unwrap_or(codepoint);
            let glyph = match rasterizer.rasterize(source) {
                Ok(raster) => append_glyph(&mut bitmap, &raster)?,
                Err(err) => {
                    log::warn!("{err}, storing empty glyph for 0x{codepoint:02X}");
                    Glyph {
                        bitmap_offset: narrow(bitmap.len() as i64, "bitmapOffset")?,
                        ..Default::default()
                    }
                }
            };
            glyphs.push(glyph);
        }

        let y_advance = match rasterizer.line_height() {
            Some(height) => height,
            None => glyphs.iter().map(|g| g.height).max().unwrap_or(0),
        };
        log::debug!(
            "built {} with {} glyphs, {} bitmap bytes",
            self.name,
            glyphs.len(),
            bitmap.len()
        );
        Ok(GfxFont::new(self.name.clone(), bitmap, glyphs, self.first, self.last, y_advance))
    }
}

fn append_glyph(bitmap: &mut Vec<u8>, raster: &RasterGlyph) -> crate::Result<Glyph> {
    let bitmap_offset = narrow(bitmap.len() as i64, "bitmapOffset")?;
    let x_advance = narrow(raster.advance_x as i64, "xAdvance")?;
    let x_offset = narrow(raster.bitmap_left as i64, "xOffset")?;
    let y_offset = narrow(1 - raster.bitmap_top as i64, "yOffset")?;

    let bits = raster.bits()?;
    // a box without any set pixel is stored as 0x0
    if raster.is_empty() || !bits.contains(&true) {
        return Ok(Glyph::new(bitmap_offset, 0, 0, x_advance, x_offset, y_offset));
    }

    let glyph = Glyph::new(
        bitmap_offset,
        narrow(raster.width as i64, "width")?,
        narrow(raster.rows as i64, "height")?,
        x_advance,
        x_offset,
        y_offset,
    );
    bitmap.extend(pack_bits(bits));
    Ok(glyph)
}

/// Builds a font identifier like `FreeSans9pt7b` from a font file name.
///
/// The suffix is `7b` for ranges ending below 0x80, `8b` otherwise;
/// remapped fonts get `Custom` appended. Anything that is not an ASCII
/// letter or digit becomes `_`.
pub fn derive_font_name(font_file: &Path, point_size: u32, last: u16, remapped: bool) -> String {
    let stem = font_file.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let bits = if last > 0x7F { 8 } else { 7 };
    let mut name: String = format!("{stem}{point_size}pt{bits}b")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if remapped {
        name.push_str("Custom");
    }
    name
}
