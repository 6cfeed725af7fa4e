//! ASCII diagrams of glyphs in cursor relative coordinates.
//!
//! The box spans the raster, the cursor origin and the advance point:
//!
//! ```text
//! [****  ]   row y = -1
//! [0... >]   row y =  0 (baseline)
//! ```
//!
//! `0` marks the cursor origin (`@` when it overlaps something), `>` the
//! advance point (`}` on overlap) and `*` a set pixel (`X` on overlap).

use std::fmt;

use crate::{GfxFontError, Glyph};

const ORIGIN: (char, char) = ('0', '@');
const ADVANCE: (char, char) = ('>', '}');
const PIXEL: (char, char) = ('*', 'X');

/// Rendered glyph box. Unplotted cells render as spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphDiagram {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    cells: Vec<Vec<Option<char>>>,
}

impl GlyphDiagram {
    /// Computes the box for `glyph` and plots origin, advance point and raster.
    ///
    /// `bits` yields the glyph's `width * height` raster bits row-major; unset
    /// pixels are drawn with `background` where nothing else was plotted.
    ///
    /// # Errors
    ///
    /// A plot outside the computed box is a [`GfxFontError::BoundsViolation`].
    pub fn render<I: IntoIterator<Item = bool>>(glyph: &Glyph, bits: I, background: char) -> crate::Result<Self> {
        let (x_offset, y_offset) = (glyph.x_offset as i32, glyph.y_offset as i32);
        let (width, height) = (glyph.width as i32, glyph.height as i32);
        let x_advance = glyph.x_advance as i32;

        let left = x_offset.min(0);
        let right = (x_offset + width - 1).max(x_advance).max(0);
        let top = y_offset.min(0);
        let bottom = (y_offset + height - 1).max(0);

        let mut diagram = Self {
            left,
            right,
            top,
            bottom,
            cells: vec![vec![None; (right - left + 1) as usize]; (bottom - top + 1) as usize],
        };

        diagram.plot(0, 0, ORIGIN)?;
        diagram.plot(x_advance, 0, ADVANCE)?;

        let mut bits = bits.into_iter();
        for y in 0..height {
            for x in 0..width {
                let Some(bit) = bits.next() else {
                    log::warn!("raster ended early at ({x},{y})");
                    return Ok(diagram);
                };
                if bit {
                    diagram.plot(x_offset + x, y_offset + y, PIXEL)?;
                } else {
                    diagram.plot_background(x_offset + x, y_offset + y, background)?;
                }
            }
        }
        Ok(diagram)
    }

    pub fn width(&self) -> usize {
        (self.right - self.left + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.bottom - self.top + 1) as usize
    }

    /// Cell at cursor relative coordinates.
    pub fn get(&self, x: i32, y: i32) -> Option<char> {
        let (col, row) = self.index(x, y).ok()?;
        self.cells[row][col]
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|row| row.iter().map(|c| c.unwrap_or(' ')).collect())
    }

    fn index(&self, x: i32, y: i32) -> crate::Result<(usize, usize)> {
        if x < self.left || x > self.right || y < self.top || y > self.bottom {
            return Err(GfxFontError::BoundsViolation {
                x,
                y,
                left: self.left,
                right: self.right,
                top: self.top,
                bottom: self.bottom,
            });
        }
        Ok(((x - self.left) as usize, (y - self.top) as usize))
    }

    fn plot(&mut self, x: i32, y: i32, (mark, alt): (char, char)) -> crate::Result<()> {
        let (col, row) = self.index(x, y)?;
        let cell = &mut self.cells[row][col];
        *cell = Some(if cell.is_none() { mark } else { alt });
        Ok(())
    }

    fn plot_background(&mut self, x: i32, y: i32, background: char) -> crate::Result<()> {
        let (col, row) = self.index(x, y)?;
        self.cells[row][col].get_or_insert(background);
        Ok(())
    }
}

impl fmt::Display for GlyphDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "[{row}]")?;
        }
        Ok(())
    }
}
