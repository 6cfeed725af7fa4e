use serde::{Deserialize, Serialize};

use crate::GfxFont;

/// Smallest rectangle enclosing all set pixels of a rendered string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl GfxFont {
    /// Measures `text` drawn with the cursor starting at `(x, y)` on the baseline.
    ///
    /// `\n` moves the cursor to column 0 of the next line, `\r` is ignored and
    /// characters outside the font's range are skipped. An axis without any
    /// extent reports the start coordinate and a size of 0.
    pub fn text_bounds(&self, text: &str, x: i32, y: i32) -> TextBounds {
        let (mut cursor_x, mut cursor_y) = (x, y);
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);

        for ch in text.chars() {
            match ch {
                '\n' => {
                    cursor_x = 0;
                    cursor_y += self.y_advance as i32;
                }
                '\r' => {}
                _ => {
                    let Some(glyph) = self.glyph(ch as u32) else {
                        continue;
                    };
                    // blank glyphs still widen the box on the leading edge
                    let x1 = cursor_x + glyph.x_offset as i32;
                    let y1 = cursor_y + glyph.y_offset as i32;
                    min_x = min_x.min(x1);
                    min_y = min_y.min(y1);
                    max_x = max_x.max(x1 + glyph.width as i32 - 1);
                    max_y = max_y.max(y1 + glyph.height as i32 - 1);
                    cursor_x += glyph.x_advance as i32;
                }
            }
        }

        let mut bounds = TextBounds { x, y, width: 0, height: 0 };
        if max_x >= min_x {
            bounds.x = min_x;
            bounds.width = (max_x - min_x + 1) as u32;
        }
        if max_y >= min_y {
            bounds.y = min_y;
            bounds.height = (max_y - min_y + 1) as u32;
        }
        bounds
    }
}
