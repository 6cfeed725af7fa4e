//! Renders a [`GfxFont`] as C declarations.
//!
//! Without options the output is the plain three-declaration form the
//! parser reads back. Annotations are emitted as `//` comments only, so an
//! annotated file still parses to the same font.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::{GfxFont, GlyphDiagram};

/// Formatter configuration. Every option can be toggled independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Replace the printable character in glyph table comments by `c:UNICODE NAME`.
    pub show_unicode_names: bool,

    /// Insert a comment into the byte table after the last byte of every glyph.
    pub annotate_bitmap_boundaries: bool,

    /// Add an ASCII diagram to each boundary comment.
    pub draw_glyphs: bool,

    /// Byte table entries per line. 0 puts all bytes of a run on one line.
    pub bytes_per_line: usize,

    /// Character for unset pixels in diagrams.
    pub background: char,

    /// Free form comment placed above the declarations.
    pub header_comment: Option<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            show_unicode_names: false,
            annotate_bitmap_boundaries: false,
            draw_glyphs: false,
            bytes_per_line: 12,
            background: '.',
            header_comment: None,
        }
    }
}

impl FormatOptions {
    /// Unicode names, boundary comments and diagrams.
    pub fn annotated() -> Self {
        Self {
            show_unicode_names: true,
            annotate_bitmap_boundaries: true,
            draw_glyphs: true,
            ..Default::default()
        }
    }

    pub fn with_unicode_names(mut self, show: bool) -> Self {
        self.show_unicode_names = show;
        self
    }

    pub fn with_bitmap_boundaries(mut self, annotate: bool) -> Self {
        self.annotate_bitmap_boundaries = annotate;
        self
    }

    pub fn with_glyph_drawing(mut self, draw: bool) -> Self {
        self.draw_glyphs = draw;
        self
    }

    pub fn with_bytes_per_line(mut self, bytes_per_line: usize) -> Self {
        self.bytes_per_line = bytes_per_line;
        self
    }

    pub fn with_background(mut self, background: char) -> Self {
        self.background = background;
        self
    }

    pub fn with_header_comment(mut self, comment: impl Into<String>) -> Self {
        self.header_comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct Formatter {
    options: FormatOptions,
}

impl Formatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Formats the complete font record.
    ///
    /// # Errors
    ///
    /// The font must satisfy [`GfxFont::check_readable`]; drawing fails with
    /// [`crate::GfxFontError::BoundsViolation`] if a plot leaves its box.
    pub fn format(&self, font: &GfxFont) -> crate::Result<String> {
        font.check_readable()?;

        let mut out = String::new();
        if let Some(header) = &self.options.header_comment {
            for line in header.lines() {
                push_comment_line(&mut out, line);
            }
            out.push('\n');
        }

        let name = &font.name;
        let _ = write!(out, "const uint8_t {name}Bitmaps[] PROGMEM = ");
        self.format_bitmap(font, &mut out)?;
        out.push_str("\n\n");

        let _ = write!(out, "const GFXglyph {name}Glyphs[] PROGMEM = ");
        self.format_glyphs(font, &mut out);
        out.push_str("\n\n");

        let _ = writeln!(out, "const GFXfont {name} PROGMEM = {{");
        let _ = writeln!(out, "    (uint8_t *){name}Bitmaps,");
        let _ = writeln!(out, "    (GFXglyph *){name}Glyphs,");
        let _ = writeln!(out, "    0x{:02X}, 0x{:02X}, {}", font.first, font.last, font.y_advance);
        out.push_str("};\n\n");

        let _ = writeln!(out, "// Approx. {} bytes", font.approximate_size());
        Ok(out)
    }

    fn format_bitmap(&self, font: &GfxFont, out: &mut String) -> crate::Result<()> {
        let mut emitter = ByteEmitter::new(out, self.options.bytes_per_line);

        if !self.options.annotate_bitmap_boundaries {
            for (i, b) in font.bitmap.iter().enumerate() {
                emitter.byte(*b, i + 1 == font.bitmap.len());
            }
            emitter.finish();
            return Ok(());
        }

        // (end offset, glyph index), glyphs sharing an end keep codepoint order
        let mut ends: Vec<(usize, usize)> = font.glyphs.iter().enumerate().map(|(i, g)| (g.end_offset(), i)).collect();
        ends.sort_by_key(|(end, _)| *end);
        let mut pending = ends.into_iter().peekable();

        for (i, b) in font.bitmap.iter().enumerate() {
            while let Some((_, index)) = pending.next_if(|(end, _)| *end == i) {
                self.annotate_glyph(font, index, &mut emitter)?;
            }
            emitter.byte(*b, i + 1 == font.bitmap.len());
        }
        for (_, index) in pending {
            self.annotate_glyph(font, index, &mut emitter)?;
        }
        emitter.finish();
        Ok(())
    }

    fn annotate_glyph(&self, font: &GfxFont, index: usize, emitter: &mut ByteEmitter<'_>) -> crate::Result<()> {
        let g = &font.glyphs[index];
        let codepoint = font.first as u32 + index as u32;
        let ch = printable(codepoint).map(|c| format!(" '{c}'")).unwrap_or_default();
        emitter.comment(&format!(
            "0x{codepoint:02X}{ch} ({} x {}) @({},{}) +{}",
            g.width, g.height, g.x_offset, g.y_offset, g.x_advance
        ));

        if self.options.draw_glyphs {
            let bits = font.glyph_bits(index).into_iter().flatten();
            let diagram = GlyphDiagram::render(g, bits, self.options.background)?;
            for row in diagram.rows() {
                emitter.comment(&format!("[{row}]"));
            }
        }
        Ok(())
    }

    fn format_glyphs(&self, font: &GfxFont, out: &mut String) {
        if font.glyphs.is_empty() {
            out.push_str("{};");
            return;
        }
        out.push('{');
        for (i, (codepoint, g)) in font.codepoints().enumerate() {
            let sep = if i + 1 == font.glyphs.len() { "" } else { "," };
            let _ = write!(
                out,
                "\n    {{{}, {}, {}, {}, {}, {}}}{sep} // {}",
                g.bitmap_offset,
                g.width,
                g.height,
                g.x_advance,
                g.x_offset,
                g.y_offset,
                self.glyph_comment(codepoint)
            );
        }
        out.push_str("\n};");
    }

    fn glyph_comment(&self, codepoint: u32) -> String {
        let mut comment = format!("0x{codepoint:02X}");
        if self.options.show_unicode_names {
            if let Some((c, name)) = printable(codepoint).and_then(|c| unicode_names2::name(c).map(|n| (c, n))) {
                let _ = write!(comment, " {c}:{name}");
            }
        } else if (0x20..=0x7E).contains(&codepoint) {
            let _ = write!(comment, " '{}'", codepoint as u8 as char);
        }
        comment
    }
}

/// Shorthand for `Formatter::new(options).format(font)`.
pub fn format_font(font: &GfxFont, options: FormatOptions) -> crate::Result<String> {
    Formatter::new(options).format(font)
}

fn printable(codepoint: u32) -> Option<char> {
    char::from_u32(codepoint).filter(|c| !c.is_control())
}

fn push_comment_line(out: &mut String, line: &str) {
    if line.is_empty() {
        out.push_str("//\n");
    } else {
        let _ = writeln!(out, "// {line}");
    }
}

/// Byte table emission state: the current column and whether a line is open.
struct ByteEmitter<'a> {
    out: &'a mut String,
    column: usize,
    per_line: usize,
    empty: bool,
}

impl<'a> ByteEmitter<'a> {
    fn new(out: &'a mut String, per_line: usize) -> Self {
        out.push('{');
        Self {
            out,
            column: 0,
            per_line,
            empty: true,
        }
    }

    fn byte(&mut self, b: u8, last: bool) {
        if self.column == 0 {
            self.out.push_str("\n    ");
        } else {
            self.out.push(' ');
        }
        let _ = write!(self.out, "0x{b:02X}");
        if !last {
            self.out.push(',');
        }
        self.empty = false;
        self.column += 1;
        if self.per_line > 0 && self.column == self.per_line {
            self.column = 0;
        }
    }

    /// Appends a comment to the open line, or on a line of its own.
    fn comment(&mut self, text: &str) {
        if self.column == 0 {
            self.out.push_str("\n    ");
        } else {
            self.out.push(' ');
        }
        let _ = write!(self.out, "// {text}");
        self.empty = false;
        self.column = 0;
    }

    fn finish(self) {
        if self.empty {
            self.out.push_str("};");
        } else {
            self.out.push_str("\n};");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{parser::parse_font, GfxFontError, Glyph};

    fn sample() -> GfxFont {
        GfxFont::new("Test", vec![0xF0], vec![Glyph::new(0, 4, 2, 5, 0, -1)], 0x41, 0x41, 8)
    }

    #[test]
    fn test_canonical() {
        let text = Formatter::default().format(&sample()).unwrap();
        assert_eq!(
            text,
            "const uint8_t TestBitmaps[] PROGMEM = {
    0xF0
};

const GFXglyph TestGlyphs[] PROGMEM = {
    {0, 4, 2, 5, 0, -1} // 0x41 'A'
};

const GFXfont Test PROGMEM = {
    (uint8_t *)TestBitmaps,
    (GFXglyph *)TestGlyphs,
    0x41, 0x41, 8
};

// Approx. 15 bytes
"
        );
    }

    #[test]
    fn test_roundtrip() {
        let font = sample();
        for options in [FormatOptions::default(), FormatOptions::annotated(), FormatOptions::default().with_bytes_per_line(1)] {
            let text = Formatter::new(options).format(&font).unwrap();
            assert_eq!(parse_font(&text).unwrap(), font);
        }
    }

    #[test]
    fn test_empty_font() {
        let font = GfxFont::new("Empty", Vec::new(), Vec::new(), 0x41, 0x40, 8);
        let text = Formatter::default().format(&font).unwrap();
        assert!(text.contains("const uint8_t EmptyBitmaps[] PROGMEM = {};"));
        assert!(text.contains("const GFXglyph EmptyGlyphs[] PROGMEM = {};"));
        assert_eq!(parse_font(&text).unwrap(), font);
    }

    #[test]
    fn test_rejects_inconsistent_font() {
        let mut font = sample();
        font.last = 0x42;
        assert!(matches!(Formatter::default().format(&font), Err(GfxFontError::GlyphCountMismatch { .. })));

        let mut font = sample();
        font.bitmap.pop();
        assert_eq!(
            Formatter::default().format(&font),
            Err(GfxFontError::BitmapTooShort { required: 1, actual: 0 })
        );
    }

    #[test]
    fn test_boundaries_with_drawing() {
        let options = FormatOptions::default().with_bitmap_boundaries(true).with_glyph_drawing(true);
        let text = Formatter::new(options).format(&sample()).unwrap();
        assert!(text.starts_with(
            "const uint8_t TestBitmaps[] PROGMEM = {
    0xF0 // 0x41 'A' (4 x 2) @(0,-1) +5
    // [****  ]
    // [0... >]
};"
        ));
    }

    #[test]
    fn test_boundary_comment_placement() {
        // space (no bytes), a 1 byte glyph, a 2 byte glyph
        let font = GfxFont::new(
            "B",
            vec![0x80, 0xAA, 0x80],
            vec![Glyph::new(0, 0, 0, 3, 0, 1), Glyph::new(0, 1, 1, 2, 0, 0), Glyph::new(1, 3, 3, 4, 0, -2)],
            0x20,
            0x22,
            5,
        );
        let options = FormatOptions::default().with_bitmap_boundaries(true);
        let text = Formatter::new(options).format(&font).unwrap();
        assert!(text.starts_with(
            "const uint8_t BBitmaps[] PROGMEM = {
    // 0x20 ' ' (0 x 0) @(0,1) +3
    0x80, // 0x21 '!' (1 x 1) @(0,0) +2
    0xAA, 0x80 // 0x22 '\"' (3 x 3) @(0,-2) +4
};"
        ));
        assert_eq!(text.matches(" @(").count(), 3);
    }

    #[test]
    fn test_glyph_comments() {
        let font = GfxFont::new(
            "U",
            Vec::new(),
            vec![Glyph::new(0, 0, 0, 1, 0, 0), Glyph::new(0, 0, 0, 1, 0, 0), Glyph::new(0, 0, 0, 1, 0, 0)],
            0x7E,
            0x80,
            1,
        );
        let plain = Formatter::default().format(&font).unwrap();
        assert!(plain.contains("// 0x7E '~'\n"));
        assert!(plain.contains("// 0x7F\n"));
        assert!(plain.contains("// 0x80\n"));

        let named = Formatter::new(FormatOptions::default().with_unicode_names(true)).format(&font).unwrap();
        assert!(named.contains("// 0x7E ~:TILDE\n"));
        assert!(named.contains("// 0x7F\n"));
    }

    #[test]
    fn test_header_comment() {
        let options = FormatOptions::default().with_header_comment("Processed by gfxfont\n\nsecond");
        let text = Formatter::new(options).format(&sample()).unwrap();
        assert!(text.starts_with("// Processed by gfxfont\n//\n// second\n\nconst uint8_t"));
        assert_eq!(parse_font(&text).unwrap(), sample());
    }

    #[test]
    fn test_bytes_per_line() {
        let font = GfxFont::new("W", vec![1, 2, 3, 4, 5], vec![Glyph::new(0, 8, 5, 8, 0, -5)], 0x41, 0x41, 6);
        let text = Formatter::new(FormatOptions::default().with_bytes_per_line(2)).format(&font).unwrap();
        assert!(text.starts_with("const uint8_t WBitmaps[] PROGMEM = {\n    0x01, 0x02,\n    0x03, 0x04,\n    0x05\n};"));
    }

    #[test]
    fn test_options_serde_defaults() {
        let options: FormatOptions = serde_json::from_str(r#"{ "draw_glyphs": true }"#).unwrap();
        assert!(options.draw_glyphs);
        assert_eq!(options.bytes_per_line, 12);
        assert_eq!(options.background, '.');
    }
}
