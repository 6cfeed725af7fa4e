//! Parser for GFXfont C declarations.
//!
//! The source is reduced to a sequence of `;` separated statements with
//! comments and preprocessor lines removed. Each statement is matched against
//! the three declaration shapes of a font record:
//!
//! ```text
//! const uint8_t  NameBitmaps[] PROGMEM = { 0xFF, 0xEA, ... };
//! const GFXglyph NameGlyphs[]  PROGMEM = { {0, 0, 0, 5, 0, 1}, ... };
//! const GFXfont  Name PROGMEM = { (uint8_t *)NameBitmaps, (GFXglyph *)NameGlyphs, 0x20, 0x7E, 22 };
//! ```
//!
//! Tables are collected first; font records are resolved against the complete
//! table set afterwards, so declaration order does not matter.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{narrow, GfxFont, GfxFontError, Glyph, TableKind};

lazy_static! {
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").unwrap();
    static ref DIRECTIVE_RE: Regex = Regex::new(r"(?m)^[ \t]*#[^\n]*").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref BITMAP_RE: Regex =
        Regex::new(r"^(?:static )?const (?:uint8_t|unsigned char) (\w+) ?\[[^\]]*\] ?(?:PROGMEM ?)?= ?\{(.*)\}$").unwrap();
    static ref GLYPHS_RE: Regex = Regex::new(r"^(?:static )?const GFXglyph (\w+) ?\[[^\]]*\] ?(?:PROGMEM ?)?= ?\{(.*)\}$").unwrap();
    static ref FONT_RE: Regex = Regex::new(r"^(?:static )?const GFXfont (\w+) ?(?:PROGMEM ?)?= ?\{(.*)\}$").unwrap();
    static ref TUPLE_RE: Regex = Regex::new(r"\{([^{}]*)\}").unwrap();
    static ref CAST_RE: Regex = Regex::new(r"^\([^)]*\) ?").unwrap();
}

const GLYPH_FIELDS: usize = 6;
const FONT_FIELDS: usize = 5;

/// A classified statement before name resolution.
#[derive(Debug, Clone, PartialEq)]
enum Declaration {
    Bitmap {
        name: String,
        bytes: Vec<u8>,
    },
    Glyphs {
        name: String,
        glyphs: Vec<Glyph>,
    },
    Font(FontRecord),
}

#[derive(Debug, Clone, PartialEq)]
struct FontRecord {
    name: String,
    bitmap_ref: String,
    glyphs_ref: String,
    first: u16,
    last: u16,
    y_advance: u8,
}

/// Parses font record sources into [`GfxFont`] values.
///
/// The parser holds no state between calls; the symbol table lives only for
/// the duration of one parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarationParser;

impl DeclarationParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses the first font record of `source`.
    ///
    /// # Errors
    ///
    /// Fails on any statement that is not one of the three declaration
    /// shapes, on bad literals, on unresolved references and when the source
    /// declares no font record at all.
    pub fn parse(&self, source: &str) -> crate::Result<GfxFont> {
        let mut fonts = self.parse_all(source)?;
        if fonts.len() > 1 {
            log::warn!("{} font records found, using the first ({})", fonts.len(), fonts[0].name);
        }
        if fonts.is_empty() {
            return Err(GfxFontError::NoFontRecord);
        }
        Ok(fonts.swap_remove(0))
    }

    /// Parses every font record of `source`, in source order.
    pub fn parse_all(&self, source: &str) -> crate::Result<Vec<GfxFont>> {
        let stripped = strip_comments(source);

        let mut bitmaps: HashMap<String, Vec<u8>> = HashMap::new();
        let mut glyph_tables: HashMap<String, Vec<Glyph>> = HashMap::new();
        let mut records = Vec::new();

        for statement in statements(&stripped) {
            match parse_statement(statement)? {
                Declaration::Bitmap { name, bytes } => {
                    log::debug!("byte table {name}: {} bytes", bytes.len());
                    check_unique(&name, &bitmaps, &glyph_tables)?;
                    bitmaps.insert(name, bytes);
                }
                Declaration::Glyphs { name, glyphs } => {
                    log::debug!("glyph table {name}: {} glyphs", glyphs.len());
                    check_unique(&name, &bitmaps, &glyph_tables)?;
                    glyph_tables.insert(name, glyphs);
                }
                Declaration::Font(record) => records.push(record),
            }
        }

        let mut fonts = Vec::with_capacity(records.len());
        for FontRecord {
            name,
            bitmap_ref,
            glyphs_ref,
            first,
            last,
            y_advance,
        } in records
        {
            let Some(bitmap) = bitmaps.get(&bitmap_ref) else {
                return Err(GfxFontError::UnresolvedReference {
                    name: bitmap_ref,
                    kind: TableKind::Bitmap,
                });
            };
            let Some(glyphs) = glyph_tables.get(&glyphs_ref) else {
                return Err(GfxFontError::UnresolvedReference {
                    name: glyphs_ref,
                    kind: TableKind::Glyphs,
                });
            };
            log::debug!("font {name}: 0x{first:02X}..=0x{last:02X}, {} glyphs", glyphs.len());
            fonts.push(GfxFont::new(name, bitmap.clone(), glyphs.clone(), first, last, y_advance));
        }
        Ok(fonts)
    }
}

/// Shorthand for `DeclarationParser::new().parse(source)`.
pub fn parse_font(source: &str) -> crate::Result<GfxFont> {
    DeclarationParser::new().parse(source)
}

/// Removes block comments, line comments and preprocessor lines and collapses whitespace runs.
pub fn strip_comments(source: &str) -> String {
    let s = COMMENT_RE.replace_all(source, " ");
    let s = DIRECTIVE_RE.replace_all(&s, "");
    WHITESPACE_RE.replace_all(&s, " ").into_owned()
}

fn statements(stripped: &str) -> impl Iterator<Item = &str> {
    stripped.split(';').map(str::trim).filter(|s| !s.is_empty())
}

fn check_unique(name: &str, bitmaps: &HashMap<String, Vec<u8>>, glyphs: &HashMap<String, Vec<Glyph>>) -> crate::Result<()> {
    if bitmaps.contains_key(name) || glyphs.contains_key(name) {
        return Err(GfxFontError::DuplicateDeclaration { name: name.to_string() });
    }
    Ok(())
}

fn parse_statement(statement: &str) -> crate::Result<Declaration> {
    if let Some(caps) = BITMAP_RE.captures(statement) {
        let bytes = split_list(&caps[2])
            .map(|lit| parse_int(lit).and_then(|v| narrow(v, "bitmap byte")))
            .collect::<crate::Result<Vec<u8>>>()?;
        return Ok(Declaration::Bitmap {
            name: caps[1].to_string(),
            bytes,
        });
    }

    if let Some(caps) = GLYPHS_RE.captures(statement) {
        let body = &caps[2];
        // only tuples and separators may appear between the braces
        if TUPLE_RE.replace_all(body, "").chars().any(|c| c != ',' && c != ' ') {
            return Err(GfxFontError::MalformedStatement {
                statement: statement.to_string(),
            });
        }
        let glyphs = TUPLE_RE
            .captures_iter(body)
            .map(|tuple| parse_glyph(statement, &tuple[1]))
            .collect::<crate::Result<Vec<Glyph>>>()?;
        return Ok(Declaration::Glyphs {
            name: caps[1].to_string(),
            glyphs,
        });
    }

    if let Some(caps) = FONT_RE.captures(statement) {
        let fields: Vec<&str> = split_list(&caps[2]).collect();
        // exactly five fields; extra fields are rejected like missing ones
        if fields.len() != FONT_FIELDS {
            return Err(GfxFontError::FieldCount {
                statement: statement.to_string(),
                expected: FONT_FIELDS,
                found: fields.len(),
            });
        }
        return Ok(Declaration::Font(FontRecord {
            name: caps[1].to_string(),
            bitmap_ref: strip_reference(fields[0]),
            glyphs_ref: strip_reference(fields[1]),
            first: narrow(parse_int(fields[2])?, "first")?,
            last: narrow(parse_int(fields[3])?, "last")?,
            y_advance: narrow(parse_int(fields[4])?, "yAdvance")?,
        }));
    }

    Err(GfxFontError::MalformedStatement {
        statement: statement.to_string(),
    })
}

fn parse_glyph(statement: &str, tuple: &str) -> crate::Result<Glyph> {
    let fields = split_list(tuple).map(parse_int).collect::<crate::Result<Vec<i64>>>()?;
    if fields.len() != GLYPH_FIELDS {
        return Err(GfxFontError::FieldCount {
            statement: statement.to_string(),
            expected: GLYPH_FIELDS,
            found: fields.len(),
        });
    }
    Ok(Glyph {
        bitmap_offset: narrow(fields[0], "bitmapOffset")?,
        width: narrow(fields[1], "width")?,
        height: narrow(fields[2], "height")?,
        x_advance: narrow(fields[3], "xAdvance")?,
        x_offset: narrow(fields[4], "xOffset")?,
        y_offset: narrow(fields[5], "yOffset")?,
    })
}

/// Comma separated items, trimmed, with empty items (trailing commas) dropped.
fn split_list(body: &str) -> impl Iterator<Item = &str> {
    body.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn strip_reference(field: &str) -> String {
    CAST_RE.replace(field, "").trim().trim_start_matches('&').trim().to_string()
}

/// Parses a C integer literal: `0x` hex, leading `0` octal, decimal otherwise.
pub fn parse_int(literal: &str) -> crate::Result<i64> {
    let err = || GfxFontError::IntegerLiteral {
        literal: literal.to_string(),
    };
    let trimmed = literal.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, trimmed[1..].trim_start()),
        Some(b'+') => (false, trimmed[1..].trim_start()),
        _ => (false, trimmed),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(err());
    }

    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8)
    } else {
        digits.parse::<i64>()
    }
    .map_err(|_| err())?;

    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "const uint8_t TestBitmaps[] PROGMEM = { 0xFF, 0x00 };
const GFXglyph TestGlyphs[] PROGMEM = { {0, 4, 2, 5, 0, -1} };
const GFXfont Test PROGMEM = { (uint8_t *)TestBitmaps, (GFXglyph *)TestGlyphs, 0x41, 0x41, 8 };";

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("0x1F").unwrap(), 31);
        assert_eq!(parse_int("0XfF").unwrap(), 255);
        assert_eq!(parse_int("017").unwrap(), 15);
        assert_eq!(parse_int("0").unwrap(), 0);
        assert_eq!(parse_int("42").unwrap(), 42);
        assert_eq!(parse_int("-11").unwrap(), -11);
        assert_eq!(parse_int(" +7 ").unwrap(), 7);
        assert!(parse_int("09").is_err());
        assert!(parse_int("0x").is_err());
        assert!(parse_int("abc").is_err());
        assert!(parse_int("-").is_err());
        assert!(parse_int("--1").is_err());
        assert_eq!(
            parse_int("12a"),
            Err(GfxFontError::IntegerLiteral {
                literal: "12a".to_string()
            })
        );
    }

    #[test]
    fn test_strip_comments() {
        let src = "#include <Adafruit_GFX.h>\n/* block\n comment */ const // line\n  uint8_t  x;\n  #pragma once";
        assert_eq!(strip_comments(src).trim(), "const uint8_t x;");
    }

    #[test]
    fn test_comment_markers_inside_line_comment() {
        let src = "const uint8_t A[] = {1, // 0x2F '/*'\n 2};";
        let font_src = format!("{src} const GFXglyph G[] = {{}}; const GFXfont F = {{A, G, 1, 0, 1}};");
        let font = parse_font(&font_src).unwrap();
        assert_eq!(font.bitmap, vec![1, 2]);
    }

    #[test]
    fn test_parse_simple() {
        let font = parse_font(SIMPLE).unwrap();
        assert_eq!(font.name, "Test");
        assert_eq!(font.bitmap, vec![0xFF, 0x00]);
        assert_eq!(font.glyphs, vec![Glyph::new(0, 4, 2, 5, 0, -1)]);
        assert_eq!((font.first, font.last, font.y_advance), (0x41, 0x41, 8));
    }

    #[test]
    fn test_order_independent() {
        let src = "const GFXfont Test = { (uint8_t *)TestBitmaps, (GFXglyph *)TestGlyphs, 0x41, 0x41, 8 };
const GFXglyph TestGlyphs[] = { {0, 4, 2, 5, 0, -1} };
const uint8_t TestBitmaps[] = { 0xFF, 0x00 };";
        assert_eq!(parse_font(src).unwrap(), parse_font(SIMPLE).unwrap());
    }

    #[test]
    fn test_unresolved_reference() {
        let src = "const uint8_t TestBitmaps[] = { 0xFF };
const GFXfont Test = { (uint8_t *)TestBitmaps, (GFXglyph *)MissingGlyphs, 0x41, 0x41, 8 };";
        assert_eq!(
            parse_font(src),
            Err(GfxFontError::UnresolvedReference {
                name: "MissingGlyphs".to_string(),
                kind: TableKind::Glyphs
            })
        );

        let src = "const GFXglyph TestGlyphs[] = { {0, 1, 1, 2, 0, 0} };
const GFXfont Test = { (uint8_t *)MissingBitmaps, (GFXglyph *)TestGlyphs, 0x41, 0x41, 8 };";
        assert_eq!(
            parse_font(src),
            Err(GfxFontError::UnresolvedReference {
                name: "MissingBitmaps".to_string(),
                kind: TableKind::Bitmap
            })
        );
    }

    #[test]
    fn test_malformed_statement() {
        let src = "int   unrelated =  5;";
        assert_eq!(
            parse_font(src),
            Err(GfxFontError::MalformedStatement {
                statement: "int unrelated = 5".to_string()
            })
        );
    }

    #[test]
    fn test_no_font_record() {
        assert_eq!(parse_font("const uint8_t A[] = {1};"), Err(GfxFontError::NoFontRecord));
        assert_eq!(parse_font("   // nothing here\n"), Err(GfxFontError::NoFontRecord));
    }

    #[test]
    fn test_empty_tables() {
        let src = "const uint8_t EBitmaps[] PROGMEM = {};
const GFXglyph EGlyphs[] PROGMEM = {};
const GFXfont E PROGMEM = {(uint8_t *)EBitmaps, (GFXglyph *)EGlyphs, 0x41, 0x40, 8};";
        let font = parse_font(src).unwrap();
        assert!(font.bitmap.is_empty());
        assert!(font.glyphs.is_empty());
        assert_eq!(font.expected_glyph_count(), 0);
    }

    #[test]
    fn test_glyph_field_count() {
        let src = "const GFXglyph G[] = { {0, 4, 2, 5, 0} };";
        assert!(matches!(
            parse_font(src),
            Err(GfxFontError::FieldCount {
                expected: 6,
                found: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_font_field_count() {
        let src = "const uint8_t A[] = {}; const GFXglyph G[] = {}; const GFXfont F = { A, G, 0x20 };";
        assert!(matches!(
            parse_font(src),
            Err(GfxFontError::FieldCount {
                expected: 5,
                found: 3,
                ..
            })
        ));

        let src = "const uint8_t A[] = {}; const GFXglyph G[] = {}; const GFXfont F = { A, G, 0x20, 0x1F, 8, 0 };";
        assert!(matches!(
            parse_font(src),
            Err(GfxFontError::FieldCount {
                expected: 5,
                found: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_value_out_of_range() {
        assert_eq!(
            parse_font("const uint8_t A[] = {0x100};"),
            Err(GfxFontError::ValueOutOfRange {
                field: "bitmap byte",
                value: 256
            })
        );
        assert_eq!(
            parse_font("const GFXglyph G[] = {{0, 1, 1, 1, 0, -129}};"),
            Err(GfxFontError::ValueOutOfRange {
                field: "yOffset",
                value: -129
            })
        );
    }

    #[test]
    fn test_duplicate_declaration() {
        let src = "const uint8_t A[] = {1}; const GFXglyph A[] = {};";
        assert_eq!(parse_font(src), Err(GfxFontError::DuplicateDeclaration { name: "A".to_string() }));
    }

    #[test]
    fn test_garbage_in_glyph_table() {
        let src = "const GFXglyph G[] = { {0, 1, 1, 1, 0, 0}, 7 };";
        assert!(matches!(parse_font(src), Err(GfxFontError::MalformedStatement { .. })));
    }

    #[test]
    fn test_reference_forms() {
        assert_eq!(strip_reference("(uint8_t *)FooBitmaps"), "FooBitmaps");
        assert_eq!(strip_reference("(GFXglyph *) FooGlyphs"), "FooGlyphs");
        assert_eq!(strip_reference("&FooGlyphs"), "FooGlyphs");
        assert_eq!(strip_reference("FooBitmaps"), "FooBitmaps");
    }

    #[test]
    fn test_parse_all() {
        let src = format!(
            "{SIMPLE}\nconst GFXfont Other = {{ (uint8_t *)TestBitmaps, (GFXglyph *)TestGlyphs, 0x61, 0x61, 9 }};"
        );
        let fonts = DeclarationParser::new().parse_all(&src).unwrap();
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[1].name, "Other");
        assert_eq!(fonts[1].first, 0x61);
        assert_eq!(DeclarationParser::new().parse(&src).unwrap().name, "Test");
    }
}
