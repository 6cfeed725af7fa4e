#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::return_self_not_must_use
)]
//! Codec for Adafruit-GFX style packed bitmap fonts.
//!
//! A font record is three linked C declarations: a byte table holding the
//! bit-packed glyph rasters, a glyph table with per-glyph metrics and a
//! `GFXfont` record referencing both. This crate parses such a source into a
//! [`GfxFont`], packs rasters into the format's bitstream and formats the
//! model back to text, optionally annotated with ASCII diagrams.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GfxFontError>;

pub mod bitmap;
pub use bitmap::{pack_bits, unpack_bits, BitPacker, BitReader};

mod glyph;
pub use glyph::*;

mod font;
pub use font::*;

pub mod parser;
pub use parser::DeclarationParser;

pub mod draw;
pub use draw::GlyphDiagram;

pub mod formatter;
pub use formatter::{FormatOptions, Formatter};

pub mod builder;
pub use builder::{derive_font_name, GfxFontBuilder, RasterGlyph, Rasterizer};

mod metrics;
pub use metrics::TextBounds;

/// The two table kinds a font record refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    Bitmap,
    Glyphs,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Bitmap => write!(f, "byte table"),
            TableKind::Glyphs => write!(f, "glyph table"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GfxFontError {
    #[error("Cannot parse statement: `{statement}`")]
    MalformedStatement { statement: String },

    #[error("Statement `{statement}` has {found} fields, expected {expected}")]
    FieldCount { statement: String, expected: usize, found: usize },

    #[error("Unresolved {kind} reference: {name}")]
    UnresolvedReference { name: String, kind: TableKind },

    #[error("Duplicate declaration: {name}")]
    DuplicateDeclaration { name: String },

    #[error("No font record declaration found")]
    NoFontRecord,

    #[error("Invalid integer literal: `{literal}`")]
    IntegerLiteral { literal: String },

    #[error("Value {value} out of range for {field}")]
    ValueOutOfRange { field: &'static str, value: i64 },

    #[error("Glyph count mismatch: range requires {expected}, got {actual}")]
    GlyphCountMismatch { expected: i64, actual: usize },

    #[error("Bitmap too short: glyphs require {required} bytes, got {actual}")]
    BitmapTooShort { required: usize, actual: usize },

    #[error("Bitmap length mismatch: glyphs require {expected} bytes, got {actual}")]
    BitmapLengthMismatch { expected: usize, actual: usize },

    #[error("Glyph {index} starts at byte {actual}, expected {expected}")]
    OffsetMismatch { index: usize, expected: usize, actual: usize },

    #[error("Plot at ({x},{y}) outside of box x:[{left},{right}] y:[{top},{bottom}]")]
    BoundsViolation {
        x: i32,
        y: i32,
        left: i32,
        right: i32,
        top: i32,
        bottom: i32,
    },

    #[error("Raster buffer too short: need {required} bytes, got {actual}")]
    RasterTooShort { required: usize, actual: usize },

    #[error("Rasterizer failed for codepoint 0x{codepoint:02X}: {message}")]
    Rasterizer { codepoint: u32, message: String },
}

/// `ceil(bits / 8)`, the number of bytes a glyph's packed bits occupy.
#[inline]
pub(crate) fn packed_len(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Converts to a narrower field type, reporting the field name on overflow.
pub(crate) fn narrow<T: TryFrom<i64>>(value: i64, field: &'static str) -> Result<T> {
    T::try_from(value).map_err(|_| GfxFontError::ValueOutOfRange { field, value })
}
