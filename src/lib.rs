//! A TrueType font decoder that reconstructs glyph outlines.
//!
//! [`Font`] parses the table directory, the metadata tables and every
//! character map of an in-memory font. Glyph outlines, including compound
//! glyphs, are decoded on demand into closed polylines.

use buffer::CursorError;
use tables::TableEncodingError;
use tables::glyf::GlyphError;
use thiserror::Error;

pub mod buffer;
pub mod font;
pub mod options;
pub mod tables;

pub use font::Font;
pub use options::FontOptions;
pub use tables::Tag;
pub use tables::glyf::Glyph;
pub use tables::glyf::contour::{Contour, Point};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FontError {
    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Table(#[from] TableEncodingError),

    #[error(transparent)]
    Glyph(#[from] GlyphError),
}

impl FontError {
    /// The underlying short read, if that is what failed.
    pub fn cursor_error(&self) -> Option<&CursorError> {
        match self {
            FontError::Cursor(err)
            | FontError::Table(TableEncodingError::Cursor(err))
            | FontError::Glyph(GlyphError::Cursor(err)) => Some(err),
            _ => None,
        }
    }
}
