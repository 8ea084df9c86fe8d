//! Glyph outlines from the `glyf` table.
//!
//! Glyphs are decoded lazily. A resolved glyph is memoised in a
//! [`GlyphCache`], so compound glyphs that share components decode each
//! component once, and repeated lookups return the same [`Arc`].

pub mod compound;
pub mod contour;
pub mod simple;
pub mod transform;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{debug, trace};
use thiserror::Error;

use crate::buffer::{CursorError, FontCursor};

use self::compound::CompoundGlyph;
use self::contour::Contour;
use self::simple::SimpleGlyph;
use super::Tag;
use super::loca::LocationIndex;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlyphError {
    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("the font has no '{0}' table")]
    MissingTable(Tag),

    #[error("glyph {index} is out of range, the font has {num_glyphs} glyphs")]
    GlyphOutOfRange { index: u16, num_glyphs: u16 },

    #[error("compound glyph {glyph_index} is malformed: {reason}")]
    MalformedCompoundGlyph {
        glyph_index: u16,
        reason: &'static str,
    },

    #[error("glyph {0} references itself through its components")]
    CyclicComponent(u16),

    #[error("glyph {glyph_index} nests components deeper than {limit} levels")]
    ComponentDepthExceeded { glyph_index: u16, limit: u16 },
}

/// A glyph bounding box in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl Rect {
    fn from_cursor(cursor: &mut FontCursor<'_>) -> Result<Self, CursorError> {
        Ok(Self {
            x_min: cursor.read_i16()?,
            y_min: cursor.read_i16()?,
            x_max: cursor.read_i16()?,
            y_max: cursor.read_i16()?,
        })
    }
}

static EMPTY_CONTOUR: Contour = Contour::new();

/// A decoded glyph.
#[derive(Debug, Clone, PartialEq)]
pub enum Glyph {
    /// A glyph without an outline, such as a space.
    Empty,
    Simple(SimpleGlyph),
    Compound(CompoundGlyph),
}

impl Glyph {
    /// The value stored in the glyph header; negative for compound glyphs.
    pub fn number_of_contours(&self) -> i16 {
        match self {
            Glyph::Empty => 0,
            Glyph::Simple(glyph) => glyph.number_of_contours,
            Glyph::Compound(glyph) => glyph.number_of_contours,
        }
    }

    pub fn bbox(&self) -> Rect {
        match self {
            Glyph::Empty => Rect::default(),
            Glyph::Simple(glyph) => glyph.bbox,
            Glyph::Compound(glyph) => glyph.bbox,
        }
    }

    /// The reconstructed outline. An empty glyph has exactly one contour
    /// with no points.
    pub fn contours(&self) -> &[Contour] {
        match self {
            Glyph::Empty => std::slice::from_ref(&EMPTY_CONTOUR),
            Glyph::Simple(glyph) => &glyph.contours,
            Glyph::Compound(glyph) => &glyph.contours,
        }
    }

    /// The control points before curve reconstruction.
    pub fn points(&self) -> &Contour {
        match self {
            Glyph::Empty => &EMPTY_CONTOUR,
            Glyph::Simple(glyph) => &glyph.points,
            Glyph::Compound(glyph) => &glyph.points,
        }
    }

    pub fn instructions(&self) -> &[u8] {
        match self {
            Glyph::Empty => &[],
            Glyph::Simple(glyph) => &glyph.instructions,
            Glyph::Compound(glyph) => &glyph.instructions,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Glyph::Empty)
    }
}

/// Memoised glyphs, plus the glyphs currently being resolved.
#[derive(Debug, Default)]
pub struct GlyphCache {
    glyphs: HashMap<u16, Arc<Glyph>>,
    resolving: HashSet<u16>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, glyph_index: u16) -> Option<Arc<Glyph>> {
        self.glyphs.get(&glyph_index).cloned()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Decodes glyphs out of a `glyf` table, using `loca` to find them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlyphDecoder<'a> {
    glyf: &'a [u8],
    loca: &'a LocationIndex,
    max_depth: u16,
}

impl<'a> GlyphDecoder<'a> {
    pub(crate) fn new(glyf: &'a [u8], loca: &'a LocationIndex, max_depth: u16) -> Self {
        Self {
            glyf,
            loca,
            max_depth,
        }
    }

    /// Returns the glyph at `glyph_index`, decoding it and every component
    /// it references on first use.
    pub(crate) fn resolve(
        &self,
        cache: &mut GlyphCache,
        glyph_index: u16,
    ) -> Result<Arc<Glyph>, GlyphError> {
        self.resolve_at_depth(cache, glyph_index, 0)
    }

    fn resolve_at_depth(
        &self,
        cache: &mut GlyphCache,
        glyph_index: u16,
        depth: u16,
    ) -> Result<Arc<Glyph>, GlyphError> {
        if let Some(glyph) = cache.get(glyph_index) {
            trace!("glyph {glyph_index}: cached");
            return Ok(glyph);
        }
        if depth > self.max_depth {
            return Err(GlyphError::ComponentDepthExceeded {
                glyph_index,
                limit: self.max_depth,
            });
        }
        if !cache.resolving.insert(glyph_index) {
            return Err(GlyphError::CyclicComponent(glyph_index));
        }

        let decoded = self.decode(cache, glyph_index, depth);
        cache.resolving.remove(&glyph_index);

        let glyph = Arc::new(decoded?);
        cache.glyphs.insert(glyph_index, Arc::clone(&glyph));
        Ok(glyph)
    }

    fn decode(
        &self,
        cache: &mut GlyphCache,
        glyph_index: u16,
        depth: u16,
    ) -> Result<Glyph, GlyphError> {
        let entry = self
            .loca
            .entry(glyph_index)
            .ok_or(GlyphError::GlyphOutOfRange {
                index: glyph_index,
                num_glyphs: self.loca.len() as u16,
            })?;
        if entry.length == 0 {
            trace!("glyph {glyph_index}: empty");
            return Ok(Glyph::Empty);
        }

        let record = FontCursor::at(self.glyf, entry.offset as usize)?
            .read_bytes(entry.length as usize)?;
        let mut cursor = FontCursor::new(record);
        let number_of_contours = cursor.read_i16()?;
        let bbox = Rect::from_cursor(&mut cursor)?;
        debug!("glyph {glyph_index}: {number_of_contours} contours, {bbox:?}");

        if number_of_contours > 0 {
            SimpleGlyph::from_cursor(&mut cursor, number_of_contours, bbox).map(Glyph::Simple)
        } else if number_of_contours < 0 {
            let child_depth = depth.saturating_add(1);
            let mut resolve_component =
                |component: u16| self.resolve_at_depth(cache, component, child_depth);
            CompoundGlyph::from_cursor(
                &mut cursor,
                glyph_index,
                number_of_contours,
                bbox,
                &mut resolve_component,
            )
            .map(Glyph::Compound)
        } else {
            Ok(Glyph::Empty)
        }
    }
}
