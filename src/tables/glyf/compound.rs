use std::sync::Arc;

use bitflags::bitflags;
use log::trace;

use crate::buffer::FontCursor;

use super::contour::Contour;
use super::transform::Transform;
use super::{Glyph, GlyphError, Rect};

bitflags! {
    /// Flags describing how a component is placed inside a compound glyph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ComponentFlags: u16 {
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        const WE_HAVE_A_SCALE = 0x0008;
        const MORE_COMPONENTS = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// How a component is positioned relative to the glyph that references it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// A plain translation in font units.
    Offset { x: f64, y: f64 },
    /// Translate by the coordinates of points in the component's first
    /// contour: x from point `x_point`, y from point `y_point`.
    MatchPoints { x_point: i16, y_point: i16 },
}

/// One component record of a compound glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub glyph_index: u16,
    pub flags: ComponentFlags,
    pub placement: Placement,
    /// The final map applied to the component outline, including the
    /// translation looked up through point matching.
    pub transform: Transform,
}

impl Component {
    /// Reads one component record. Point-matching placements need the
    /// referenced outline, so their translation is filled in by [`Component::place`].
    fn from_cursor(cursor: &mut FontCursor<'_>) -> Result<Self, GlyphError> {
        let flags = ComponentFlags::from_bits_retain(cursor.read_u16()?);
        let glyph_index = cursor.read_u16()?;

        let (arg1, arg2) = if flags.contains(ComponentFlags::ARG_1_AND_2_ARE_WORDS) {
            (cursor.read_i16()?, cursor.read_i16()?)
        } else {
            (i16::from(cursor.read_i8()?), i16::from(cursor.read_i8()?))
        };

        let (a, b, c, d) = if flags.contains(ComponentFlags::WE_HAVE_A_SCALE) {
            let scale = cursor.read_f2dot14()?;
            (scale, 0.0, 0.0, scale)
        } else if flags.contains(ComponentFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            let x_scale = cursor.read_f2dot14()?;
            let y_scale = cursor.read_f2dot14()?;
            (x_scale, 0.0, 0.0, y_scale)
        } else if flags.contains(ComponentFlags::WE_HAVE_A_TWO_BY_TWO) {
            (
                cursor.read_f2dot14()?,
                cursor.read_f2dot14()?,
                cursor.read_f2dot14()?,
                cursor.read_f2dot14()?,
            )
        } else {
            (1.0, 0.0, 0.0, 1.0)
        };

        let placement = if flags.contains(ComponentFlags::ARGS_ARE_XY_VALUES) {
            Placement::Offset {
                x: f64::from(arg1),
                y: f64::from(arg2),
            }
        } else {
            Placement::MatchPoints {
                x_point: arg1,
                y_point: arg2,
            }
        };
        let (e, f) = match placement {
            Placement::Offset { x, y } => (x, y),
            Placement::MatchPoints { .. } => (0.0, 0.0),
        };

        Ok(Self {
            glyph_index,
            flags,
            placement,
            transform: Transform::new(a, b, c, d, e, f),
        })
    }

    /// Completes the transform of a point-matching component from the
    /// first contour of the glyph it references.
    fn place(
        &mut self,
        glyph_index: u16,
        assembled: &[Contour],
        outline: &Contour,
    ) -> Result<(), GlyphError> {
        let Placement::MatchPoints { x_point, y_point } = self.placement else {
            return Ok(());
        };
        if assembled.is_empty() {
            return Err(GlyphError::MalformedCompoundGlyph {
                glyph_index,
                reason: "point matching before any component outline",
            });
        }
        let coordinate = |values: &[f64], index: i16| {
            usize::try_from(index)
                .ok()
                .and_then(|index| values.get(index).copied())
                .ok_or(GlyphError::MalformedCompoundGlyph {
                    glyph_index,
                    reason: "matched point index out of range",
                })
        };
        let e = coordinate(outline.x(), x_point)?;
        let f = coordinate(outline.y(), y_point)?;

        let t = self.transform;
        self.transform = Transform::new(t.a, t.b, t.c, t.d, e, f);
        Ok(())
    }
}

/// A glyph assembled from transformed references to other glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundGlyph {
    pub number_of_contours: i16,
    pub bbox: Rect,
    pub components: Vec<Component>,
    pub instructions: Vec<u8>,
    /// Transformed control points of every component, in order
    pub points: Contour,
    /// The transformed reconstructed contours of every component, in order
    pub contours: Vec<Contour>,
}

impl CompoundGlyph {
    /// Reads component records until one clears `MORE_COMPONENTS`, resolving
    /// each referenced glyph through `resolve`.
    pub(crate) fn from_cursor(
        cursor: &mut FontCursor<'_>,
        glyph_index: u16,
        number_of_contours: i16,
        bbox: Rect,
        resolve: &mut dyn FnMut(u16) -> Result<Arc<Glyph>, GlyphError>,
    ) -> Result<Self, GlyphError> {
        let mut components = Vec::new();
        let mut points = Contour::new();
        let mut contours: Vec<Contour> = Vec::new();
        let empty = Contour::new();

        loop {
            let mut component = Component::from_cursor(cursor)?;
            trace!(
                "glyph {glyph_index}: component {} {:?}",
                component.glyph_index, component.flags
            );
            let child = resolve(component.glyph_index)?;
            // only the first contour of a component contributes
            let outline = child.contours().first().unwrap_or(&empty);
            component.place(glyph_index, &contours, outline)?;

            points.append_shapes(&component.transform.apply(child.points()));
            contours.push(component.transform.apply(outline));

            let flags = component.flags;
            components.push(component);
            if !flags.contains(ComponentFlags::MORE_COMPONENTS) {
                let instructions = if flags.contains(ComponentFlags::WE_HAVE_INSTRUCTIONS) {
                    let length = cursor.read_u16()?;
                    cursor.read_bytes(usize::from(length))?.to_vec()
                } else {
                    Vec::new()
                };

                return Ok(Self {
                    number_of_contours,
                    bbox,
                    components,
                    instructions,
                    points,
                    contours,
                });
            }
        }
    }
}
