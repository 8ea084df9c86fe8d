use bitflags::bitflags;
use log::trace;

use crate::buffer::FontCursor;

use super::contour::{Contour, Point};
use super::{GlyphError, Rect};

bitflags! {
    /// Per-point flags of a simple glyph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SimpleGlyphFlags: u8 {
        const ON_CURVE_POINT = 0x01;
        const X_SHORT_VECTOR = 0x02;
        const Y_SHORT_VECTOR = 0x04;
        const REPEAT_FLAG = 0x08;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0x10;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0x20;
        const OVERLAP_SIMPLE = 0x40;
    }
}

/// A glyph described directly by its own contours.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleGlyph {
    pub number_of_contours: i16,
    pub bbox: Rect,
    /// Index of the last point of each shape
    pub end_points: Vec<u16>,
    pub instructions: Vec<u8>,
    /// The control points as stored in the font
    pub points: Contour,
    /// The reconstructed outline: a single contour holding every shape
    pub contours: Vec<Contour>,
}

impl SimpleGlyph {
    pub(crate) fn from_cursor(
        cursor: &mut FontCursor<'_>,
        number_of_contours: i16,
        bbox: Rect,
    ) -> Result<Self, GlyphError> {
        let contour_count = usize::from(number_of_contours.unsigned_abs());
        cursor.ensure(contour_count * 2)?;
        let mut end_points = Vec::with_capacity(contour_count);
        for _ in 0..contour_count {
            end_points.push(cursor.read_u16()?);
        }
        let num_points = end_points.last().map_or(0, |&last| usize::from(last) + 1);

        let instruction_length = cursor.read_u16()?;
        let instructions = cursor.read_bytes(usize::from(instruction_length))?.to_vec();

        let flags = read_flags(cursor, num_points)?;
        let xs = read_coordinates(
            cursor,
            &flags,
            SimpleGlyphFlags::X_SHORT_VECTOR,
            SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
        )?;
        let ys = read_coordinates(
            cursor,
            &flags,
            SimpleGlyphFlags::Y_SHORT_VECTOR,
            SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
        )?;

        let shapes = shape_ids(&end_points, num_points);
        let mut points = Contour::with_capacity(num_points);
        for (i, flag) in flags.iter().enumerate() {
            points.push(Point {
                x: f64::from(xs[i]),
                y: f64::from(ys[i]),
                on_curve: flag.contains(SimpleGlyphFlags::ON_CURVE_POINT),
                shape: shapes[i],
            });
        }
        trace!("simple glyph: {contour_count} contours, {num_points} points");

        let contours = vec![points.reconstruct()];
        Ok(Self {
            number_of_contours,
            bbox,
            end_points,
            instructions,
            points,
            contours,
        })
    }
}

/// Assigns an increasing shape id to every point up to and including each
/// end point.
fn shape_ids(end_points: &[u16], num_points: usize) -> Vec<u16> {
    let mut shapes = Vec::with_capacity(num_points);
    for (shape, &end) in (0u16..).zip(end_points) {
        while shapes.len() <= usize::from(end) && shapes.len() < num_points {
            shapes.push(shape);
        }
    }
    shapes
}

fn read_flags(
    cursor: &mut FontCursor<'_>,
    num_points: usize,
) -> Result<Vec<SimpleGlyphFlags>, GlyphError> {
    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = SimpleGlyphFlags::from_bits_retain(cursor.read_u8()?);
        flags.push(flag);
        if flag.contains(SimpleGlyphFlags::REPEAT_FLAG) {
            let repeats = usize::from(cursor.read_u8()?);
            // a repeat count running past the last point is clamped
            let repeats = repeats.min(num_points - flags.len());
            flags.extend(std::iter::repeat_n(flag, repeats));
        }
    }
    Ok(flags)
}

/// Reads one axis of delta-encoded coordinates and accumulates them into
/// absolute positions.
fn read_coordinates(
    cursor: &mut FontCursor<'_>,
    flags: &[SimpleGlyphFlags],
    short: SimpleGlyphFlags,
    same_or_positive: SimpleGlyphFlags,
) -> Result<Vec<i32>, GlyphError> {
    let mut coordinates = Vec::with_capacity(flags.len());
    let mut value = 0i32;
    for flag in flags {
        let delta = if flag.contains(short) {
            let magnitude = i32::from(cursor.read_u8()?);
            if flag.contains(same_or_positive) {
                magnitude
            } else {
                -magnitude
            }
        } else if flag.contains(same_or_positive) {
            0
        } else {
            i32::from(cursor.read_i16()?)
        };
        value += delta;
        coordinates.push(value);
    }
    Ok(coordinates)
}
