use log::warn;

use crate::buffer::FontCursor;

use super::{TableEncodingError, TableRecord, post_names::STANDARD_GLYPH_NAMES};

/// A representation of the [post table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6post.html)
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// The raw 16.16 version, e.g. 0x00025000 for version 2.5
    pub version: u32,
    /// Italic angle in counter-clockwise degrees from the vertical
    pub italic_angle: f64,
    pub underline_position: i16,
    pub underline_thickness: i16,
    /// Non-zero when the font is monospaced
    pub is_fixed_pitch: u32,
    pub min_mem_type42: u32,
    pub max_mem_type42: u32,
    pub min_mem_type1: u32,
    pub max_mem_type1: u32,

    /// Glyph names indexed by glyph index. `None` when the table does not
    /// resolve a name for that glyph.
    glyph_names: Vec<Option<String>>,
}

impl Post {
    pub const VERSION_1_0: u32 = 0x0001_0000;
    pub const VERSION_2_0: u32 = 0x0002_0000;
    pub const VERSION_2_5: u32 = 0x0002_5000;
    pub const VERSION_3_0: u32 = 0x0003_0000;

    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
    ) -> Result<Self, TableEncodingError> {
        let mut cursor = FontCursor::new(record.data(data)?);

        let version = cursor.read_u32()?;
        let italic_angle = cursor.read_fixed()?;
        let underline_position = cursor.read_fword()?;
        let underline_thickness = cursor.read_fword()?;
        let is_fixed_pitch = cursor.read_u32()?;
        let min_mem_type42 = cursor.read_u32()?;
        let max_mem_type42 = cursor.read_u32()?;
        let min_mem_type1 = cursor.read_u32()?;
        let max_mem_type1 = cursor.read_u32()?;

        let glyph_names = match version {
            Self::VERSION_1_0 => STANDARD_GLYPH_NAMES
                .iter()
                .map(|name| Some(name.to_string()))
                .collect(),
            Self::VERSION_2_0 => read_indexed_names(&mut cursor)?,
            Self::VERSION_2_5 => read_offset_names(&mut cursor)?,
            Self::VERSION_3_0 => vec![Some(".notdef".to_string())],
            _ => return Err(TableEncodingError::UnsupportedPostVersion(version)),
        };

        Ok(Self {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
            min_mem_type42,
            max_mem_type42,
            min_mem_type1,
            max_mem_type1,
            glyph_names,
        })
    }

    /// Returns the PostScript name of a glyph.
    pub fn glyph_name(&self, glyph_index: u16) -> Option<&str> {
        self.glyph_names
            .get(usize::from(glyph_index))?
            .as_deref()
    }

    /// Number of glyph name slots the table covers.
    pub fn num_names(&self) -> usize {
        self.glyph_names.len()
    }
}

/// Version 2.0: one name index per glyph. Indices below 258 select a
/// standard name, the rest select a Pascal string stored after the index
/// array.
fn read_indexed_names(
    cursor: &mut FontCursor<'_>,
) -> Result<Vec<Option<String>>, TableEncodingError> {
    let num_glyphs = usize::from(cursor.read_u16()?);
    cursor.ensure(num_glyphs * 2)?;
    let mut indices = Vec::with_capacity(num_glyphs);
    for _ in 0..num_glyphs {
        indices.push(usize::from(cursor.read_u16()?));
    }

    let custom_count = indices
        .iter()
        .filter_map(|&index| index.checked_sub(STANDARD_GLYPH_NAMES.len()))
        .max()
        .map_or(0, |max| max + 1);
    let mut custom = Vec::with_capacity(custom_count.min(cursor.remaining()));
    for _ in 0..custom_count {
        match cursor.read_pascal_string() {
            Ok(bytes) => custom.push(String::from_utf8_lossy(bytes).into_owned()),
            Err(_) => {
                warn!(
                    "post table holds {} of {} custom glyph names",
                    custom.len(),
                    custom_count
                );
                break;
            }
        }
    }

    Ok(indices
        .into_iter()
        .map(|index| match index.checked_sub(STANDARD_GLYPH_NAMES.len()) {
            None => Some(STANDARD_GLYPH_NAMES[index].to_string()),
            Some(custom_index) => custom.get(custom_index).cloned(),
        })
        .collect())
}

/// Version 2.5: one signed offset per glyph into the standard names.
fn read_offset_names(
    cursor: &mut FontCursor<'_>,
) -> Result<Vec<Option<String>>, TableEncodingError> {
    let num_glyphs = cursor.read_u16()?;
    cursor.ensure(usize::from(num_glyphs))?;
    let mut names = Vec::with_capacity(usize::from(num_glyphs));
    for glyph_index in 0..num_glyphs {
        let offset = cursor.read_i8()?;
        let index = i32::from(glyph_index) + i32::from(offset);
        let name = usize::try_from(index)
            .ok()
            .and_then(|index| STANDARD_GLYPH_NAMES.get(index));
        if name.is_none() {
            warn!("post 2.5 offset {offset} for glyph {glyph_index} is out of range");
        }
        names.push(name.map(|name| name.to_string()));
    }
    Ok(names)
}
