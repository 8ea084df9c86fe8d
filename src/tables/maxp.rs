use crate::buffer::FontCursor;

use super::{TableEncodingError, TableRecord};

/// A representation of the [maxp table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6maxp.html)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maxp {
    /// 0x00005000 (version 0.5) for CFF outlines, 0x00010000 for TrueType
    pub version: u32,

    /// The number of glyphs in the font
    pub num_glyphs: u16,

    /// Only present in version 1.0 tables
    pub limits: Option<MaxpLimits>,
}

/// The TrueType limits of a version 1.0 maxp table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaxpLimits {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_component_points: u16,
    pub max_component_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    /// Levels of recursion allowed in compound glyphs
    pub max_component_depth: u16,
}

impl Maxp {
    pub const VERSION_0_5: u32 = 0x0000_5000;

    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
    ) -> Result<Self, TableEncodingError> {
        let mut cursor = FontCursor::at(data, record.offset as usize)?;
        let raw_version = cursor.read_u32()?;
        let num_glyphs = cursor.read_u16()?;

        let limits = if raw_version == Self::VERSION_0_5 {
            None
        } else {
            Some(MaxpLimits {
                max_points: cursor.read_u16()?,
                max_contours: cursor.read_u16()?,
                max_component_points: cursor.read_u16()?,
                max_component_contours: cursor.read_u16()?,
                max_zones: cursor.read_u16()?,
                max_twilight_points: cursor.read_u16()?,
                max_storage: cursor.read_u16()?,
                max_function_defs: cursor.read_u16()?,
                max_instruction_defs: cursor.read_u16()?,
                max_stack_elements: cursor.read_u16()?,
                max_size_of_instructions: cursor.read_u16()?,
                max_component_elements: cursor.read_u16()?,
                max_component_depth: cursor.read_u16()?,
            })
        };

        Ok(Self {
            version: raw_version,
            num_glyphs,
            limits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Tag;

    fn record(len: usize) -> TableRecord {
        TableRecord {
            tag: Tag::MAXP,
            checksum: 0,
            offset: 0,
            length: len as u32,
        }
    }

    #[test]
    fn version_1_reads_limits() {
        let mut data = vec![0, 1, 0, 0, 0, 5];
        for v in 1..=13u16 {
            data.extend_from_slice(&v.to_be_bytes());
        }
        let maxp = Maxp::from_record(&data, &record(data.len())).unwrap();
        assert_eq!(maxp.version, 0x0001_0000);
        assert_eq!(maxp.num_glyphs, 5);
        let limits = maxp.limits.unwrap();
        assert_eq!(limits.max_points, 1);
        assert_eq!(limits.max_component_depth, 13);
    }

    #[test]
    fn version_0_5_has_no_limits() {
        let data = [0, 0, 0x50, 0, 0, 7];
        let maxp = Maxp::from_record(&data, &record(data.len())).unwrap();
        assert_eq!(maxp.version, Maxp::VERSION_0_5);
        assert_eq!(maxp.num_glyphs, 7);
        assert_eq!(maxp.limits, None);
    }
}
