use log::warn;

use crate::buffer::FontCursor;

use super::{TableEncodingError, TableRecord};

/// The two encodings of the loca table, selected by
/// `head.index_to_loc_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaFormat {
    /// 16-bit offsets, stored divided by two
    Short,
    /// 32-bit offsets
    Long,
}

impl TryFrom<i16> for LocaFormat {
    type Error = TableEncodingError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Short),
            1 => Ok(Self::Long),
            _ => Err(TableEncodingError::InvalidLocaFormat(value)),
        }
    }
}

/// The position of one glyph's record inside the glyf table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaEntry {
    pub glyph_index: u16,
    /// Offset from the start of the glyf table
    pub offset: u32,
    /// Zero for glyphs without an outline, e.g. the space glyph
    pub length: u32,
}

/// The [loca table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6loca.html):
/// `num_glyphs + 1` offsets into the glyf table, the last one being a
/// sentinel marking the end of the final glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationIndex {
    pub format: LocaFormat,
    offsets: Vec<u32>,
}

impl LocationIndex {
    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
        format: i16,
        num_glyphs: u16,
    ) -> Result<Self, TableEncodingError> {
        let format = LocaFormat::try_from(format)?;
        let mut cursor = FontCursor::at(data, record.offset as usize)?;

        let count = usize::from(num_glyphs) + 1;
        let entry_size = match format {
            LocaFormat::Short => 2,
            LocaFormat::Long => 4,
        };
        cursor.ensure(count * entry_size)?;

        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = match format {
                LocaFormat::Short => u32::from(cursor.read_u16()?) * 2,
                LocaFormat::Long => cursor.read_u32()?,
            };
            offsets.push(offset);
        }

        if offsets.windows(2).any(|pair| pair[1] < pair[0]) {
            warn!("loca offsets are not monotonically increasing, treating those glyphs as empty");
        }

        Ok(Self { format, offsets })
    }

    #[cfg(test)]
    pub(crate) fn from_offsets(format: LocaFormat, offsets: Vec<u32>) -> Self {
        Self { format, offsets }
    }

    /// Number of glyphs covered, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns where the record of `glyph_index` lives, or `None` when the
    /// index is past the last glyph.
    pub fn entry(&self, glyph_index: u16) -> Option<LocaEntry> {
        let i = usize::from(glyph_index);
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        Some(LocaEntry {
            glyph_index,
            offset: start,
            length: end.saturating_sub(start),
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = LocaEntry> + '_ {
        (0..self.len()).filter_map(|i| self.entry(i as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Tag;

    fn record(len: usize) -> TableRecord {
        TableRecord {
            tag: Tag::LOCA,
            checksum: 0,
            offset: 0,
            length: len as u32,
        }
    }

    #[test]
    fn short_offsets_are_doubled() {
        let data = [0, 0, 0, 10, 0, 10, 0, 16];
        let loca = LocationIndex::from_record(&data, &record(data.len()), 0, 3).unwrap();
        assert_eq!(loca.len(), 3);
        let entries: Vec<_> = loca.entries().collect();
        assert_eq!(
            entries,
            vec![
                LocaEntry { glyph_index: 0, offset: 0, length: 20 },
                LocaEntry { glyph_index: 1, offset: 20, length: 0 },
                LocaEntry { glyph_index: 2, offset: 20, length: 12 },
            ]
        );
        assert_eq!(loca.entry(3), None);
    }

    #[test]
    fn long_offsets() {
        let data = [0, 0, 0, 0, 0, 1, 0, 0];
        let loca = LocationIndex::from_record(&data, &record(data.len()), 1, 1).unwrap();
        assert_eq!(loca.format, LocaFormat::Long);
        assert_eq!(loca.entry(0).unwrap().length, 0x10000);
    }

    #[test]
    fn invalid_format() {
        let data = [0; 8];
        assert_eq!(
            LocationIndex::from_record(&data, &record(data.len()), 2, 1),
            Err(TableEncodingError::InvalidLocaFormat(2))
        );
    }

    #[test]
    fn declared_glyph_count_beyond_buffer() {
        let data = [0; 8];
        assert!(matches!(
            LocationIndex::from_record(&data, &record(data.len()), 1, 1000),
            Err(TableEncodingError::Cursor(_))
        ));
    }
}
