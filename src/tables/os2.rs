use crate::buffer::FontCursor;

use super::{TableEncodingError, TableRecord, Tag};

/// The [OS/2 table](https://learn.microsoft.com/en-us/typography/opentype/spec/os2),
/// up to and including the first/last character indices shared by every
/// table version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os2 {
    pub version: u16,
    pub x_avg_char_width: i16,
    pub weight_class: u16,
    pub width_class: u16,
    /// Embedding licensing rights (`fsType`)
    pub embedding_flags: u16,
    pub subscript_x_size: i16,
    pub subscript_y_size: i16,
    pub subscript_x_offset: i16,
    pub subscript_y_offset: i16,
    pub superscript_x_size: i16,
    pub superscript_y_size: i16,
    pub superscript_x_offset: i16,
    pub superscript_y_offset: i16,
    pub strikeout_size: i16,
    pub strikeout_position: i16,
    pub family_class: i16,
    /// PANOSE classification number
    pub panose: [u8; 10],
    pub unicode_ranges: [u32; 4],
    /// Font vendor identifier
    pub vendor_id: Tag,
    /// Style selection bitfield (`fsSelection`)
    pub selection_flags: u16,
    pub first_char_index: u16,
    pub last_char_index: u16,
}

impl Os2 {
    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
    ) -> Result<Self, TableEncodingError> {
        let mut cursor = FontCursor::at(data, record.offset as usize)?;

        let version = cursor.read_u16()?;
        let x_avg_char_width = cursor.read_i16()?;
        let weight_class = cursor.read_u16()?;
        let width_class = cursor.read_u16()?;
        let embedding_flags = cursor.read_u16()?;
        let subscript_x_size = cursor.read_i16()?;
        let subscript_y_size = cursor.read_i16()?;
        let subscript_x_offset = cursor.read_i16()?;
        let subscript_y_offset = cursor.read_i16()?;
        let superscript_x_size = cursor.read_i16()?;
        let superscript_y_size = cursor.read_i16()?;
        let superscript_x_offset = cursor.read_i16()?;
        let superscript_y_offset = cursor.read_i16()?;
        let strikeout_size = cursor.read_i16()?;
        let strikeout_position = cursor.read_i16()?;
        let family_class = cursor.read_i16()?;

        let mut panose = [0u8; 10];
        panose.copy_from_slice(cursor.read_bytes(10)?);

        let mut unicode_ranges = [0u32; 4];
        for range in &mut unicode_ranges {
            *range = cursor.read_u32()?;
        }

        let vendor = cursor.read_bytes(4)?;
        let vendor_id = Tag([vendor[0], vendor[1], vendor[2], vendor[3]]);

        Ok(Self {
            version,
            x_avg_char_width,
            weight_class,
            width_class,
            embedding_flags,
            subscript_x_size,
            subscript_y_size,
            subscript_x_offset,
            subscript_y_offset,
            superscript_x_size,
            superscript_y_size,
            superscript_x_offset,
            superscript_y_offset,
            strikeout_size,
            strikeout_position,
            family_class,
            panose,
            unicode_ranges,
            vendor_id,
            selection_flags: cursor.read_u16()?,
            first_char_index: cursor.read_u16()?,
            last_char_index: cursor.read_u16()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metrics_and_vendor() {
        let mut data = vec![0, 4, 0, 100, 1, 144, 0, 5, 0, 8];
        data.extend_from_slice(&[0; 22]);
        data.extend_from_slice(&[2, 11, 6, 4, 2, 2, 2, 2, 2, 4]);
        data.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.extend_from_slice(b"ADBE");
        data.extend_from_slice(&[0, 0x40, 0, 0x20, 0xFF, 0xFD]);

        let record = TableRecord {
            tag: Tag::OS2,
            checksum: 0,
            offset: 0,
            length: data.len() as u32,
        };
        let os2 = Os2::from_record(&data, &record).unwrap();
        assert_eq!(os2.version, 4);
        assert_eq!(os2.weight_class, 400);
        assert_eq!(os2.width_class, 5);
        assert_eq!(os2.embedding_flags, 8);
        assert_eq!(os2.panose[1], 11);
        assert_eq!(os2.unicode_ranges, [1, 0, 0, 0]);
        assert_eq!(os2.vendor_id, Tag::new(b"ADBE"));
        assert_eq!(os2.selection_flags, 0x40);
        assert_eq!(os2.first_char_index, 0x20);
        assert_eq!(os2.last_char_index, 0xFFFD);
    }
}
