use crate::buffer::FontCursor;

use super::{TableEncodingError, TableRecord};

/// Represents the [name table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6name.html)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    /// The format of the name table
    pub format: TableFormat,

    /// Offset in bytes from the start of the table to the string storage
    pub string_offset: u16,

    /// The name records, each carrying its own string bytes
    records: Vec<NameRecord>,
}

impl Name {
    /// Well known name identifiers.
    pub const COPYRIGHT: u16 = 0;
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;

    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
    ) -> Result<Self, TableEncodingError> {
        let table = record.data(data)?;
        let mut cursor = FontCursor::new(table);

        let format = TableFormat::from(cursor.read_u16()?);
        let count = cursor.read_u16()?;
        let string_offset = cursor.read_u16()?;

        // a name record is 12 bytes
        cursor.ensure(usize::from(count) * 12)?;
        let mut records = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            records.push(NameRecord::from_cursor(&mut cursor, table, string_offset)?);
        }

        Ok(Self {
            format,
            string_offset,
            records,
        })
    }

    pub fn records(&self) -> &[NameRecord] {
        &self.records
    }

    /// Returns the decoded string for `name_id`, preferring Windows, then
    /// Unicode, then Macintosh records.
    pub fn get(&self, name_id: u16) -> Option<String> {
        [PlatformId::Microsoft, PlatformId::Unicode, PlatformId::Macintosh]
            .into_iter()
            .find_map(|platform| {
                self.records
                    .iter()
                    .find(|r| r.name_id == name_id && r.platform_id == platform)
            })
            .map(NameRecord::to_string_lossy)
    }
}

/// Represents a name record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    /// Platform identifier code.
    pub platform_id: PlatformId,

    /// Platform-specific encoding identifier
    pub platform_specific_id: PlatformSpecificId,

    /// Language identifier
    /// not enumed because there are literally DOZENS
    pub language_id: u16,

    /// Name identifier
    pub name_id: u16,

    /// The raw string bytes, located at `tableStart + stringOffset + offset`
    pub bytes: Vec<u8>,
}

impl NameRecord {
    fn from_cursor(
        cursor: &mut FontCursor<'_>,
        table: &[u8],
        string_offset: u16,
    ) -> Result<Self, TableEncodingError> {
        let platform_id = PlatformId::from(cursor.read_u16()?);
        let platform_specific_id = PlatformSpecificId::from(cursor.read_u16()?);
        let language_id = cursor.read_u16()?;
        let name_id = cursor.read_u16()?;
        let length = cursor.read_u16()?;
        let offset = cursor.read_u16()?;

        let start = usize::from(string_offset) + usize::from(offset);
        let bytes = FontCursor::at(table, start)?
            .read_bytes(usize::from(length))?
            .to_vec();

        Ok(Self {
            platform_id,
            platform_specific_id,
            language_id,
            name_id,
            bytes,
        })
    }

    /// Decodes the string: UTF-16BE for the Unicode and Microsoft
    /// platforms, one byte per character otherwise.
    pub fn to_string_lossy(&self) -> String {
        match self.platform_id {
            PlatformId::Unicode | PlatformId::Microsoft => {
                let units: Vec<u16> = self
                    .bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            _ => self.bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Represents the platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformId {
    Unicode,
    Macintosh,
    Reserved,
    Microsoft,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Reserved,
            3 => Self::Microsoft,
            _ => Self::Unknown(value),
        }
    }
}

/// Represents the platform-specific identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSpecificId {
    Version1,
    Version1_1,
    Iso10646,
    Unicode2_0Bmp,
    Unicode2_0NonBmp,
    Unknown(u16),
}

impl From<u16> for PlatformSpecificId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Version1,
            1 => Self::Version1_1,
            2 => Self::Iso10646,
            3 => Self::Unicode2_0Bmp,
            4 => Self::Unicode2_0NonBmp,
            _ => Self::Unknown(value),
        }
    }
}

/// Represents a table format
/// the name table can have 2 formats
/// 0 => TrueType
/// 1 => OpenType (which is not supported on Apple platforms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    TrueType,
    OpenType,
    Unknown(u16),
}

impl From<u16> for TableFormat {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::TrueType,
            1 => Self::OpenType,
            _ => Self::Unknown(value),
        }
    }
}
