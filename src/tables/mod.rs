use std::{collections::BTreeMap, fmt};

use log::{debug, warn};
use thiserror::Error;

use crate::buffer::{CursorError, FontCursor};

pub mod cmap;
pub mod glyf;
pub mod head;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod post;
mod post_names;

/// A four byte table identifier such as `b"glyf"`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const CMAP: Tag = Tag(*b"cmap");
    pub const GLYF: Tag = Tag(*b"glyf");
    pub const HEAD: Tag = Tag(*b"head");
    pub const LOCA: Tag = Tag(*b"loca");
    pub const MAXP: Tag = Tag(*b"maxp");
    pub const NAME: Tag = Tag(*b"name");
    pub const OS2: Tag = Tag(*b"OS/2");
    pub const POST: Tag = Tag(*b"post");

    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    fn read(cursor: &mut FontCursor<'_>) -> Result<Self, CursorError> {
        let bytes = cursor.read_bytes(4)?;
        Ok(Self([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

/// Represents the error messages which may occur when trying
/// to parse tables from raw binary buffers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableEncodingError {
    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("The required table '{0}' is missing from the table directory")]
    MissingTable(Tag),

    #[error("The head table magic number is {0:#010x}, expected 0x5f0f3cf5")]
    InvalidMagicNumber(u32),

    #[error("Unknown loca format {0}, expected 0 (short) or 1 (long)")]
    InvalidLocaFormat(i16),

    #[error("Unrecognised cmap encoding: platform {platform_id}, encoding {encoding_id}")]
    UnrecognisedCMapEncoding { platform_id: u16, encoding_id: u16 },

    #[error("Unknown cmap subtable format {0}")]
    UnknownCMapFormat(u16),

    #[error("Unsupported post table version {0:#010x}")]
    UnsupportedPostVersion(u32),

    #[error("Reserved field '{field}' of the {table} table must be zero, got {value}")]
    ReservedFieldViolation {
        table: Tag,
        field: &'static str,
        value: u32,
    },
}

/// Represents the offset subtable directory and it's metadata
/// providing us with important info such as the number of tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTable {
    pub scaler_type: u32,
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl OffsetTable {
    /// Size of the offset subtable in bytes.
    pub const SIZE: usize = 12;

    pub fn from_cursor(cursor: &mut FontCursor<'_>) -> Result<Self, TableEncodingError> {
        Ok(Self {
            scaler_type: cursor.read_u32()?,
            num_tables: cursor.read_u16()?,
            search_range: cursor.read_u16()?,
            entry_selector: cursor.read_u16()?,
            range_shift: cursor.read_u16()?,
        })
    }

    /// Returns the number of tables exists in the font file
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }
}

/// Represents one entry of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    /// The checksum of the table. This value can be used to verify the
    /// integrity of the table data.
    pub checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the font.
    pub offset: u32,
    /// The length of this table in bytes, not including any padding.
    pub length: u32,
}

impl TableRecord {
    /// Size of one directory entry in bytes.
    pub const SIZE: usize = 16;

    fn from_cursor(cursor: &mut FontCursor<'_>) -> Result<Self, TableEncodingError> {
        Ok(Self {
            tag: Tag::read(cursor)?,
            checksum: cursor.read_u32()?,
            offset: cursor.read_u32()?,
            length: cursor.read_u32()?,
        })
    }

    /// Returns the bytes of this table inside `data`.
    pub fn data<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], TableEncodingError> {
        let mut cursor = FontCursor::at(data, self.offset as usize)?;
        Ok(cursor.read_bytes(self.length as usize)?)
    }

    /// Sums the table as big-endian 32-bit words over `ceil(length / 4)`
    /// words. A final partial word is zero padded.
    ///
    /// Returns `None` when the table runs past the end of `data`.
    pub fn compute_checksum(&self, data: &[u8]) -> Option<u32> {
        let start = self.offset as usize;
        let end = start.checked_add(self.length as usize)?;
        let table = data.get(start..end)?;

        let sum = table.chunks(4).fold(0u32, |sum, chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            sum.wrapping_add(u32::from_be_bytes(word))
        });
        Some(sum)
    }
}

/// The parsed table directory: the offset subtable and every table record,
/// keyed by tag.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    pub offset_table: OffsetTable,
    records: BTreeMap<Tag, TableRecord>,
}

impl TableDirectory {
    /// Parses the offset subtable and the table records that follow it.
    ///
    /// On a duplicate tag the last record wins.
    pub fn from_cursor(cursor: &mut FontCursor<'_>) -> Result<Self, TableEncodingError> {
        let offset_table = OffsetTable::from_cursor(cursor)?;

        cursor.ensure(usize::from(offset_table.num_tables) * TableRecord::SIZE)?;

        let mut records = BTreeMap::new();
        for _ in 0..offset_table.num_tables {
            let record = TableRecord::from_cursor(cursor)?;
            debug!(
                "table '{}' at offset {} ({} bytes)",
                record.tag, record.offset, record.length
            );
            if records.insert(record.tag, record).is_some() {
                warn!("duplicate table record '{}', keeping the last", record.tag);
            }
        }

        Ok(Self {
            offset_table,
            records,
        })
    }

    /// Recomputes every table checksum and logs mismatches.
    ///
    /// The `head` table is skipped because its `checksumAdjustment` field
    /// takes part in its own sum. Returns the tags whose checksum did not
    /// match; a mismatch never fails parsing.
    pub fn verify_checksums(&self, data: &[u8]) -> Vec<Tag> {
        let mut mismatched = Vec::new();
        for record in self.records.values().filter(|r| r.tag != Tag::HEAD) {
            match record.compute_checksum(data) {
                Some(sum) if sum == record.checksum => {}
                Some(sum) => {
                    warn!(
                        "checksum mismatch for table '{}': stored {:#010x}, computed {:#010x}",
                        record.tag, record.checksum, sum
                    );
                    mismatched.push(record.tag);
                }
                None => {
                    warn!(
                        "table '{}' runs past the end of the font, checksum not verified",
                        record.tag
                    );
                    mismatched.push(record.tag);
                }
            }
        }
        mismatched
    }

    /// Returns the offset of the table with the given tag.
    pub fn locate(&self, tag: Tag) -> Option<u32> {
        self.records.get(&tag).map(|record| record.offset)
    }

    pub fn exists(&self, tag: Tag) -> bool {
        self.records.contains_key(&tag)
    }

    pub fn record(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.get(&tag)
    }

    /// Returns the record for `tag` or a `MissingTable` error.
    pub fn require(&self, tag: Tag) -> Result<&TableRecord, TableEncodingError> {
        self.record(tag).ok_or(TableEncodingError::MissingTable(tag))
    }

    /// Tags of every table present, in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.records.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &TableRecord> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_bytes(records: &[(&[u8; 4], u32, u32, u32)]) -> Vec<u8> {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.extend_from_slice(&(records.len() as u16).to_be_bytes());
        data.extend_from_slice(&[0; 6]);
        for (tag, checksum, offset, length) in records {
            data.extend_from_slice(*tag);
            data.extend_from_slice(&checksum.to_be_bytes());
            data.extend_from_slice(&offset.to_be_bytes());
            data.extend_from_slice(&length.to_be_bytes());
        }
        data
    }

    #[test]
    fn locate_agrees_with_records() {
        let data = directory_bytes(&[(b"cmap", 0, 100, 20), (b"glyf", 0, 200, 40)]);
        let directory = TableDirectory::from_cursor(&mut FontCursor::new(&data)).unwrap();

        assert_eq!(directory.offset_table.num_tables(), 2);
        for record in directory.records() {
            assert_eq!(directory.locate(record.tag), Some(record.offset));
            assert!(directory.exists(record.tag));
        }
        assert_eq!(directory.locate(Tag::CMAP), Some(100));
        assert_eq!(directory.locate(Tag::LOCA), None);
        assert!(!directory.exists(Tag::LOCA));
        assert_eq!(
            directory.require(Tag::HEAD).unwrap_err(),
            TableEncodingError::MissingTable(Tag::HEAD)
        );
    }

    #[test]
    fn duplicate_tag_keeps_last_record() {
        let data = directory_bytes(&[(b"post", 0, 10, 4), (b"post", 0, 30, 4)]);
        let directory = TableDirectory::from_cursor(&mut FontCursor::new(&data)).unwrap();
        assert_eq!(directory.locate(Tag::POST), Some(30));
        assert_eq!(directory.tags().count(), 1);
    }

    #[test]
    fn oversized_table_count_is_rejected_before_allocation() {
        let mut data = directory_bytes(&[]);
        data[4..6].copy_from_slice(&0xFFFFu16.to_be_bytes());
        assert_eq!(
            TableDirectory::from_cursor(&mut FontCursor::new(&data)).unwrap_err(),
            TableEncodingError::Cursor(CursorError::InsufficientData {
                position: 12,
                needed: 0xFFFF * 16,
                remaining: 0,
            })
        );
    }

    #[test]
    fn checksum_mismatch_is_reported_not_fatal() {
        // One 6 byte table at offset 44, padded to 8 bytes.
        let mut data = directory_bytes(&[
            (b"name", 0x0102_0304 + 0x0506_0000, 44, 6),
            (b"maxp", 1, 44, 6),
        ]);
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 0, 0]);
        let directory = TableDirectory::from_cursor(&mut FontCursor::new(&data)).unwrap();

        assert_eq!(
            directory.record(Tag::NAME).unwrap().compute_checksum(&data),
            Some(0x0608_0304)
        );
        assert_eq!(directory.verify_checksums(&data), vec![Tag::MAXP]);
    }

    #[test]
    fn tag_display() {
        assert_eq!(Tag::OS2.to_string(), "OS/2");
        assert_eq!(Tag::new(b"cvt ").to_string(), "cvt ");
    }
}
