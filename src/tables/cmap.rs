//! The [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html),
//! mapping character codes to glyph indices.
//!
//! Every encoding subtable is decoded eagerly into a sorted code → glyph
//! map. Formats 8 and 14 are recognised but produce no mappings.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{buffer::FontCursor, options::FontOptions};

use super::{TableEncodingError, TableRecord, Tag};

/// Sub-encoding labels of the Unicode platform (0), indexed by encoding id.
const UNICODE_ENCODINGS: [&str; 7] = [
    "Unicode 1.0",
    "Unicode 1.1",
    "ISO/IEC 10646",
    "Unicode 2.0 BMP",
    "Unicode 2.0 full repertoire",
    "Unicode variation sequences",
    "Unicode full repertoire",
];

/// Sub-encoding labels of the Windows platform (3).
const WINDOWS_ENCODINGS: [(u16, &str); 7] = [
    (0, "Windows Symbol"),
    (1, "Windows Unicode BMP"),
    (2, "Windows Shift-JIS"),
    (3, "Windows PRC"),
    (4, "Windows Big5"),
    (5, "Windows Wansung"),
    (10, "Windows Unicode full repertoire"),
];

const MAC_ENCODING: &str = "Mac";
const UNKNOWN_ENCODING: &str = "Unknown";
const IDENTITY_ENCODING: &str = "Synthetic identity";

/// Highest code point covered by the synthetic identity subtable.
const IDENTITY_LAST_CODE: u32 = 256;

/// Translates a platform/encoding pair to a human readable label.
///
/// Platform 2 (deprecated ISO) and anything above 3 are rejected.
pub fn encoding_label(
    platform_id: u16,
    encoding_id: u16,
) -> Result<&'static str, TableEncodingError> {
    match platform_id {
        0 => Ok(UNICODE_ENCODINGS
            .get(usize::from(encoding_id))
            .copied()
            .unwrap_or(UNKNOWN_ENCODING)),
        1 => Ok(MAC_ENCODING),
        3 => Ok(WINDOWS_ENCODINGS
            .iter()
            .find(|(id, _)| *id == encoding_id)
            .map_or(UNKNOWN_ENCODING, |&(_, label)| label)),
        _ => Err(TableEncodingError::UnrecognisedCMapEncoding {
            platform_id,
            encoding_id,
        }),
    }
}

/// The subtable formats this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmapFormat {
    /// Format 0: 256 single byte glyph indices
    ByteEncoding,
    /// Format 2: high-byte mapping through subheaders
    HighByteMapping,
    /// Format 4: segment mapping to delta values
    SegmentMapping,
    /// Format 6: trimmed table mapping
    TrimmedTable,
    /// Format 8: mixed 16-bit and 32-bit coverage, not decoded
    MixedCoverage,
    /// Format 10: trimmed array
    TrimmedArray,
    /// Format 12: segmented coverage
    SegmentedCoverage,
    /// Format 13: many-to-one range mappings
    ManyToOneRange,
    /// Format 14: Unicode variation sequences, not decoded
    UnicodeVariationSequences,
}

impl CmapFormat {
    pub fn number(self) -> u16 {
        match self {
            Self::ByteEncoding => 0,
            Self::HighByteMapping => 2,
            Self::SegmentMapping => 4,
            Self::TrimmedTable => 6,
            Self::MixedCoverage => 8,
            Self::TrimmedArray => 10,
            Self::SegmentedCoverage => 12,
            Self::ManyToOneRange => 13,
            Self::UnicodeVariationSequences => 14,
        }
    }
}

impl TryFrom<u16> for CmapFormat {
    type Error = TableEncodingError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::ByteEncoding,
            2 => Self::HighByteMapping,
            4 => Self::SegmentMapping,
            6 => Self::TrimmedTable,
            8 => Self::MixedCoverage,
            10 => Self::TrimmedArray,
            12 => Self::SegmentedCoverage,
            13 => Self::ManyToOneRange,
            14 => Self::UnicodeVariationSequences,
            _ => return Err(TableEncodingError::UnknownCMapFormat(value)),
        })
    }
}

/// One decoded encoding subtable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapSubtable {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub label: &'static str,
    /// `None` for the synthetic identity subtable
    pub format: Option<CmapFormat>,
    /// Macintosh language code, 0 when language independent
    pub language: u32,
    mapping: BTreeMap<u32, u32>,
}

impl CmapSubtable {
    /// The subtable used when a font has no cmap at all: code points
    /// 0 through 256 inclusive map to the glyph with the same index.
    pub fn identity() -> Self {
        Self {
            platform_id: 0,
            encoding_id: 3,
            label: IDENTITY_ENCODING,
            format: None,
            language: 0,
            mapping: (0..=IDENTITY_LAST_CODE).map(|code| (code, code)).collect(),
        }
    }

    pub fn lookup(&self, code_point: u32) -> Option<u32> {
        self.mapping.get(&code_point).copied()
    }

    /// Every (code point, glyph index) pair in code point order.
    pub fn mappings(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.mapping.iter().map(|(&code, &glyph)| (code, glyph))
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// The decoded cmap table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmap {
    pub version: u16,
    subtables: Vec<CmapSubtable>,
}

impl Cmap {
    /// A cmap holding only the synthetic identity subtable.
    pub fn identity() -> Self {
        Self {
            version: 0,
            subtables: vec![CmapSubtable::identity()],
        }
    }

    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
        options: &FontOptions,
    ) -> Result<Self, TableEncodingError> {
        let table = record.data(data)?;
        let mut cursor = FontCursor::new(table);

        let version = cursor.read_u16()?;
        if version != 0 {
            return Err(TableEncodingError::ReservedFieldViolation {
                table: Tag::CMAP,
                field: "version",
                value: u32::from(version),
            });
        }

        let num_tables = cursor.read_u16()?;
        cursor.ensure(usize::from(num_tables) * 8)?;

        let mut subtables = Vec::with_capacity(usize::from(num_tables));
        for _ in 0..num_tables {
            let platform_id = cursor.read_u16()?;
            let encoding_id = cursor.read_u16()?;
            let offset = cursor.read_u32()?;
            let label = encoding_label(platform_id, encoding_id)?;

            let subtable_cursor = FontCursor::at(table, offset as usize)?;
            let subtable =
                decode_subtable(subtable_cursor, platform_id, encoding_id, label, options)?;
            debug!(
                "cmap subtable {platform_id}/{encoding_id} ({label}), format {}: {} mappings",
                subtable.format.map_or(0, CmapFormat::number),
                subtable.len()
            );
            subtables.push(subtable);
        }

        Ok(Self { version, subtables })
    }

    pub fn subtables(&self) -> &[CmapSubtable] {
        &self.subtables
    }

    /// Picks the subtable best suited for Unicode lookups: the Windows
    /// full repertoire table, then Windows BMP, then the Unicode platform,
    /// then whatever comes first.
    pub fn preferred(&self) -> Option<&CmapSubtable> {
        let rank = |s: &CmapSubtable| match (s.platform_id, s.encoding_id) {
            (3, 10) => 0,
            (3, 1) => 1,
            (0, _) => 2,
            _ => 3,
        };
        self.subtables
            .iter()
            .filter(|s| !s.is_empty())
            .min_by_key(|&s| rank(s))
            .or_else(|| self.subtables.first())
    }
}

/// Reads the format tag at `cursor` and runs the matching decoder.
fn decode_subtable(
    mut cursor: FontCursor<'_>,
    platform_id: u16,
    encoding_id: u16,
    label: &'static str,
    options: &FontOptions,
) -> Result<CmapSubtable, TableEncodingError> {
    let format = CmapFormat::try_from(cursor.read_u16()?)?;
    let mut mapping = BTreeMap::new();

    let language = match format {
        CmapFormat::ByteEncoding => decode_format_0(&mut cursor, &mut mapping)?,
        CmapFormat::HighByteMapping => decode_format_2(&mut cursor, &mut mapping)?,
        CmapFormat::SegmentMapping => decode_format_4(&mut cursor, &mut mapping)?,
        CmapFormat::TrimmedTable => decode_format_6(&mut cursor, &mut mapping)?,
        CmapFormat::MixedCoverage => skip_format_8(&mut cursor)?,
        CmapFormat::TrimmedArray => decode_format_10(&mut cursor, &mut mapping, options)?,
        CmapFormat::SegmentedCoverage | CmapFormat::ManyToOneRange => {
            decode_segmented_coverage(&mut cursor, &mut mapping, format, options)?
        }
        CmapFormat::UnicodeVariationSequences => skip_format_14(&mut cursor)?,
    };

    Ok(CmapSubtable {
        platform_id,
        encoding_id,
        label,
        format: Some(format),
        language,
        mapping,
    })
}

/// Reads the reserved u16 that follows the format of the 32-bit formats.
fn read_reserved(cursor: &mut FontCursor<'_>) -> Result<(), TableEncodingError> {
    let reserved = cursor.read_u16()?;
    if reserved != 0 {
        return Err(TableEncodingError::ReservedFieldViolation {
            table: Tag::CMAP,
            field: "reserved",
            value: u32::from(reserved),
        });
    }
    Ok(())
}

/// Reads a u16 glyph index at `position` and applies `id_delta`, as used by
/// the indirect lookups of formats 2 and 4.
fn read_glyph_at(data: &[u8], position: usize, id_delta: i16) -> Result<u32, TableEncodingError> {
    let glyph = FontCursor::at(data, position)?.read_u16()?;
    Ok(apply_delta(u32::from(glyph), id_delta))
}

/// Adds a signed delta modulo 65536.
fn apply_delta(value: u32, id_delta: i16) -> u32 {
    (value as i32 + i32::from(id_delta)).rem_euclid(0x10000) as u32
}

fn decode_format_0(
    cursor: &mut FontCursor<'_>,
    mapping: &mut BTreeMap<u32, u32>,
) -> Result<u32, TableEncodingError> {
    let _length = cursor.read_u16()?;
    let language = cursor.read_u16()?;
    let glyphs = cursor.read_bytes(256)?;
    mapping.extend((0u32..).zip(glyphs.iter().map(|&g| u32::from(g))));
    Ok(u32::from(language))
}

fn decode_format_2(
    cursor: &mut FontCursor<'_>,
    mapping: &mut BTreeMap<u32, u32>,
) -> Result<u32, TableEncodingError> {
    let _length = cursor.read_u16()?;
    let language = cursor.read_u16()?;

    let mut keys = [0u16; 256];
    for key in &mut keys {
        *key = cursor.read_u16()? / 8;
    }
    let subheaders_start = cursor.position();
    let data = cursor.data();

    for (high_byte, &key) in (0u32..).zip(keys.iter()) {
        let mut subheader = FontCursor::at(data, subheaders_start + usize::from(key) * 8)?;
        let first_code = u32::from(subheader.read_u16()?);
        let entry_count = u32::from(subheader.read_u16()?);
        let id_delta = subheader.read_i16()?;
        let range_offset_position = subheader.position();
        let id_range_offset = usize::from(subheader.read_u16()?);

        if key == 0 {
            // Subheader 0 maps single byte codes: the high byte is the
            // whole character code.
            let Some(j) = high_byte.checked_sub(first_code).filter(|&j| j < entry_count) else {
                continue;
            };
            let position = range_offset_position + id_range_offset + 2 * j as usize;
            mapping.insert(high_byte, read_glyph_at(data, position, id_delta)?);
            continue;
        }

        for j in 0..entry_count {
            let low_byte = first_code + j;
            if low_byte > 0xFF {
                break;
            }
            let position = range_offset_position + id_range_offset + 2 * j as usize;
            let glyph = read_glyph_at(data, position, id_delta)?;
            mapping.insert((high_byte << 8) | low_byte, glyph);
        }
    }

    Ok(u32::from(language))
}

fn decode_format_4(
    cursor: &mut FontCursor<'_>,
    mapping: &mut BTreeMap<u32, u32>,
) -> Result<u32, TableEncodingError> {
    let _length = cursor.read_u16()?;
    let language = cursor.read_u16()?;
    let seg_count = usize::from(cursor.read_u16()? / 2);
    // searchRange, entrySelector, rangeShift
    cursor.skip(6)?;
    cursor.ensure(seg_count * 8 + 2)?;

    let mut end_codes = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        end_codes.push(cursor.read_u16()?);
    }

    let reserved_pad = cursor.read_u16()?;
    if reserved_pad != 0 {
        return Err(TableEncodingError::ReservedFieldViolation {
            table: Tag::CMAP,
            field: "reservedPad",
            value: u32::from(reserved_pad),
        });
    }

    let mut start_codes = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        start_codes.push(cursor.read_u16()?);
    }
    let mut id_deltas = Vec::with_capacity(seg_count);
    for _ in 0..seg_count {
        id_deltas.push(cursor.read_i16()?);
    }

    let data = cursor.data();
    let mut previous_end: Option<u16> = None;
    for i in 0..seg_count {
        let range_offset_position = cursor.position();
        let id_range_offset = usize::from(cursor.read_u16()?);
        let (start, end, id_delta) = (start_codes[i], end_codes[i], id_deltas[i]);

        if end == 0xFFFF {
            break;
        }
        if start > end || previous_end.is_some_and(|previous| start <= previous) {
            warn!("skipping malformed cmap format 4 segment {start:#06x}..={end:#06x}");
            continue;
        }
        previous_end = Some(end);

        for code in start..=end {
            let code = u32::from(code);
            if id_range_offset == 0 {
                mapping.insert(code, apply_delta(code, id_delta));
                continue;
            }
            let position =
                range_offset_position + id_range_offset + 2 * (code - u32::from(start)) as usize;
            mapping.insert(code, read_glyph_at(data, position, id_delta)?);
        }
    }

    Ok(u32::from(language))
}

fn decode_format_6(
    cursor: &mut FontCursor<'_>,
    mapping: &mut BTreeMap<u32, u32>,
) -> Result<u32, TableEncodingError> {
    let _length = cursor.read_u16()?;
    let language = cursor.read_u16()?;
    let first_code = u32::from(cursor.read_u16()?);
    let entry_count = cursor.read_u16()?;
    cursor.ensure(usize::from(entry_count) * 2)?;

    for i in 0..u32::from(entry_count) {
        mapping.insert(first_code + i, u32::from(cursor.read_u16()?));
    }
    Ok(u32::from(language))
}

/// Format 8 is not decoded. The header and groups are consumed so that a
/// truncated subtable still fails, and the subtable stays empty.
fn skip_format_8(cursor: &mut FontCursor<'_>) -> Result<u32, TableEncodingError> {
    read_reserved(cursor)?;
    let _length = cursor.read_u32()?;
    let language = cursor.read_u32()?;
    // is32 bitmap
    cursor.skip(8192)?;
    let num_groups = cursor.read_u32()? as usize;
    cursor.skip(num_groups.saturating_mul(12))?;
    warn!("cmap format 8 (mixed 16/32-bit coverage) is not supported, subtable left empty");
    Ok(language)
}

fn decode_format_10(
    cursor: &mut FontCursor<'_>,
    mapping: &mut BTreeMap<u32, u32>,
    options: &FontOptions,
) -> Result<u32, TableEncodingError> {
    read_reserved(cursor)?;
    let _length = cursor.read_u32()?;
    let language = cursor.read_u32()?;
    let start_char = cursor.read_u32()?;
    let num_chars = cursor.read_u32()?;
    cursor.ensure((num_chars as usize).saturating_mul(4))?;

    for i in 0..num_chars {
        let glyph = cursor.read_u32()?;
        match start_char.checked_add(i) {
            Some(code) if code <= options.max_code_point => {
                mapping.insert(code, glyph);
            }
            _ => {
                warn!(
                    "cmap format 10 runs past code point {:#x}, truncating",
                    options.max_code_point
                );
                break;
            }
        }
    }
    Ok(language)
}

/// Formats 12 and 13 share a group layout. Format 12 maps each code in a
/// group to consecutive glyphs, format 13 maps the whole group to one.
fn decode_segmented_coverage(
    cursor: &mut FontCursor<'_>,
    mapping: &mut BTreeMap<u32, u32>,
    format: CmapFormat,
    options: &FontOptions,
) -> Result<u32, TableEncodingError> {
    read_reserved(cursor)?;
    let _length = cursor.read_u32()?;
    let language = cursor.read_u32()?;
    let num_groups = cursor.read_u32()?;
    cursor.ensure((num_groups as usize).saturating_mul(12))?;

    // Groups must be sorted and disjoint. Clamping every group to start
    // after the previous one keeps the total work bounded by
    // `max_code_point`.
    let mut next_code = 0u32;
    for _ in 0..num_groups {
        let start = cursor.read_u32()?;
        let end = cursor.read_u32()?;
        let start_glyph = cursor.read_u32()?;

        if start > end {
            warn!("skipping inverted cmap group {start:#x}..={end:#x}");
            continue;
        }
        if start > options.max_code_point {
            warn!("skipping cmap group {start:#x}..={end:#x} beyond the code point limit");
            continue;
        }
        let end = end.min(options.max_code_point);
        let first = start.max(next_code);
        if first > end {
            warn!("skipping overlapping cmap group {start:#x}..={end:#x}");
            continue;
        }

        for code in first..=end {
            let glyph = match format {
                CmapFormat::ManyToOneRange => start_glyph,
                _ => match start_glyph.checked_add(code - start) {
                    Some(glyph) => glyph,
                    None => break,
                },
            };
            mapping.insert(code, glyph);
        }
        next_code = end.saturating_add(1);
    }
    Ok(language)
}

/// Format 14 only refines other subtables and is not decoded.
fn skip_format_14(cursor: &mut FontCursor<'_>) -> Result<u32, TableEncodingError> {
    let _length = cursor.read_u32()?;
    let num_records = cursor.read_u32()?;
    debug!("ignoring cmap format 14 with {num_records} variation selector records");
    Ok(0)
}
