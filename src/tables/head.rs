use bitflags::bitflags;

use crate::buffer::FontCursor;

use super::{TableEncodingError, TableRecord};

bitflags! {
    /// Represents the flags field of the 'head' table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeadFlags: u16 {
        /// Bit 0: A Y value of 0 specifies the baseline.
        const Y_VALUE_ZERO_IS_BASELINE = 1 << 0;
        /// Bit 1: The x position of the left most black bit is the LSB.
        const X_POS_LEFTMOST_BLACK_BIT_LSB = 1 << 1;
        /// Bit 2: Scaled point size and actual point size will differ.
        const SCALED_POINT_SIZE_DIFFERS = 1 << 2;
        /// Bit 3: Use integer scaling instead of fractional.
        const USE_INTEGER_SCALING = 1 << 3;
        /// Bit 4: Used by the Microsoft implementation of the TrueType scaler.
        const MICROSOFT_SCALER = 1 << 4;
        /// Bit 5: The font is intended to be laid out vertically.
        const VERTICAL_LAYOUT = 1 << 5;
        /// Bit 7: The font requires layout for correct linguistic rendering.
        const REQUIRES_LINGUISTIC_LAYOUT = 1 << 7;
        /// Bit 8: An AAT font with metamorphosis effects on by default.
        const AAT_DEFAULT_METAMORPHOSIS = 1 << 8;
        /// Bit 9: The font contains strong right-to-left glyphs.
        const STRONG_RTL_GLYPHS = 1 << 9;
        /// Bit 10: The font contains Indic-style rearrangement effects.
        const INDIC_REARRANGEMENT = 1 << 10;
        /// Bit 14: The glyphs are generic symbols for code point ranges,
        /// such as in a last resort font.
        const GENERIC_SYMBOL_FONT = 1 << 14;
    }
}

/// A representation of the [head table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6head.html)
#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    /// The version of the head table
    /// it's almost guaranteed to be 1.0
    pub version: f64,

    /// Font revision set by the font author/manufacturer
    pub font_revision: f64,

    /// Check sum adjustment: 0xB1B0AFBA minus the sum of the entire font.
    /// This is why the head table never matches its own directory checksum.
    pub checksum_adjustment: u32,

    /// Magic number, always 0x5F0F3CF5
    pub magic_number: u32,

    /// The flags which guide the font rendering and processing.
    /// Undefined bits are kept.
    pub flags: HeadFlags,

    /// Units per em (ranges from 64 to 16384)
    pub units_per_em: u16,

    /// Date the font was created, in seconds since 1904-01-01
    pub created: i64,

    /// Date the font was last modified, in seconds since 1904-01-01
    pub modified: i64,

    /// The minimum x value for all glyph bounding boxes
    pub x_min: i16,

    /// The minimum y value for all glyph bounding boxes
    pub y_min: i16,

    /// The maximum x value for all glyph bounding boxes
    pub x_max: i16,

    /// The maximum y value for all glyph bounding boxes
    pub y_max: i16,

    pub mac_style: u16,

    /// Smallest readable size in pixels
    pub lowest_rec_ppem: u16,

    pub font_direction_hint: i16,

    /// Index to loc format, 0 for short offsets and 1 for long
    pub index_to_loc_format: i16,

    /// Glyph data format (0 is for the current format)
    pub glyph_data_format: i16,
}

impl Head {
    pub const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;

    /// Size of the head table in bytes.
    pub const SIZE: usize = 54;

    /// Parses the head table and checks its magic number.
    pub(crate) fn from_record(
        data: &[u8],
        record: &TableRecord,
    ) -> Result<Self, TableEncodingError> {
        let mut cursor = FontCursor::at(data, record.offset as usize)?;
        cursor.ensure(Self::SIZE)?;

        let version = cursor.read_fixed()?;
        let font_revision = cursor.read_fixed()?;
        let checksum_adjustment = cursor.read_u32()?;
        let magic_number = cursor.read_u32()?;
        if magic_number != Self::MAGIC_NUMBER {
            return Err(TableEncodingError::InvalidMagicNumber(magic_number));
        }

        Ok(Self {
            version,
            font_revision,
            checksum_adjustment,
            magic_number,
            flags: HeadFlags::from_bits_retain(cursor.read_u16()?),
            units_per_em: cursor.read_u16()?,
            created: cursor.read_long_date_time()?,
            modified: cursor.read_long_date_time()?,
            x_min: cursor.read_fword()?,
            y_min: cursor.read_fword()?,
            x_max: cursor.read_fword()?,
            y_max: cursor.read_fword()?,
            mac_style: cursor.read_u16()?,
            lowest_rec_ppem: cursor.read_u16()?,
            font_direction_hint: cursor.read_i16()?,
            index_to_loc_format: cursor.read_i16()?,
            glyph_data_format: cursor.read_i16()?,
        })
    }
}
