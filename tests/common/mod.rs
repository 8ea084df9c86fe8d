#![allow(dead_code)]

//! Assembles small synthetic TrueType fonts for the integration tests.

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lays tables out after the directory, each on a four byte boundary, with
/// correct checksums.
#[derive(Default)]
pub struct FontBuilder {
    tables: Vec<([u8; 4], Vec<u8>)>,
}

impl FontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table. Tables are stored in the order they are added.
    pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.tables.push((*tag, data));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let num_tables = self.tables.len() as u16;
        let mut font = vec![0x00, 0x01, 0x00, 0x00];
        font.extend_from_slice(&num_tables.to_be_bytes());
        font.extend_from_slice(&[0; 6]);

        let mut offset = 12 + 16 * self.tables.len();
        let mut body = Vec::new();
        for (tag, data) in &self.tables {
            font.extend_from_slice(tag);
            font.extend_from_slice(&checksum(data).to_be_bytes());
            font.extend_from_slice(&(offset as u32).to_be_bytes());
            font.extend_from_slice(&(data.len() as u32).to_be_bytes());

            body.extend_from_slice(data);
            let padding = (4 - data.len() % 4) % 4;
            body.extend(std::iter::repeat_n(0, padding));
            offset += data.len() + padding;
        }
        font.extend_from_slice(&body);
        font
    }

    /// Byte offset at which the table with `tag` starts in the built font.
    pub fn offset_of(&self, tag: &[u8; 4]) -> Option<usize> {
        let mut offset = 12 + 16 * self.tables.len();
        for (table_tag, data) in &self.tables {
            if table_tag == tag {
                return Some(offset);
            }
            offset += data.len().div_ceil(4) * 4;
        }
        None
    }
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

pub fn head(index_to_loc_format: i16) -> Vec<u8> {
    let mut data = Vec::with_capacity(54);
    data.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    data.extend_from_slice(&0x0001_8000u32.to_be_bytes()); // revision 1.5
    data.extend_from_slice(&0u32.to_be_bytes()); // checksum adjustment
    data.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    data.extend_from_slice(&0x000Bu16.to_be_bytes()); // flags
    data.extend_from_slice(&1000u16.to_be_bytes()); // units per em
    data.extend_from_slice(&[0; 16]); // created, modified
    for value in [0i16, 0, 100, 100] {
        data.extend_from_slice(&value.to_be_bytes());
    }
    data.extend_from_slice(&[0, 0, 0, 8]); // mac style, lowest rec ppem
    data.extend_from_slice(&2i16.to_be_bytes());
    data.extend_from_slice(&index_to_loc_format.to_be_bytes());
    data.extend_from_slice(&0i16.to_be_bytes());
    data
}

pub fn maxp(num_glyphs: u16) -> Vec<u8> {
    let mut data = 0x0001_0000u32.to_be_bytes().to_vec();
    data.extend_from_slice(&num_glyphs.to_be_bytes());
    data.extend_from_slice(&[0; 26]);
    data
}

/// A version 3.0 post table: no glyph names beyond `.notdef`.
pub fn post_v3() -> Vec<u8> {
    let mut data = 0x0003_0000u32.to_be_bytes().to_vec();
    data.extend_from_slice(&[0; 28]);
    data
}

/// Builds a long-format loca and the glyf table it indexes.
pub fn loca_and_glyf(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
    let mut loca = 0u32.to_be_bytes().to_vec();
    let mut glyf = Vec::new();
    for glyph in glyphs {
        glyf.extend_from_slice(glyph);
        loca.extend_from_slice(&(glyf.len() as u32).to_be_bytes());
    }
    (loca, glyf)
}

/// A square simple glyph with its corner at the origin.
pub fn square(size: u8) -> Vec<u8> {
    let mut data = vec![0, 1];
    for value in [0u16, 0, u16::from(size), u16::from(size)] {
        data.extend_from_slice(&value.to_be_bytes());
    }
    // one contour ending at point 3, no instructions
    data.extend_from_slice(&[0, 3, 0, 0]);
    data.extend_from_slice(&[0x31, 0x33, 0x35, 0x23]);
    data.extend_from_slice(&[size, size, size]);
    data
}

/// A simple glyph whose single contour is an on/off/on arch.
pub fn arch() -> Vec<u8> {
    let mut data = vec![0, 1, 0, 0, 0, 0, 0, 20, 0, 10];
    data.extend_from_slice(&[0, 2, 0, 0]);
    // (0,0) on, (10,10) off, (20,0) on
    data.extend_from_slice(&[0x31, 0x36, 0x17]);
    data.extend_from_slice(&[10, 10, 10, 10]);
    data
}

/// A compound glyph of byte-offset components `(glyph, dx, dy)`.
pub fn compound(components: &[(u16, i8, i8)]) -> Vec<u8> {
    let mut data = vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
    for (i, &(glyph, dx, dy)) in components.iter().enumerate() {
        let more = if i + 1 < components.len() { 0x20 } else { 0 };
        data.extend_from_slice(&[0, 0x02 | more]);
        data.extend_from_slice(&glyph.to_be_bytes());
        data.extend_from_slice(&[dx as u8, dy as u8]);
    }
    data
}

/// A cmap with one Windows BMP format 4 subtable mapping `start..=end`
/// onto consecutive glyphs beginning at `glyph`.
pub fn cmap_format_4(start: u16, end: u16, glyph: u16) -> Vec<u8> {
    let id_delta = glyph.wrapping_sub(start);
    let mut subtable = Vec::new();
    for value in [4u16, 32, 0, 4, 4, 1, 0] {
        subtable.extend_from_slice(&value.to_be_bytes());
    }
    for value in [end, 0xFFFF, 0, start, 0xFFFF, id_delta, 1, 0, 0] {
        subtable.extend_from_slice(&value.to_be_bytes());
    }

    let mut data = Vec::new();
    for value in [0u16, 1, 3, 1] {
        data.extend_from_slice(&value.to_be_bytes());
    }
    data.extend_from_slice(&12u32.to_be_bytes());
    data.extend_from_slice(&subtable);
    data
}

/// head, maxp, loca and glyf for `glyphs`, ready for more tables.
pub fn outline_font(glyphs: &[Vec<u8>]) -> FontBuilder {
    let (loca, glyf) = loca_and_glyf(glyphs);
    FontBuilder::new()
        .table(b"head", head(1))
        .table(b"maxp", maxp(glyphs.len() as u16))
        .table(b"loca", loca)
        .table(b"glyf", glyf)
}
