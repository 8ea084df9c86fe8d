/// Settings that control how a font is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontOptions {
    /// Recompute every table checksum at construction and log mismatches.
    /// A mismatch never fails parsing.
    pub verify_checksums: bool,

    /// How deeply compound glyphs may nest before resolution fails.
    pub max_component_depth: u16,

    /// The highest code point the 32-bit cmap formats (10, 12 and 13) will
    /// materialise. Ranges beyond it are clamped.
    pub max_code_point: u32,
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            max_component_depth: 64,
            max_code_point: 0x10_FFFF,
        }
    }
}
