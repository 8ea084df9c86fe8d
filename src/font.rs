use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};

use crate::FontError;
use crate::buffer::FontCursor;
use crate::options::FontOptions;
use crate::tables::cmap::{Cmap, CmapSubtable};
use crate::tables::glyf::{Glyph, GlyphCache, GlyphDecoder, GlyphError};
use crate::tables::head::Head;
use crate::tables::loca::LocationIndex;
use crate::tables::maxp::Maxp;
use crate::tables::name::Name;
use crate::tables::os2::Os2;
use crate::tables::post::Post;
use crate::tables::{TableDirectory, Tag};

/// A parsed TrueType font.
///
/// The directory, the metadata tables and every cmap subtable are decoded
/// when the font is built. Glyph outlines are decoded on first request and
/// kept for the lifetime of the font.
///
/// ```no_run
/// use vero_outline::Font;
///
/// let bytes = std::fs::read("DejaVuSans.ttf")?;
/// let font = Font::from_bytes(bytes)?;
/// if let Some(glyph) = font.glyph_for_code_point('A' as u32)? {
///     println!("{} contours", glyph.contours().len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Font {
    data: Vec<u8>,
    options: FontOptions,
    directory: TableDirectory,
    head: Head,
    maxp: Maxp,
    loca: LocationIndex,
    cmap: Cmap,
    post: Option<Post>,
    name: Option<Name>,
    os2: Option<Os2>,
    glyphs: Mutex<GlyphCache>,
}

impl Font {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self, FontError> {
        Self::from_bytes_with_options(data, FontOptions::default())
    }

    /// Parses the table directory and every table needed up front.
    ///
    /// `head` is read first so that a font with a bad magic number is
    /// rejected before anything else is decoded.
    pub fn from_bytes_with_options(
        data: impl Into<Vec<u8>>,
        options: FontOptions,
    ) -> Result<Self, FontError> {
        let data = data.into();
        let directory = TableDirectory::from_cursor(&mut FontCursor::new(&data))?;

        let head = Head::from_record(&data, directory.require(Tag::HEAD)?)?;

        if options.verify_checksums {
            let mismatched = directory.verify_checksums(&data);
            if !mismatched.is_empty() {
                debug!("{} tables failed checksum verification", mismatched.len());
            }
        }

        let maxp = Maxp::from_record(&data, directory.require(Tag::MAXP)?)?;
        let loca = LocationIndex::from_record(
            &data,
            directory.require(Tag::LOCA)?,
            head.index_to_loc_format,
            maxp.num_glyphs,
        )?;

        let cmap = match directory.record(Tag::CMAP) {
            Some(record) => Cmap::from_record(&data, record, &options)?,
            None => {
                debug!("no cmap table, using the identity mapping");
                Cmap::identity()
            }
        };

        let post = directory
            .record(Tag::POST)
            .map(|record| Post::from_record(&data, record))
            .transpose()?;
        let name = directory
            .record(Tag::NAME)
            .map(|record| Name::from_record(&data, record))
            .transpose()?;
        let os2 = directory
            .record(Tag::OS2)
            .map(|record| Os2::from_record(&data, record))
            .transpose()?;

        Ok(Self {
            data,
            options,
            directory,
            head,
            maxp,
            loca,
            cmap,
            post,
            name,
            os2,
            glyphs: Mutex::new(GlyphCache::new()),
        })
    }

    /// Tags of every table in the font, in sorted order.
    pub fn tables(&self) -> impl Iterator<Item = Tag> + '_ {
        self.directory.tags()
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    pub fn options(&self) -> &FontOptions {
        &self.options
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn maxp(&self) -> &Maxp {
        &self.maxp
    }

    pub fn loca(&self) -> &LocationIndex {
        &self.loca
    }

    pub fn cmap(&self) -> &Cmap {
        &self.cmap
    }

    /// Every cmap subtable, or the single identity subtable when the font
    /// has no cmap.
    pub fn cmaps(&self) -> &[CmapSubtable] {
        self.cmap.subtables()
    }

    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    pub fn name(&self) -> Option<&Name> {
        self.name.as_ref()
    }

    pub fn os2(&self) -> Option<&Os2> {
        self.os2.as_ref()
    }

    pub fn num_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    /// Resolves a glyph to its outline.
    ///
    /// The cache lock is held for the whole resolution, so concurrent
    /// callers never decode the same glyph twice. A failure only affects
    /// the glyph being resolved; other glyphs can still be requested.
    pub fn glyph(&self, glyph_index: u16) -> Result<Arc<Glyph>, GlyphError> {
        let num_glyphs = self.num_glyphs();
        if glyph_index >= num_glyphs {
            return Err(GlyphError::GlyphOutOfRange {
                index: glyph_index,
                num_glyphs,
            });
        }

        let record = self
            .directory
            .record(Tag::GLYF)
            .ok_or(GlyphError::MissingTable(Tag::GLYF))?;
        let glyf = FontCursor::at(&self.data, record.offset as usize)?
            .read_bytes(record.length as usize)?;
        let decoder = GlyphDecoder::new(glyf, &self.loca, self.options.max_component_depth);

        let mut cache = self.glyphs.lock().unwrap_or_else(PoisonError::into_inner);
        decoder.resolve(&mut cache, glyph_index)
    }

    /// The PostScript name of a glyph, when the font has a post table that
    /// names it.
    pub fn glyph_name(&self, glyph_index: u16) -> Option<&str> {
        self.post.as_ref()?.glyph_name(glyph_index)
    }

    /// Maps a code point through the preferred cmap subtable and resolves
    /// the glyph. Returns `Ok(None)` for unmapped code points.
    pub fn glyph_for_code_point(
        &self,
        code_point: u32,
    ) -> Result<Option<Arc<Glyph>>, GlyphError> {
        let Some(glyph_id) = self
            .cmap
            .preferred()
            .and_then(|subtable| subtable.lookup(code_point))
        else {
            return Ok(None);
        };
        match u16::try_from(glyph_id) {
            Ok(glyph_index) => self.glyph(glyph_index).map(Some),
            Err(_) => {
                warn!("code point {code_point:#x} maps to glyph {glyph_id}, past the u16 range");
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("len", &self.data.len())
            .field("tables", &self.directory.tags().collect::<Vec<_>>())
            .field("num_glyphs", &self.num_glyphs())
            .field("cmap_subtables", &self.cmaps().len())
            .finish_non_exhaustive()
    }
}
