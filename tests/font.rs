mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use vero_outline::buffer::CursorError;
use vero_outline::tables::TableEncodingError;
use vero_outline::tables::glyf::GlyphError;
use vero_outline::{Font, FontError, FontOptions, Tag};

use common::{arch, cmap_format_4, compound, init_logging, outline_font, post_v3, square};

fn coords(glyph: &vero_outline::Glyph) -> Vec<Vec<(f64, f64)>> {
    glyph
        .contours()
        .iter()
        .map(|contour| contour.points().map(|p| (p.x, p.y)).collect())
        .collect()
}

#[test]
fn directory_lookups_agree() {
    init_logging();
    let font = Font::from_bytes(outline_font(&[square(10)]).build()).unwrap();

    let tags: Vec<Tag> = font.tables().collect();
    assert_eq!(tags, vec![Tag::GLYF, Tag::HEAD, Tag::LOCA, Tag::MAXP]);
    for record in font.directory().records() {
        assert_eq!(font.directory().locate(record.tag), Some(record.offset));
        assert!(font.directory().exists(record.tag));
    }
    assert!(!font.directory().exists(Tag::CMAP));
    assert_eq!(font.head().units_per_em, 1000);
    assert_eq!(font.num_glyphs(), 1);
}

#[test]
fn missing_cmap_gives_identity_mapping() {
    init_logging();
    let font = Font::from_bytes(outline_font(&[square(10)]).build()).unwrap();

    let cmaps = font.cmaps();
    assert_eq!(cmaps.len(), 1);
    let identity = &cmaps[0];
    assert_eq!(identity.len(), 257);
    for code in 0..=256 {
        assert_eq!(identity.lookup(code), Some(code));
    }
    assert_eq!(identity.lookup(257), None);
}

#[test]
fn bad_magic_fails_before_other_tables() {
    init_logging();
    let builder = outline_font(&[square(10)]);
    let mut data = builder.build();
    let head = builder.offset_of(b"head").unwrap();
    data[head + 12..head + 16].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
    // a loca that could never be read
    let loca = builder.offset_of(b"loca").unwrap();
    data.truncate(loca);

    assert_eq!(
        Font::from_bytes(data).unwrap_err(),
        FontError::Table(TableEncodingError::InvalidMagicNumber(0xDEAD_BEEF))
    );
}

#[test]
fn truncated_header_is_insufficient_data() {
    init_logging();
    let builder = outline_font(&[square(10)]);
    let data = builder.build();
    let head_end = builder.offset_of(b"head").unwrap() + 54;

    for len in 0..head_end {
        let err = Font::from_bytes(&data[..len]).unwrap_err();
        assert!(
            matches!(err.cursor_error(), Some(CursorError::InsufficientData { .. })),
            "prefix of {len} bytes gave {err:?}"
        );
    }
}

#[test]
fn missing_required_table() {
    init_logging();
    let data = common::FontBuilder::new()
        .table(b"head", common::head(0))
        .build();
    assert_eq!(
        Font::from_bytes(data).unwrap_err(),
        FontError::Table(TableEncodingError::MissingTable(Tag::MAXP))
    );
}

#[test]
fn checksum_mismatch_is_not_fatal() {
    init_logging();
    let mut data = outline_font(&[square(10)]).build();
    // records follow insertion order, so glyf is the fourth; corrupt its
    // stored checksum
    data[12 + 3 * 16 + 4..12 + 3 * 16 + 8].copy_from_slice(&[0xFF; 4]);

    let font = Font::from_bytes(data.clone()).unwrap();
    assert_eq!(font.directory().verify_checksums(&data), vec![Tag::GLYF]);
}

#[test]
fn empty_glyph_resolves_to_one_empty_contour() {
    init_logging();
    let font = Font::from_bytes(outline_font(&[Vec::new(), square(10), Vec::new()]).build())
        .unwrap();

    for index in [0, 2] {
        let glyph = font.glyph(index).unwrap();
        assert_eq!(glyph.number_of_contours(), 0);
        assert_eq!(glyph.contours().len(), 1);
        assert!(glyph.contours()[0].is_empty());
    }
}

#[test]
fn square_keeps_its_corners() {
    init_logging();
    let font = Font::from_bytes(outline_font(&[square(100)]).build()).unwrap();

    let glyph = font.glyph(0).unwrap();
    assert_eq!(glyph.number_of_contours(), 1);
    assert_eq!(
        coords(&glyph),
        vec![vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]]
    );
    assert!(glyph.contours()[0].on_curve().iter().all(|&on| on));
}

#[test]
fn arch_is_tessellated() {
    init_logging();
    let font = Font::from_bytes(outline_font(&[arch()]).build()).unwrap();

    let glyph = font.glyph(0).unwrap();
    assert_eq!(glyph.points().len(), 3);
    let contour = &glyph.contours()[0];
    assert_eq!(contour.len(), 11);
    assert_eq!(contour.point(5).map(|p| (p.x, p.y)), Some((10.0, 5.0)));
}

#[test]
fn compound_resolution_is_deterministic() {
    init_logging();
    let glyphs = [square(10), arch(), compound(&[(0, 0, 0), (1, 30, -5)])];
    let first = Font::from_bytes(outline_font(&glyphs).build()).unwrap();
    let second = Font::from_bytes(outline_font(&glyphs).build()).unwrap();

    let a = first.glyph(2).unwrap();
    let b = second.glyph(2).unwrap();
    assert_eq!(a.number_of_contours(), -1);
    assert_eq!(a.contours().len(), 2);
    assert_eq!(coords(&a), coords(&b));
    assert_eq!(a.contours()[1].point(0).map(|p| (p.x, p.y)), Some((30.0, -5.0)));

    // the second request is served from the cache
    assert!(Arc::ptr_eq(&a, &first.glyph(2).unwrap()));
}

#[test]
fn nested_compound_keeps_first_contour_of_each_component() {
    init_logging();
    let glyphs = [
        square(10),
        compound(&[(0, 0, 0), (0, 20, 0)]),
        compound(&[(1, 5, 0), (0, 0, 40)]),
    ];
    let font = Font::from_bytes(outline_font(&glyphs).build()).unwrap();

    assert_eq!(font.glyph(1).unwrap().contours().len(), 2);
    let glyph = font.glyph(2).unwrap();
    assert_eq!(
        coords(&glyph),
        vec![
            vec![(5.0, 0.0), (15.0, 0.0), (15.0, 10.0), (5.0, 10.0)],
            vec![(0.0, 40.0), (10.0, 40.0), (10.0, 50.0), (0.0, 50.0)],
        ]
    );
}

#[test]
fn cyclic_compound_fails_without_poisoning_other_glyphs() {
    init_logging();
    let glyphs = [square(10), compound(&[(2, 0, 0)]), compound(&[(1, 0, 0)])];
    let font = Font::from_bytes(outline_font(&glyphs).build()).unwrap();

    assert_eq!(font.glyph(1).unwrap_err(), GlyphError::CyclicComponent(1));
    assert_eq!(font.glyph(0).unwrap().number_of_contours(), 1);
    // a failed glyph can be requested again and fails the same way
    assert_eq!(font.glyph(2).unwrap_err(), GlyphError::CyclicComponent(2));
}

#[test]
fn component_depth_is_limited_by_options() {
    init_logging();
    let glyphs = [square(10), compound(&[(0, 0, 0)]), compound(&[(1, 0, 0)])];
    let options = FontOptions {
        max_component_depth: 1,
        ..FontOptions::default()
    };
    let font = Font::from_bytes_with_options(outline_font(&glyphs).build(), options).unwrap();

    assert_eq!(
        font.glyph(2).unwrap_err(),
        GlyphError::ComponentDepthExceeded {
            glyph_index: 0,
            limit: 1,
        }
    );
    assert!(font.glyph(1).is_ok());
}

#[test]
fn glyph_index_out_of_range() {
    init_logging();
    let font = Font::from_bytes(outline_font(&[square(10)]).build()).unwrap();
    assert_eq!(
        font.glyph(1).unwrap_err(),
        GlyphError::GlyphOutOfRange {
            index: 1,
            num_glyphs: 1,
        }
    );
}

#[test]
fn code_point_to_outline() {
    init_logging();
    let data = outline_font(&[Vec::new(), square(50)])
        .table(b"cmap", cmap_format_4(0x41, 0x41, 1))
        .table(b"post", post_v3())
        .build();
    let font = Font::from_bytes(data).unwrap();

    let subtable = &font.cmaps()[0];
    assert_eq!((subtable.platform_id, subtable.encoding_id), (3, 1));
    assert_eq!(subtable.lookup(0x41), Some(1));

    let glyph = font.glyph_for_code_point('A' as u32).unwrap().unwrap();
    assert_eq!(glyph.bbox().x_max, 50);
    assert!(font.glyph_for_code_point('B' as u32).unwrap().is_none());

    assert_eq!(font.glyph_name(0), Some(".notdef"));
    assert_eq!(font.glyph_name(1), None);
}

#[test]
fn glyphs_resolve_concurrently() {
    init_logging();
    let glyphs = [square(10), compound(&[(0, 0, 0), (0, 20, 0)])];
    let font = Font::from_bytes(outline_font(&glyphs).build()).unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| font.glyph(1))).collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect()
    });
    for glyph in &results {
        assert!(Arc::ptr_eq(glyph, &results[0]));
    }
}
