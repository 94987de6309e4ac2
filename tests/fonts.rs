#[allow(dead_code)]
mod common;

use fontparse::error::{FontError, ParseError};
use fontparse::font::{FontFile, OutlineFormat};
use fontparse::font_data::Container;
use fontparse::tag;

use crate::common::{
    cff_tables, collection, sfnt, truetype_tables, woff_from_tables, woff_tables, CFF_VERSION,
    TRUETYPE_VERSION,
};

#[test]
fn regular_truetype_font() {
    let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test Sans", "Regular", 400));
    let file = FontFile::parse(&data).expect("unable to parse font");
    let fonts = file.fonts().expect("unable to decode fonts");
    assert_eq!(fonts.len(), 1);

    let font = &fonts[0];
    let os2 = font.os2().expect("no OS/2 table");
    assert_eq!(os2.us_weight_class, 400);
    assert_eq!(os2.vendor_id(), "TEST");
    let names = font.names().expect("no name table");
    assert_eq!(names.family(), Some("Test Sans"));
    assert_eq!(names.subfamily(), Some("Regular"));
    assert_eq!(names.postscript_name(), Some("TestSans-Regular"));
    assert!(!font.head().unwrap().is_bold());
}

#[test]
fn loca_covers_every_glyph() {
    let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
    let file = FontFile::parse(&data).unwrap();
    let font = &file.fonts().unwrap()[0];

    let num_glyphs = usize::from(font.maxp().unwrap().num_glyphs);
    let loca = font.loca().unwrap().expect("no loca table");
    assert_eq!(loca.len(), num_glyphs + 1);
    assert_eq!(font.glyf().unwrap().unwrap().num_glyphs(), num_glyphs);

    // Glyph 0 has an empty loca range
    assert_eq!(loca.glyph_range(0).map(|(start, end)| start == end), Some(true));
    assert!(font.glyph(0).unwrap().is_none());
    let glyph = font.glyph(1).unwrap().expect("glyph 1 has an outline");
    assert_eq!(glyph.number_of_points(), 3);
    assert!(!glyph.is_composite());
}

#[test]
fn character_mapping_and_metrics() {
    let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
    let file = FontFile::parse(&data).unwrap();
    let font = &file.fonts().unwrap()[0];
    let cmap = font.cmap().expect("no cmap table");
    assert_eq!(cmap.map_glyph('A').unwrap(), Some(1));
    assert_eq!(cmap.map_glyph('Z').unwrap(), None);
    let hmtx = font.hmtx().unwrap();
    assert_eq!(hmtx.horizontal_advance(2), Ok(600));
    assert_eq!(hmtx.left_side_bearing(2), Ok(50));
    assert!(hmtx.horizontal_advance(3).is_err());
}

#[test]
fn collection_members_share_tables() {
    let regular = truetype_tables("Test", "Regular", 400);
    let bold = truetype_tables("Test", "Bold", 700);
    let data = collection(&[(TRUETYPE_VERSION, &regular[..]), (TRUETYPE_VERSION, &bold[..])]);
    let file = FontFile::parse(&data).unwrap();
    let fonts = file.fonts().unwrap();
    assert_eq!(fonts.len(), 2);

    for font in &fonts {
        font.cmap().expect("no cmap table");
        font.os2().expect("no OS/2 table");
    }
    // cmap is shared, OS/2 differs in weight
    assert_eq!(fonts[0].decode_count(tag::CMAP), 1);
    assert_eq!(fonts[1].decode_count(tag::CMAP), 1);
    assert_eq!(fonts[0].decode_count(tag::OS_2), 1);
    assert_eq!(fonts[1].decode_count(tag::OS_2), 1);
    assert_eq!(fonts[1].os2().unwrap().us_weight_class, 700);
    assert!(fonts[1].head().unwrap().is_bold());
}

#[test]
fn cff_font() {
    let data = sfnt(CFF_VERSION, &cff_tables("Test", "Regular"));
    let file = FontFile::parse(&data).unwrap();
    assert_eq!(file.container(), Container::Sfnt(CFF_VERSION));
    let font = &file.fonts().unwrap()[0];
    assert_eq!(font.outline_format(), OutlineFormat::Cff);
    assert!(font.loca().unwrap().is_none());
    assert!(font.cff().unwrap().is_some());
}

#[test]
fn woff_font() {
    let woff = woff_from_tables(&woff_tables(&truetype_tables("Test", "Regular", 400)));
    let file = FontFile::parse(&woff).unwrap();
    assert!(matches!(file.container(), Container::Woff { .. }));
    assert_eq!(&file.data()[..4], b"OTTO");
    let font = &file.fonts().unwrap()[0];
    assert_eq!(font.os2().unwrap().us_weight_class, 400);
    assert_eq!(font.glyph(2).unwrap().unwrap().number_of_points(), 4);
}

#[test]
fn corrupt_woff_table() {
    let mut tables = woff_tables(&truetype_tables("Test", "Regular", 400));
    tables.push((tag!(b"DSIG"), vec![0; 400]));
    let mut woff = woff_from_tables(&tables);

    // Directory entry of the last table: tag, offset, compLength, origLength
    let entry = 44 + 20 * (tables.len() - 1);
    let field = |at: usize| {
        u32::from_be_bytes([woff[at], woff[at + 1], woff[at + 2], woff[at + 3]])
    };
    let offset = field(entry + 4) as usize;
    assert!(field(entry + 8) < field(entry + 12));
    for byte in &mut woff[offset + 2..offset + 6] {
        *byte ^= 0xFF;
    }

    assert_eq!(
        FontFile::parse(&woff).err(),
        Some(FontError::Parse(ParseError::CompressionError))
    );
}

#[test]
fn woff2_is_rejected() {
    let mut data = b"wOF2".to_vec();
    data.extend_from_slice(&[0; 44]);
    assert_eq!(
        FontFile::parse(&data).err(),
        Some(FontError::Parse(ParseError::UnsupportedFormat(tag::WOF2)))
    );
}

#[test]
fn truncated_directory() {
    let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
    match FontFile::parse(&data[..20]) {
        Err(FontError::Directory { offset, .. }) => assert_eq!(offset, 0),
        other => panic!("unexpected {:?}", other.map(|file| file.container())),
    }
}

#[test]
fn bad_loca_entry_fails_only_that_glyph() {
    let mut tables = truetype_tables("Test", "Regular", 400);
    for (tag, data) in tables.iter_mut() {
        if tag == b"loca" {
            // Short offsets: end of glyph 2 before its start
            data[6..8].copy_from_slice(&1u16.to_be_bytes());
        }
    }
    let data = sfnt(TRUETYPE_VERSION, &tables);
    let file = FontFile::parse(&data).unwrap();
    let fonts = file.fonts().expect("glyf is decoded per glyph");
    let font = &fonts[0];
    assert_eq!(font.glyph(1).unwrap().unwrap().number_of_points(), 3);
    let err = font.glyph(2).expect_err("glyph 2 has a reversed range");
    assert_eq!((err.tag, err.error), (tag::GLYF, ParseError::BadOffset));
}

#[test]
fn truncated_table_fails_only_that_table() {
    let mut tables = truetype_tables("Test", "Regular", 400);
    for (tag, data) in tables.iter_mut() {
        if tag == b"post" {
            data.truncate(10);
        }
    }
    let data = sfnt(TRUETYPE_VERSION, &tables);
    let file = FontFile::parse(&data).unwrap();
    let font = &file.fonts().unwrap()[0];
    assert!(font.post().is_none());
    assert!(font.names().is_some());
    assert!(font.kern().is_none());
}
