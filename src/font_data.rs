//! Top-level font file representation and table directory resolution.
//!
//! A font file is one of three containers: a bare `sfnt`, a `ttcf` collection of `sfnt`s that
//! share table data, or a WOFF file whose tables must be unpacked into a synthetic `sfnt` before
//! any table can be found.

use std::fmt;

use crate::binary::read::{ReadBinary, ReadCtxt, ReadScope};
use crate::error::{FontError, ParseError};
use crate::tables::{OffsetTable, TTCHeader, CFF_MAGIC, TTCF_MAGIC, TTF_MAGIC};
use crate::tag::{self, DisplayTag};
use crate::woff::{self, WoffFont};
use crate::SafeFrom;

/// The container a font file was delivered in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Container {
    /// A single `sfnt` with the given version tag.
    Sfnt(u32),
    /// A TrueType collection.
    Collection,
    /// A WOFF file. `flavor` is the version tag of the wrapped font.
    Woff { flavor: u32 },
}

/// Type that can represent any of the supported font formats.
pub enum FontData<'a> {
    Sfnt(OffsetTable<'a>),
    Collection(TTCHeader<'a>),
    Woff(WoffFont<'a>),
}

/// The table directory of one font in a file.
#[derive(Clone)]
pub struct Directory<'a> {
    /// Index of the font within a collection, zero otherwise.
    pub index: usize,
    /// Offset of the directory from the start of the file.
    pub offset: usize,
    pub offset_table: OffsetTable<'a>,
}

impl<'a> fmt::Debug for Directory<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("index", &self.index)
            .field("offset", &self.offset)
            .field("sfnt_version", &DisplayTag(self.offset_table.sfnt_version))
            .field("num_tables", &self.offset_table.table_records.len())
            .finish()
    }
}

impl ReadBinary for FontData<'_> {
    type HostType<'a> = FontData<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let mut peek = ctxt.clone();
        let magic = peek.read_u32be()?;
        match magic {
            TTF_MAGIC | CFF_MAGIC | tag::TRUE => {
                Ok(FontData::Sfnt(ctxt.read::<OffsetTable<'_>>()?))
            }
            TTCF_MAGIC => Ok(FontData::Collection(ctxt.read::<TTCHeader<'_>>()?)),
            woff::MAGIC => Ok(FontData::Woff(ctxt.read::<WoffFont<'_>>()?)),
            tag::WOF2 => Err(ParseError::UnsupportedFormat(tag::WOF2)),
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl Container {
    /// Identify the container from the leading four byte tag of `data`.
    pub fn detect(data: &[u8]) -> Result<Container, FontError> {
        let magic = ReadScope::new(data)
            .ctxt()
            .read_u32be()
            .map_err(|_| FontError::Directory {
                offset: 0,
                expected: "a four byte font file tag",
                actual: format!("{} bytes", data.len()),
            })?;
        match magic {
            TTF_MAGIC | CFF_MAGIC | tag::TRUE => Ok(Container::Sfnt(magic)),
            TTCF_MAGIC => Ok(Container::Collection),
            woff::MAGIC => {
                let flavor = ReadScope::new(data.get(4..).unwrap_or_default())
                    .ctxt()
                    .read_u32be()
                    .map_err(|_| FontError::Directory {
                        offset: 4,
                        expected: "WOFF header",
                        actual: format!("{} bytes", data.len()),
                    })?;
                Ok(Container::Woff { flavor })
            }
            tag::WOF2 => Err(FontError::Parse(ParseError::UnsupportedFormat(tag::WOF2))),
            _ => Err(FontError::Directory {
                offset: 0,
                expected: "'ttcf', 'wOFF', 'OTTO', 'true' or 0x00010000 tag",
                actual: format!("'{}'", DisplayTag(magic)),
            }),
        }
    }
}

/// Resolve the table directories of the `sfnt` or collection in `scope`.
///
/// A WOFF file must be unpacked with [WoffFont::to_sfnt] first.
pub fn directories(scope: ReadScope<'_>) -> Result<Vec<Directory<'_>>, FontError> {
    let font_data = scope
        .read::<FontData<'_>>()
        .map_err(|err| directory_error(0, "sfnt table directory or collection header", err))?;
    match font_data {
        FontData::Sfnt(offset_table) => Ok(vec![Directory {
            index: 0,
            offset: 0,
            offset_table,
        }]),
        FontData::Collection(ttc_header) => ttc_header
            .offset_tables
            .iter()
            .enumerate()
            .map(|(index, offset)| {
                let offset = usize::safe_from(offset);
                if offset >= scope.data().len() {
                    return Err(FontError::Directory {
                        offset,
                        expected: "sfnt table directory of a collection member",
                        actual: format!("offset past end of {} byte file", scope.data().len()),
                    });
                }
                let offset_table = scope
                    .offset(offset)
                    .read::<OffsetTable<'_>>()
                    .map_err(|err| {
                        directory_error(offset, "sfnt table directory of a collection member", err)
                    })?;
                Ok(Directory {
                    index,
                    offset,
                    offset_table,
                })
            })
            .collect(),
        FontData::Woff(_) => Err(FontError::Directory {
            offset: 0,
            expected: "sfnt table directory or collection header",
            actual: String::from("unconverted WOFF file"),
        }),
    }
}

/// Locate the table `tag` in `directory`, as an `(offset, length)` pair.
pub fn find_table(directory: &Directory<'_>, tag: u32) -> Option<(usize, usize)> {
    directory
        .offset_table
        .find_table_record(tag)
        .map(|record| (usize::safe_from(record.offset), usize::safe_from(record.length)))
}

fn directory_error(offset: usize, expected: &'static str, err: ParseError) -> FontError {
    match err {
        ParseError::UnsupportedFormat(_) => FontError::Parse(err),
        _ => FontError::Directory {
            offset,
            expected,
            actual: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{collection, sfnt, truetype_tables, TRUETYPE_VERSION};

    #[test]
    fn detect_containers() {
        assert_eq!(
            Container::detect(&[0, 1, 0, 0, 0, 0]),
            Ok(Container::Sfnt(TTF_MAGIC))
        );
        assert_eq!(Container::detect(b"OTTO"), Ok(Container::Sfnt(CFF_MAGIC)));
        assert_eq!(Container::detect(b"ttcf"), Ok(Container::Collection));
        assert_eq!(
            Container::detect(b"wOFF\x00\x01\x00\x00"),
            Ok(Container::Woff { flavor: TTF_MAGIC })
        );
        assert_eq!(
            Container::detect(b"wOF2"),
            Err(FontError::Parse(ParseError::UnsupportedFormat(tag::WOF2)))
        );
        match Container::detect(b"GIF8") {
            Err(FontError::Directory { offset, actual, .. }) => {
                assert_eq!(offset, 0);
                assert_eq!(actual, "'GIF8'");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            Container::detect(b"ab"),
            Err(FontError::Directory { .. })
        ));
    }

    #[test]
    fn single_directory() {
        let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
        let directories = directories(ReadScope::new(&data)).unwrap();
        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0].offset, 0);
        let (offset, length) = find_table(&directories[0], tag::HEAD).unwrap();
        assert_eq!(length, 54);
        assert_eq!(&data[offset + 12..offset + 16], &[0x5F, 0x0F, 0x3C, 0xF5]);
        assert_eq!(find_table(&directories[0], tag::FVAR), None);
    }

    #[test]
    fn collection_directories() {
        let regular = truetype_tables("Test", "Regular", 400);
        let bold = truetype_tables("Test", "Bold", 700);
        let data = collection(&[(TRUETYPE_VERSION, &regular[..]), (TRUETYPE_VERSION, &bold[..])]);
        let directories = directories(ReadScope::new(&data)).unwrap();
        assert_eq!(directories.len(), 2);
        assert_eq!(directories[1].index, 1);
        // Identical glyph data is stored once
        assert_eq!(
            find_table(&directories[0], tag::GLYF),
            find_table(&directories[1], tag::GLYF)
        );
        assert_ne!(
            find_table(&directories[0], tag::NAME),
            find_table(&directories[1], tag::NAME)
        );
    }

    #[test]
    fn truncated_directory() {
        let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test", "Regular", 400));
        match directories(ReadScope::new(&data[..40])) {
            Err(FontError::Directory {
                offset, expected, ..
            }) => {
                assert_eq!(offset, 0);
                assert_eq!(expected, "sfnt table directory or collection header");
            }
            other => panic!("unexpected {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn collection_member_past_end() {
        let mut data = b"ttcf".to_vec();
        data.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0x10, 0]);
        match directories(ReadScope::new(&data)) {
            Err(FontError::Directory { offset, .. }) => assert_eq!(offset, 0x1000),
            other => panic!("unexpected {:?}", other.map(|d| d.len())),
        }
    }
}
