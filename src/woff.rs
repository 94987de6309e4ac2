//! Reading of the WOFF font format.
//!
//! A WOFF file is unpacked into an `sfnt` with an `OTTO` version tag so that the rest of the crate
//! only ever deals with `sfnt` table directories.

use std::convert::TryFrom;
use std::io::Read;

use flate2::bufread::ZlibDecoder;
use log::debug;

use crate::binary::read::{ReadArray, ReadBinary, ReadBuf, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{long_align, U16Be, U32Be};
use crate::error::{FontError, ParseError, WriteError};
use crate::{size, tag};

/// The magic number identifying a WOFF file: 'wOFF'
pub const MAGIC: u32 = tag::WOFF;

#[derive(Clone)]
pub struct WoffFont<'a> {
    pub scope: ReadScope<'a>,
    pub woff_header: WoffHeader,
    pub table_directory: ReadArray<'a, TableDirectoryEntry>,
}

#[derive(Clone, Debug)]
pub struct WoffHeader {
    pub flavor: u32,
    pub length: u32,
    pub num_tables: u16,
    pub total_sfnt_size: u32,
    pub meta_offset: u32,
    pub meta_length: u32,
    pub meta_orig_length: u32,
    pub priv_offset: u32,
    pub priv_length: u32,
}

#[derive(Debug, Clone)]
pub struct TableDirectoryEntry {
    pub tag: u32,
    pub offset: u32,
    pub comp_length: u32,
    pub orig_length: u32,
    pub orig_checksum: u32,
}

impl<'a> WoffFont<'a> {
    /// The "sfnt version" of the input font
    pub fn flavor(&self) -> u32 {
        self.woff_header.flavor
    }

    /// Decompress and return the extended metadata XML if present
    pub fn extended_metadata(&self) -> Result<Option<String>, ParseError> {
        let offset = usize::try_from(self.woff_header.meta_offset)?;
        let length = usize::try_from(self.woff_header.meta_length)?;
        if offset == 0 || length == 0 {
            return Ok(None);
        }

        let compressed_metadata = self.scope.offset_length(offset, length)?;
        let mut z = ZlibDecoder::new(compressed_metadata.data());
        let mut metadata = String::new();
        z.read_to_string(&mut metadata)
            .map_err(|_err| ParseError::CompressionError)?;

        Ok(Some(metadata))
    }

    /// Find the table directory entry for the given `tag`
    pub fn find_table_directory_entry(&self, tag: u32) -> Option<TableDirectoryEntry> {
        self.table_directory
            .iter()
            .find(|table_entry| table_entry.tag == tag)
    }

    /// Unpack the tables into an `sfnt` tagged `OTTO`.
    ///
    /// Table records keep the WOFF order and checksums. Table data is placed after the
    /// directory, each table padded to a multiple of four bytes.
    pub fn to_sfnt(&self) -> Result<Vec<u8>, FontError> {
        let tables = self
            .table_directory
            .iter()
            .map(|entry| {
                let data = entry.read_table(&self.scope)?;
                Ok((entry, data))
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        let num_tables = self.woff_header.num_tables;
        let directory_len = size::SFNT_HEADER + usize::from(num_tables) * size::TABLE_RECORD;
        let mut buffer = WriteBuffer::with_capacity(
            usize::try_from(self.woff_header.total_sfnt_size)
                .unwrap_or(0)
                .max(directory_len),
        );

        let (search_range, entry_selector, range_shift) = search_params(num_tables);
        U32Be::write(&mut buffer, tag::OTTO)?;
        U16Be::write(&mut buffer, num_tables)?;
        U16Be::write(&mut buffer, search_range)?;
        U16Be::write(&mut buffer, entry_selector)?;
        U16Be::write(&mut buffer, range_shift)?;

        let mut offset = directory_len;
        for (entry, data) in &tables {
            U32Be::write(&mut buffer, entry.tag)?;
            U32Be::write(&mut buffer, entry.orig_checksum)?;
            U32Be::write(&mut buffer, u32::try_from(offset).map_err(WriteError::from)?)?;
            U32Be::write(&mut buffer, entry.orig_length)?;
            offset += long_align(data.data().len());
        }
        for (_entry, data) in &tables {
            buffer.write_bytes(data.data())?;
            buffer.pad_to_long()?;
        }

        debug!("unpacked WOFF with {} tables", num_tables);
        Ok(buffer.into_inner())
    }
}

/// `searchRange`, `entrySelector` and `rangeShift` for a table directory of `num_tables`.
fn search_params(num_tables: u16) -> (u16, u16, u16) {
    if num_tables == 0 {
        return (0, 0, 0);
    }
    // NOTE(cast): ilog2 of a u16 is at most 15
    let entry_selector = (u16::BITS - 1 - num_tables.leading_zeros()) as u16;
    let search_range = (1u16 << entry_selector).wrapping_mul(16);
    let range_shift = num_tables.wrapping_mul(16).wrapping_sub(search_range);
    (search_range, entry_selector, range_shift)
}

impl ReadBinary for WoffFont<'_> {
    type HostType<'a> = WoffFont<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let woff_header = ctxt.read::<WoffHeader>()?;
        let table_directory =
            ctxt.read_array::<TableDirectoryEntry>(usize::from(woff_header.num_tables))?;
        Ok(WoffFont {
            scope,
            woff_header,
            table_directory,
        })
    }
}

impl ReadBinary for WoffHeader {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let signature = ctxt.read_u32be()?;
        match signature {
            MAGIC => {
                let flavor = ctxt.read_u32be()?;
                let length = ctxt.read_u32be()?;
                let num_tables = ctxt.read_u16be()?;
                let reserved = ctxt.read_u16be()?;
                // A non-zero reserved field marks an invalid file
                ctxt.check(reserved == 0)?;
                let total_sfnt_size = ctxt.read_u32be()?;
                let _major_version = ctxt.read_u16be()?;
                let _minor_version = ctxt.read_u16be()?;
                let meta_offset = ctxt.read_u32be()?;
                let meta_length = ctxt.read_u32be()?;
                let meta_orig_length = ctxt.read_u32be()?;
                let priv_offset = ctxt.read_u32be()?;
                let priv_length = ctxt.read_u32be()?;

                Ok(WoffHeader {
                    flavor,
                    length,
                    num_tables,
                    total_sfnt_size,
                    meta_offset,
                    meta_length,
                    meta_orig_length,
                    priv_offset,
                    priv_length,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl ReadFrom for TableDirectoryEntry {
    type ReadType = ((U32Be, U32Be, U32Be), (U32Be, U32Be));
    fn read_from(
        ((tag, offset, comp_length), (orig_length, orig_checksum)): ((u32, u32, u32), (u32, u32)),
    ) -> Self {
        TableDirectoryEntry {
            tag,
            offset,
            comp_length,
            orig_length,
            orig_checksum,
        }
    }
}

impl TableDirectoryEntry {
    fn is_compressed(&self) -> bool {
        self.comp_length < self.orig_length
    }

    /// Read and uncompress the contents of a table entry
    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadBuf<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.comp_length)?;
        let table_data = scope.offset_length(offset, length)?;

        if self.is_compressed() {
            let mut z = ZlibDecoder::new(table_data.data());
            let mut uncompressed = Vec::with_capacity(usize::try_from(self.orig_length)?);
            z.read_to_end(&mut uncompressed)
                .map_err(|_err| ParseError::CompressionError)?;
            if uncompressed.len() != usize::try_from(self.orig_length)? {
                return Err(ParseError::CompressionError);
            }

            Ok(ReadBuf::from(uncompressed))
        } else {
            Ok(ReadBuf::from(table_data.data()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::OffsetTable;
    use crate::tests::woff_from_tables;

    #[test]
    fn search_params_for_table_counts() {
        assert_eq!(search_params(1), (16, 0, 0));
        assert_eq!(search_params(9), (128, 3, 16));
        assert_eq!(search_params(16), (256, 4, 0));
    }

    #[test]
    fn unpack_to_sfnt() {
        let head = vec![7u8; 54];
        let name = b"name ".repeat(40);
        let woff = woff_from_tables(&[(tag::HEAD, head.clone()), (tag::NAME, name.clone())]);

        let font = ReadScope::new(&woff).read::<WoffFont<'_>>().unwrap();
        assert_eq!(font.woff_header.num_tables, 2);
        let compressed = font.find_table_directory_entry(tag::NAME).unwrap();
        assert!(compressed.comp_length < compressed.orig_length);
        assert_eq!(font.extended_metadata(), Ok(None));

        let sfnt = font.to_sfnt().unwrap();
        let scope = ReadScope::new(&sfnt);
        let offset_table = scope.read::<OffsetTable<'_>>().unwrap();
        assert_eq!(offset_table.sfnt_version, tag::OTTO);
        assert_eq!(offset_table.search_range, 32);
        let head_scope = offset_table.read_table(&scope, tag::HEAD).unwrap().unwrap();
        assert_eq!(head_scope.data(), &head[..]);
        let name_scope = offset_table.read_table(&scope, tag::NAME).unwrap().unwrap();
        assert_eq!(name_scope.data(), &name[..]);
        assert_eq!(sfnt.len() % 4, 0);
    }

    #[test]
    fn reserved_field_must_be_zero() {
        let mut woff = woff_from_tables(&[(tag::HEAD, vec![0; 54])]);
        woff[15] = 1;
        assert_eq!(
            ReadScope::new(&woff).read::<WoffFont<'_>>().err(),
            Some(ParseError::BadValue)
        );
    }
}
