#![deny(missing_docs)]

//! `SVG` table parsing.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/svg>

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFixedSizeDep, ReadScope,
};
use crate::error::ParseError;
use crate::size;
use crate::SafeFrom;

/// A gzip member header with "deflate" as the compression method (RFC 1952, 2.3.1).
const GZIP_HEADER: &[u8] = &[0x1F, 0x8B, 0x08];

/// Holds the records from the `SVG` table.
#[derive(Debug)]
pub struct SvgTable<'a> {
    /// The version of the table. Only version `0` is supported.
    pub version: u16,
    /// The SVG document records, sorted by glyph id.
    pub document_records: ReadArray<'a, SvgDocumentRecord<'a>>,
}

/// One SVG document and the range of glyphs it draws.
#[derive(Debug, Clone)]
pub struct SvgDocumentRecord<'a> {
    /// The starting glyph id.
    pub start_glyph_id: u16,
    /// The end glyph id, inclusive.
    pub end_glyph_id: u16,
    /// The SVG document data, possibly gzip compressed.
    pub svg_document: &'a [u8],
}

impl<'a> SvgTable<'a> {
    /// Locate the SVG record for the supplied `glyph_id`.
    pub fn lookup_glyph(&self, glyph_id: u16) -> Result<Option<SvgDocumentRecord<'a>>, ParseError> {
        for record in self.document_records.iter_res() {
            let record = record?;
            if (record.start_glyph_id..=record.end_glyph_id).contains(&glyph_id) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// The SVG document text that draws `glyph_id`, inflated if compressed.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn document(&self, glyph_id: u16) -> Result<Option<String>, ParseError> {
        match self.lookup_glyph(glyph_id)? {
            Some(record) => {
                let data = record.data()?;
                let text = ReadScope::new(&data).ctxt().read_utf8(data.len())?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }
}

impl<'a> SvgDocumentRecord<'a> {
    /// Whether the document is gzip compressed.
    pub fn is_compressed(&self) -> bool {
        self.svg_document.starts_with(GZIP_HEADER)
    }

    /// The document bytes, inflating them if they are compressed.
    pub fn data(&self) -> Result<Cow<'a, [u8]>, ParseError> {
        if self.is_compressed() {
            let mut gz = GzDecoder::new(self.svg_document);
            let mut uncompressed = Vec::with_capacity(self.svg_document.len() * 2);
            gz.read_to_end(&mut uncompressed)
                .map_err(|_err| ParseError::CompressionError)?;
            Ok(Cow::Owned(uncompressed))
        } else {
            Ok(Cow::Borrowed(self.svg_document))
        }
    }
}

impl ReadBinary for SvgTable<'_> {
    type HostType<'a> = SvgTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let document_records_offset = usize::safe_from(ctxt.read_u32be()?);
        let _reserved = ctxt.read_u32be()?;

        // Document offsets are relative to the start of the document list
        let records_scope = scope.offset(document_records_offset);
        let mut records_ctxt = records_scope.ctxt();
        let num_records = records_ctxt.read_u16be().map(usize::from)?;
        let document_records = records_ctxt.read_array_dep(num_records, records_scope)?;

        Ok(SvgTable {
            version,
            document_records,
        })
    }
}

impl ReadBinaryDep for SvgDocumentRecord<'_> {
    type Args<'a> = ReadScope<'a>;
    type HostType<'a> = SvgDocumentRecord<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        scope: ReadScope<'a>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let start_glyph_id = ctxt.read_u16be()?;
        let end_glyph_id = ctxt.read_u16be()?;
        let svg_doc_offset = usize::safe_from(ctxt.read_u32be()?);
        let svg_doc_length = usize::safe_from(ctxt.read_u32be()?);
        let svg_document = scope.offset_length(svg_doc_offset, svg_doc_length)?.data();

        Ok(SvgDocumentRecord {
            start_glyph_id,
            end_glyph_id,
            svg_document,
        })
    }
}

impl ReadFixedSizeDep for SvgDocumentRecord<'_> {
    fn size(_: ReadScope<'_>) -> usize {
        (2 * size::U16) + (2 * size::U32)
    }
}
