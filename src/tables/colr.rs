//! `COLR` table parsing.
//!
//! Version 0 layered colour glyphs. Version 1 tables are accepted and their version 0 records
//! read; the paint graph is not decoded.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/colr>

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom};
use crate::binary::U16Be;
use crate::error::ParseError;
use crate::SafeFrom;

/// `COLR`: Color Table
#[derive(Debug)]
pub struct ColrTable<'a> {
    pub version: u16,
    base_glyph_records: ReadArray<'a, BaseGlyph>,
    layer_records: ReadArray<'a, Layer>,
}

/// Base glyph record: the layers that draw a colour glyph.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BaseGlyph {
    pub glyph_id: u16,
    pub first_layer_index: u16,
    pub num_layers: u16,
}

/// A layer of a colour glyph: a glyph outline filled with a palette entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Layer {
    pub glyph_id: u16,
    /// Index into a `CPAL` palette. 0xFFFF is the text foreground colour.
    pub palette_index: u16,
}

impl ReadBinary for ColrTable<'_> {
    type HostType<'a> = ColrTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version <= 1)?;
        let num_base_glyph_records = ctxt.read_u16be()?;
        let base_glyph_records_offset = ctxt.read_u32be()?;
        let layer_records_offset = ctxt.read_u32be()?;
        let num_layer_records = ctxt.read_u16be()?;

        // Offsets of zero mean no records, which version 1 tables may have
        let base_glyph_records = if base_glyph_records_offset == 0 {
            ReadArray::empty()
        } else {
            scope
                .offset(usize::safe_from(base_glyph_records_offset))
                .ctxt()
                .read_array(usize::from(num_base_glyph_records))?
        };
        let layer_records = if layer_records_offset == 0 {
            ReadArray::empty()
        } else {
            scope
                .offset(usize::safe_from(layer_records_offset))
                .ctxt()
                .read_array(usize::from(num_layer_records))?
        };

        Ok(ColrTable {
            version,
            base_glyph_records,
            layer_records,
        })
    }
}

impl<'a> ColrTable<'a> {
    /// The base glyph record for `glyph_id`, if it is a colour glyph.
    pub fn base_glyph(&self, glyph_id: u16) -> Option<BaseGlyph> {
        self.base_glyph_records
            .binary_search_by(|base| base.glyph_id.cmp(&glyph_id))
            .ok()
            .and_then(|index| self.base_glyph_records.get_item(index))
    }

    /// The layers that draw `glyph_id`, bottom first. Empty if it is not a colour glyph.
    pub fn layers(&self, glyph_id: u16) -> Result<Vec<Layer>, ParseError> {
        match self.base_glyph(glyph_id) {
            Some(base) => {
                let first = usize::from(base.first_layer_index);
                (first..first + usize::from(base.num_layers))
                    .map(|index| {
                        self.layer_records
                            .get_item(index)
                            .ok_or(ParseError::BadIndex)
                    })
                    .collect()
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn base_glyphs(&self) -> impl Iterator<Item = BaseGlyph> + 'a {
        self.base_glyph_records.iter()
    }
}

impl ReadFrom for BaseGlyph {
    type ReadType = (U16Be, U16Be, U16Be);

    fn read_from((glyph_id, first_layer_index, num_layers): (u16, u16, u16)) -> Self {
        BaseGlyph {
            glyph_id,
            first_layer_index,
            num_layers,
        }
    }
}

impl ReadFrom for Layer {
    type ReadType = (U16Be, U16Be);

    fn read_from((glyph_id, palette_index): (u16, u16)) -> Self {
        Layer {
            glyph_id,
            palette_index,
        }
    }
}
