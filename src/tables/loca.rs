//! Parsing of the `loca` table.
//!
//! > The indexToLoc table stores the offsets to the locations of the glyphs in the font, relative
//! > to the beginning of the glyphData table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/loca>

use crate::binary::read::{ReadArray, ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
///
/// Always holds `num_glyphs + 1` offsets.
#[derive(Clone, Debug)]
pub struct LocaTable<'a> {
    pub offsets: LocaOffsets<'a>,
}

#[derive(Clone, Debug)]
pub enum LocaOffsets<'a> {
    Short(ReadArray<'a, U16Be>),
    Long(ReadArray<'a, U32Be>),
}

impl ReadBinaryDep for LocaTable<'_> {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable<'a>;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font, from the `maxp` table.
    /// * `index_to_loc_format` selects short or long offsets, from the `head` table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let num_offsets = usize::from(num_glyphs) + 1;
        let offsets = match index_to_loc_format {
            // The actual local offset divided by 2 is stored
            IndexToLocFormat::Short => LocaOffsets::Short(ctxt.read_array::<U16Be>(num_offsets)?),
            IndexToLocFormat::Long => LocaOffsets::Long(ctxt.read_array::<U32Be>(num_offsets)?),
        };

        Ok(LocaTable { offsets })
    }
}

impl LocaTable<'_> {
    /// The number of offsets, which is one more than the number of glyphs.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.len() == 0
    }

    /// The byte range of `glyph_index` within `glyf`.
    ///
    /// Returns `None` when the index is out of range.
    pub fn glyph_range(&self, glyph_index: usize) -> Option<(u32, u32)> {
        let start = self.offsets.get(glyph_index)?;
        let end = self.offsets.get(glyph_index + 1)?;
        Some((start, end))
    }
}

impl<'a> LocaOffsets<'a> {
    /// Iterate the offsets in this table.
    pub fn iter(&self) -> impl Iterator<Item = u32> + 'a {
        let offsets = self.clone();
        (0..offsets.len()).filter_map(move |index| offsets.get(index))
    }

    /// Returns the number of offsets in the table.
    pub fn len(&self) -> usize {
        match self {
            LocaOffsets::Short(array) => array.len(),
            LocaOffsets::Long(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the offset at `index`, scaled to bytes.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            LocaOffsets::Short(array) => array.get_item(index).map(|offset| u32::from(offset) * 2),
            LocaOffsets::Long(array) => array.get_item(index),
        }
    }

    /// Get the last offset in the table.
    ///
    /// Returns `None` if the table is empty.
    pub fn last(&self) -> Option<u32> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }
}
