#![deny(missing_docs)]

//! `CPAL` table parsing.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cpal>

use bitflags::bitflags;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope, ReadUnchecked};
use crate::binary::{U16Be, U32Be, U8};
use crate::error::ParseError;
use crate::SafeFrom;

/// `CPAL`: Color Palette Table
#[derive(Debug)]
pub struct CpalTable<'a> {
    /// Table version number, 0 or 1.
    pub version: u16,
    /// Number of entries in each palette.
    pub num_palette_entries: u16,
    color_records_array: ReadArray<'a, ColorRecord>,
    /// Index of each palette's first color record in the color record array.
    color_record_indices: ReadArray<'a, U16Be>,
    palette_types_array: Option<ReadArray<'a, U32Be>>,
    palette_labels_array: Option<ReadArray<'a, U16Be>>,
    palette_entry_labels_array: Option<ReadArray<'a, U16Be>>,
}

bitflags! {
    /// Flags describing features of a palette.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct PaletteFlags: u32 {
        /// Appropriate for a light background.
        const USABLE_WITH_LIGHT_BACKGROUND = 0b00000001;
        /// Appropriate for a dark background.
        const USABLE_WITH_DARK_BACKGROUND  = 0b00000010;
    }
}

impl<'data> CpalTable<'data> {
    /// Number of palettes in the table.
    pub fn num_palettes(&self) -> usize {
        self.color_record_indices.len()
    }

    /// The palette at `index`. Palette 0 is the default palette.
    pub fn palette<'a>(&'a self, index: u16) -> Option<Palette<'a, 'data>> {
        let base_index = self.color_record_indices.get_item(usize::from(index))?;
        Some(Palette {
            cpal: self,
            index,
            base_index,
        })
    }

    /// Name ID of the label for a palette entry, if it has one.
    pub fn entry_label(&self, entry_index: u16) -> Option<u16> {
        self.palette_entry_labels_array
            .as_ref()
            .and_then(|labels| labels.get_item(usize::from(entry_index)))
            .filter(|name_id| *name_id != 0xFFFF)
    }
}

fn read_optional_array<'a, T: ReadUnchecked>(
    scope: ReadScope<'a>,
    offset: u32,
    count: usize,
) -> Result<Option<ReadArray<'a, T>>, ParseError> {
    (offset > 0)
        .then(|| scope.offset(usize::safe_from(offset)).ctxt().read_array(count))
        .transpose()
}

impl ReadBinary for CpalTable<'_> {
    type HostType<'a> = CpalTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let start = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version <= 1)?;
        let num_palette_entries = ctxt.read_u16be()?;
        ctxt.check(num_palette_entries > 0)?;
        let num_palettes = ctxt.read_u16be()?;
        ctxt.check(num_palettes > 0)?;
        let num_color_records = ctxt.read_u16be()?;
        let color_records_array_offset = ctxt.read_u32be()?;
        // Several palettes may share color records
        let color_record_indices = ctxt.read_array(usize::from(num_palettes))?;
        let color_records_array = start
            .offset(usize::safe_from(color_records_array_offset))
            .ctxt()
            .read_array(usize::from(num_color_records))?;

        let (types_offset, labels_offset, entry_labels_offset) = if version == 1 {
            (ctxt.read_u32be()?, ctxt.read_u32be()?, ctxt.read_u32be()?)
        } else {
            (0, 0, 0)
        };

        Ok(CpalTable {
            version,
            num_palette_entries,
            color_records_array,
            color_record_indices,
            palette_types_array: read_optional_array(
                start,
                types_offset,
                usize::from(num_palettes),
            )?,
            palette_labels_array: read_optional_array(
                start,
                labels_offset,
                usize::from(num_palettes),
            )?,
            palette_entry_labels_array: read_optional_array(
                start,
                entry_labels_offset,
                usize::from(num_palette_entries),
            )?,
        })
    }
}

/// A `CPAL` palette.
#[derive(Copy, Clone)]
pub struct Palette<'a, 'data> {
    cpal: &'a CpalTable<'data>,
    index: u16,
    /// Index of this palette's first record in the color record array.
    base_index: u16,
}

impl Palette<'_, '_> {
    /// The color at `index` in this palette.
    ///
    /// 0xFFFF is the text foreground colour, returned as opaque black.
    pub fn color(&self, index: u16) -> Option<ColorRecord> {
        if index == 0xFFFF {
            return Some(ColorRecord {
                blue: 0,
                green: 0,
                red: 0,
                alpha: u8::MAX,
            });
        } else if index >= self.cpal.num_palette_entries {
            return None;
        }

        let color_index = u32::from(self.base_index) + u32::from(index);
        self.cpal
            .color_records_array
            .get_item(usize::safe_from(color_index))
    }

    /// All the colors of this palette in entry order.
    pub fn colors(&self) -> Vec<ColorRecord> {
        (0..self.cpal.num_palette_entries)
            .filter_map(|index| self.color(index))
            .collect()
    }

    /// Name ID of the label for this palette, if it has one.
    pub fn label(&self) -> Option<u16> {
        self.cpal
            .palette_labels_array
            .as_ref()
            .and_then(|labels| labels.get_item(usize::from(self.index)))
            .filter(|name_id| *name_id != 0xFFFF)
    }

    /// Light and dark background flags. Both may be set.
    pub fn flags(&self) -> PaletteFlags {
        self.cpal
            .palette_types_array
            .as_ref()
            .and_then(|types| types.get_item(usize::from(self.index)))
            .map(PaletteFlags::from_bits_truncate)
            .unwrap_or(PaletteFlags::empty())
    }
}

/// A BGRA color record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColorRecord {
    /// Blue value (B0).
    pub blue: u8,
    /// Green value (B1).
    pub green: u8,
    /// Red value (B2).
    pub red: u8,
    /// Alpha value (B3).
    pub alpha: u8,
}

impl ReadFrom for ColorRecord {
    type ReadType = ((U8, U8), (U8, U8));

    fn read_from(((blue, green), (red, alpha)): ((u8, u8), (u8, u8))) -> Self {
        ColorRecord {
            blue,
            green,
            red,
            alpha,
        }
    }
}
