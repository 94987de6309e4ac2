#![deny(missing_docs)]

//! `kern` table parsing.
//!
//! Both the OpenType layout of the table (version 0, 16-bit header) and Apple's layout
//! (version 1.0, 32-bit header) are decoded.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/kern>
//! <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6kern.html>

use log::warn;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be};
use crate::error::ParseError;
use crate::SafeFrom;

/// `kern` Kerning Table.
#[derive(Debug)]
pub struct KernTable<'a> {
    /// `true` for Apple's version 1.0 layout.
    pub apple: bool,
    /// The decoded subtables, excluding any in unsupported formats.
    pub subtables: Vec<KernSubtable<'a>>,
}

/// Kerning data.
#[derive(Debug)]
pub enum KernData<'a> {
    /// Format 0 kerning data (pairs).
    Format0(KernFormat0<'a>),
    /// Format 2 kerning data (2D array).
    Format2(KernFormat2<'a>),
}

/// Format 0 kerning data (pairs).
#[derive(Debug)]
pub struct KernFormat0<'a> {
    /// Pairs sorted by left then right glyph.
    pub kern_pairs: ReadArray<'a, KernPair>,
}

/// Format 2 kerning data (2D array).
#[derive(Debug)]
pub struct KernFormat2<'a> {
    left_table: ClassTable<'a>,
    right_table: ClassTable<'a>,
    /// The subtable, since class values are offsets from its start.
    subtable: ReadScope<'a>,
}

/// Kerning value for glyph pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernPair {
    /// The glyph index for the left-hand glyph in the kerning pair.
    pub left: u16,
    /// The glyph index for the right-hand glyph in the kerning pair.
    pub right: u16,
    /// The kerning value in font design units. Negative values move glyphs closer together.
    pub value: i16,
}

/// Glyph class table.
#[derive(Debug)]
struct ClassTable<'a> {
    first_glyph: u16,
    values: ReadArray<'a, U16Be>,
}

/// Coverage flags of a subtable, normalised across the two table layouts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Coverage {
    /// The subtable holds horizontal kerning.
    pub horizontal: bool,
    /// The subtable holds minimum values rather than kerning values.
    pub minimum: bool,
    /// Kerning is perpendicular to the flow of the text.
    pub cross_stream: bool,
    /// Values replace the accumulated value instead of adding to it.
    pub replace: bool,
    /// Apple only: the subtable holds variation values.
    pub variation: bool,
}

/// Sub-table within `kern` table.
#[derive(Debug)]
pub struct KernSubtable<'a> {
    /// The subtable format.
    pub format: u8,
    /// How the subtable applies.
    pub coverage: Coverage,
    /// Apple only: the tuple index for variation subtables.
    pub tuple_index: u16,
    /// The kerning values.
    pub data: KernData<'a>,
}

impl ReadBinary for KernTable<'_> {
    type HostType<'a> = KernTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let version = ctxt.read_u16be()?;
        match version {
            0 => {
                let table_count = ctxt.read_u16be()?;
                let mut subtables = Vec::with_capacity(usize::from(table_count));
                for _ in 0..table_count {
                    let start = ctxt.scope();
                    let _version = ctxt.read_u16be()?;
                    // Length is unreliable for large format 0 subtables, which overflow it
                    let _length = ctxt.read_u16be()?;
                    let coverage = ctxt.read_u16be()?;
                    let format = (coverage >> 8) as u8;
                    let coverage = Coverage {
                        horizontal: coverage & 1 != 0,
                        minimum: coverage & (1 << 1) != 0,
                        cross_stream: coverage & (1 << 2) != 0,
                        replace: coverage & (1 << 3) != 0,
                        variation: false,
                    };
                    match read_data(ctxt, start, format)? {
                        Some(data) => subtables.push(KernSubtable {
                            format,
                            coverage,
                            tuple_index: 0,
                            data,
                        }),
                        // Without a format 0 length the rest of the table cannot be located
                        None => break,
                    }
                }
                Ok(KernTable {
                    apple: false,
                    subtables,
                })
            }
            1 => {
                let _minor_version = ctxt.read_u16be()?;
                let table_count = ctxt.read_u32be()?;
                let mut subtables = Vec::new();
                for _ in 0..table_count {
                    let start = ctxt.scope();
                    let length = usize::safe_from(ctxt.read_u32be()?);
                    let coverage = ctxt.read_u16be()?;
                    let tuple_index = ctxt.read_u16be()?;
                    let format = (coverage & 0xFF) as u8;
                    let coverage = Coverage {
                        horizontal: coverage & 0x8000 == 0,
                        minimum: false,
                        cross_stream: coverage & 0x4000 != 0,
                        replace: false,
                        variation: coverage & 0x2000 != 0,
                    };
                    let body = start.offset_length(0, length)?;
                    let mut body_ctxt = body.ctxt();
                    let _header = body_ctxt.read_slice(8)?;
                    if let Some(data) = read_data(&mut body_ctxt, body, format)? {
                        subtables.push(KernSubtable {
                            format,
                            coverage,
                            tuple_index,
                            data,
                        });
                    }
                    ctxt.read_slice(length.checked_sub(8).ok_or(ParseError::BadValue)?)?;
                }
                Ok(KernTable {
                    apple: true,
                    subtables,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

fn read_data<'a>(
    ctxt: &mut ReadCtxt<'a>,
    start: ReadScope<'a>,
    format: u8,
) -> Result<Option<KernData<'a>>, ParseError> {
    match format {
        0 => {
            let n_pairs = ctxt.read_u16be()?;
            let _search_range = ctxt.read_u16be()?;
            let _entry_selector = ctxt.read_u16be()?;
            let _range_shift = ctxt.read_u16be()?;
            let kern_pairs = ctxt.read_array::<KernPair>(usize::from(n_pairs))?;
            Ok(Some(KernData::Format0(KernFormat0 { kern_pairs })))
        }
        2 => {
            let _row_width = ctxt.read_u16be()?;
            let left_class_offset = ctxt.read_u16be()?;
            let right_class_offset = ctxt.read_u16be()?;
            let _kerning_array_offset = ctxt.read_u16be()?;

            let left_table = start
                .offset(usize::from(left_class_offset))
                .read::<ClassTable<'_>>()?;
            let right_table = start
                .offset(usize::from(right_class_offset))
                .read::<ClassTable<'_>>()?;

            Ok(Some(KernData::Format2(KernFormat2 {
                left_table,
                right_table,
                subtable: start,
            })))
        }
        _ => {
            warn!("kern subtable format {} is not supported", format);
            Ok(None)
        }
    }
}

impl KernTable<'_> {
    /// The total horizontal kerning for a pair of glyphs, or `None` if no subtable has a value.
    pub fn horizontal_kerning(&self, left: u16, right: u16) -> Option<i16> {
        self.subtables
            .iter()
            .filter(|subtable| {
                subtable.coverage.horizontal
                    && !subtable.coverage.minimum
                    && !subtable.coverage.cross_stream
                    && !subtable.coverage.variation
            })
            .fold(None, |total, subtable| {
                match subtable.data.lookup(left, right) {
                    Some(value) if subtable.coverage.replace => Some(value),
                    Some(value) => Some(total.unwrap_or(0i16).saturating_add(value)),
                    None => total,
                }
            })
    }
}

impl KernPair {
    fn search_key(&self) -> u32 {
        (u32::from(self.left) << 16) | u32::from(self.right)
    }
}

impl ReadFrom for KernPair {
    type ReadType = (U16Be, U16Be, I16Be);

    fn read_from((left, right, value): (u16, u16, i16)) -> Self {
        KernPair { left, right, value }
    }
}

impl ReadBinary for ClassTable<'_> {
    type HostType<'a> = ClassTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let first_glyph = ctxt.read_u16be()?;
        let n_glyphs = ctxt.read_u16be()?;
        let values = ctxt.read_array(usize::from(n_glyphs))?;

        Ok(ClassTable {
            first_glyph,
            values,
        })
    }
}

impl KernData<'_> {
    /// Lookup the kerning for a pair of glyphs
    pub fn lookup(&self, left: u16, right: u16) -> Option<i16> {
        match self {
            KernData::Format0(format0) => {
                // Pairs are ordered by left glyph in the high word, right in the low word
                let needle = (u32::from(left) << 16) | u32::from(right);
                format0
                    .kern_pairs
                    .binary_search_by(|pair| pair.search_key().cmp(&needle))
                    .ok()
                    .and_then(|index| format0.kern_pairs.get_item(index))
                    .map(|pair| pair.value)
            }
            KernData::Format2(format2) => {
                // Class values are byte offsets from the start of the subtable. Left values are
                // pre-multiplied by the row width so the two sum to the value's offset.
                let left_class = format2.left_table.get(left)?;
                let right_class = format2.right_table.get(right)?;
                format2
                    .subtable
                    .offset(usize::from(left_class) + usize::from(right_class))
                    .read::<I16Be>()
                    .ok()
            }
        }
    }
}

impl ClassTable<'_> {
    fn get(&self, glyph_id: u16) -> Option<u16> {
        let index = glyph_id.checked_sub(self.first_glyph).map(usize::from)?;
        self.values.get_item(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    #[test]
    fn version0_format0() {
        let data = writer::convert(&[
            UInt16(0),
            UInt16(1),
            UInt16(0),
            UInt16(6 + 8 + 2 * 6),
            UInt16(0x0001),
            UInt16(2),
            UInt16(12),
            UInt16(1),
            UInt16(0),
            UInt16(4),
            UInt16(7),
            Int16(-50),
            UInt16(5),
            UInt16(1),
            Int16(20),
        ]);
        let kern = ReadScope::new(&data).read::<KernTable<'_>>().unwrap();
        assert!(!kern.apple);
        assert_eq!(kern.subtables.len(), 1);
        assert_eq!(kern.subtables[0].format, 0);
        assert_eq!(kern.horizontal_kerning(4, 7), Some(-50));
        assert_eq!(kern.horizontal_kerning(5, 1), Some(20));
        assert_eq!(kern.horizontal_kerning(7, 4), None);
    }

    #[test]
    fn apple_version1_format0() {
        let data = writer::convert(&[
            UInt32(0x00010000),
            UInt32(1),
            UInt32(8 + 8 + 6),
            UInt16(0x0000),
            UInt16(0),
            UInt16(1),
            UInt16(6),
            UInt16(0),
            UInt16(0),
            UInt16(3),
            UInt16(9),
            Int16(-75),
        ]);
        let kern = ReadScope::new(&data).read::<KernTable<'_>>().unwrap();
        assert!(kern.apple);
        assert!(kern.subtables[0].coverage.horizontal);
        assert_eq!(kern.horizontal_kerning(3, 9), Some(-75));
    }

    #[test]
    fn unknown_version() {
        let data = writer::convert(&[UInt16(2), UInt16(0)]);
        assert_eq!(
            ReadScope::new(&data).read::<KernTable<'_>>().err(),
            Some(ParseError::BadVersion)
        );
    }
}
