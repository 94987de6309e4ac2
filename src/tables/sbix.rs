#![deny(missing_docs)]

//! Standard Bitmap Graphics Table (`sbix`).
//!
//! Only PNG graphics are decoded.
//!
//! * [Microsoft](https://learn.microsoft.com/en-us/typography/opentype/spec/sbix)
//! * [Apple](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6sbix.html)

use crate::binary::read::{CheckIndex, ReadArray, ReadBinaryDep, ReadCtxt, ReadScope};
use crate::binary::U32Be;
use crate::error::ParseError;
use crate::tag;
use crate::SafeFrom;

/// `sbix` table containing bitmaps.
#[derive(Debug)]
pub struct Sbix<'a> {
    /// Drawing flags. Bit 0 is always set, bit 1 requests drawing outlines as well.
    pub flags: u16,
    /// Bitmap data for different sizes.
    pub strikes: Vec<SbixStrike<'a>>,
}

/// A single strike (ppem/ppi) combination.
#[derive(Debug)]
pub struct SbixStrike<'a> {
    scope: ReadScope<'a>,
    /// The PPEM size for which this strike was designed.
    pub ppem: u16,
    /// The device pixel density (in pixels-per-inch) for which this strike was designed.
    pub ppi: u16,
    /// Offsets from the start of the strike to each glyph's data, plus one.
    glyph_data_offsets: ReadArray<'a, U32Be>,
}

/// An `sbix` PNG glyph.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SbixGlyph<'a> {
    /// The horizontal offset from the left edge of the graphic to the glyph's origin.
    pub origin_offset_x: i16,
    /// The vertical offset from the bottom edge of the graphic to the glyph's origin.
    pub origin_offset_y: i16,
    /// The encoded PNG data.
    pub data: &'a [u8],
}

impl ReadBinaryDep for Sbix<'_> {
    type Args<'a> = usize;
    type HostType<'a> = Sbix<'a>;

    /// Read the `sbix` table. `num_glyphs` comes from the `maxp` table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        num_glyphs: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 1)?;
        let flags = ctxt.read_u16be()?;
        let num_strikes = usize::safe_from(ctxt.read_u32be()?);
        let strike_offsets = ctxt.read_array::<U32Be>(num_strikes)?;
        let strikes = strike_offsets
            .iter()
            .map(|offset| {
                scope
                    .offset(usize::safe_from(offset))
                    .read_dep::<SbixStrike<'_>>(num_glyphs)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sbix { flags, strikes })
    }
}

impl ReadBinaryDep for SbixStrike<'_> {
    type Args<'a> = usize;
    type HostType<'a> = SbixStrike<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        num_glyphs: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let ppem = ctxt.read_u16be()?;
        let ppi = ctxt.read_u16be()?;
        let glyph_data_offsets = ctxt.read_array::<U32Be>(num_glyphs + 1)?;

        Ok(SbixStrike {
            scope,
            ppem,
            ppi,
            glyph_data_offsets,
        })
    }
}

impl<'a> Sbix<'a> {
    /// The last strike in the table, usually the largest.
    pub fn last_strike(&self) -> Option<&SbixStrike<'a>> {
        self.strikes.last()
    }
}

impl<'a> SbixStrike<'a> {
    /// Read the glyph `glyph_index` from this strike.
    ///
    /// `None` when the strike has no data for the glyph. Graphic types other than `png ` fail
    /// with `ParseError::UnsupportedFormat`.
    pub fn read_glyph(&self, glyph_index: u16) -> Result<Option<SbixGlyph<'a>>, ParseError> {
        let glyph_index = usize::from(glyph_index);
        self.glyph_data_offsets.check_index(glyph_index + 1)?;
        let offset = self.glyph_data_offsets.read_item(glyph_index).map(usize::safe_from)?;
        let end = self
            .glyph_data_offsets
            .read_item(glyph_index + 1)
            .map(usize::safe_from)?;
        match end.checked_sub(offset) {
            Some(0) => Ok(None),
            Some(length) => {
                let mut ctxt = self.scope.offset_length(offset, length)?.ctxt();
                let origin_offset_x = ctxt.read_i16be()?;
                let origin_offset_y = ctxt.read_i16be()?;
                let graphic_type = ctxt.read_u32be()?;
                if graphic_type != tag::PNG {
                    return Err(ParseError::UnsupportedFormat(graphic_type));
                }
                let data = ctxt.read_slice(length.checked_sub(8).ok_or(ParseError::BadEof)?)?;
                Ok(Some(SbixGlyph {
                    origin_offset_x,
                    origin_offset_y,
                    data,
                }))
            }
            None => Err(ParseError::BadOffset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    fn sbix(graphic_type: &'static [u8]) -> Vec<u8> {
        writer::convert(&[
            UInt16(1),
            UInt16(1),
            UInt32(2),
            UInt32(16),
            UInt32(32),
            // Strike 0: ppem 20, 2 glyphs, both empty
            UInt16(20),
            UInt16(72),
            UInt32(20),
            UInt32(20),
            UInt32(20),
            // Strike 1: ppem 40, glyph 1 has 8 + 4 bytes
            UInt16(40),
            UInt16(72),
            UInt32(16),
            UInt32(16),
            UInt32(28),
            Int16(1),
            Int16(-2),
            Raw(graphic_type),
            Raw(b"\x89PNG"),
        ])
    }

    #[test]
    fn png_glyphs() {
        let data = sbix(b"png ");
        let sbix = ReadScope::new(&data).read_dep::<Sbix<'_>>(2).unwrap();
        assert_eq!(sbix.strikes.len(), 2);
        assert_eq!(sbix.strikes[0].read_glyph(1).unwrap(), None);
        let strike = sbix.last_strike().unwrap();
        assert_eq!(strike.ppem, 40);
        assert_eq!(strike.read_glyph(0).unwrap(), None);
        let glyph = strike.read_glyph(1).unwrap().unwrap();
        assert_eq!(glyph.origin_offset_y, -2);
        assert_eq!(glyph.data, b"\x89PNG");
        assert!(strike.read_glyph(2).is_err());
    }

    #[test]
    fn other_graphic_types_are_unsupported() {
        let data = sbix(b"jpg ");
        let sbix = ReadScope::new(&data).read_dep::<Sbix<'_>>(2).unwrap();
        assert_eq!(
            sbix.last_strike().unwrap().read_glyph(1),
            Err(ParseError::UnsupportedFormat(crate::tag!(b"jpg ")))
        );
    }
}
