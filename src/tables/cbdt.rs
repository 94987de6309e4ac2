#![deny(missing_docs)]

//! Colour bitmap tables `CBLC` and `CBDT`.
//!
//! `CBLC` locates glyph images, `CBDT` holds them. Only the PNG image formats of `CBDT`
//! (17, 18 and 19) are decoded.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cblc>
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cbdt>

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFixedSizeDep, ReadFrom, ReadScope,
};
use crate::binary::{I8, U16Be, U32Be, U8};
use crate::error::ParseError;
use crate::size;
use crate::SafeFrom;

/// `CBLC`: Color Bitmap Location Table
#[derive(Debug)]
pub struct CblcTable<'a> {
    /// Major version of this table, 2 for `EBLC` and 3 for `CBLC`.
    pub major_version: u16,
    /// Minor version of this table.
    pub minor_version: u16,
    /// The strikes available in this font.
    pub bitmap_sizes: Vec<BitmapSize<'a>>,
}

/// A strike of bitmap data.
#[derive(Debug)]
pub struct BitmapSize<'a> {
    /// Lowest glyph index for this size.
    pub start_glyph_index: u16,
    /// Highest glyph index for this size.
    pub end_glyph_index: u16,
    /// Horizontal pixels per em.
    pub ppem_x: u8,
    /// Vertical pixels per em.
    pub ppem_y: u8,
    /// Bits per pixel. 32 for colour bitmaps.
    pub bit_depth: u8,
    /// Bitmap flags, bit 0 for horizontal and bit 1 for vertical metrics.
    pub flags: i8,
    index_sub_tables: Vec<IndexSubTable<'a>>,
}

/// An index sub-table describing where the images of a range of glyphs are.
#[derive(Debug)]
struct IndexSubTable<'a> {
    first_glyph_index: u16,
    last_glyph_index: u16,
    image_format: u16,
    image_data_offset: u32,
    offsets: GlyphOffsets<'a>,
}

#[derive(Debug)]
enum GlyphOffsets<'a> {
    /// Index format 1: 4-byte offsets, one per glyph plus one.
    Long(ReadArray<'a, U32Be>),
    /// Index format 2: all glyphs have the same size and metrics.
    Constant {
        image_size: u32,
        big_metrics: BigGlyphMetrics,
    },
    /// Index format 3: 2-byte offsets, one per glyph plus one.
    Short(ReadArray<'a, U16Be>),
}

/// The location of one glyph's image in `CBDT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlyphLocation {
    /// The `CBDT` image format of the data.
    pub image_format: u16,
    /// Offset of the image data from the start of `CBDT`.
    pub offset: usize,
    /// Length of the image data.
    pub length: usize,
    /// Metrics shared by every glyph of the index sub-table, for image format 19.
    pub big_metrics: Option<BigGlyphMetrics>,
}

/// Small glyph metrics, used by image format 17.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct SmallGlyphMetrics {
    pub height: u8,
    pub width: u8,
    pub bearing_x: i8,
    pub bearing_y: i8,
    pub advance: u8,
}

/// Big glyph metrics, used by image format 18 and index format 2.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct BigGlyphMetrics {
    pub height: u8,
    pub width: u8,
    pub hori_bearing_x: i8,
    pub hori_bearing_y: i8,
    pub hori_advance: u8,
    pub vert_bearing_x: i8,
    pub vert_bearing_y: i8,
    pub vert_advance: u8,
}

/// Glyph metrics stored with a bitmap.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GlyphMetrics {
    /// Metrics from image format 17.
    Small(SmallGlyphMetrics),
    /// Metrics from image format 18 or the index sub-table of format 19 images.
    Big(BigGlyphMetrics),
    /// No metrics are available.
    None,
}

/// `CBDT`: Color Bitmap Data Table
#[derive(Debug)]
pub struct CbdtTable<'a> {
    /// Major version of this table.
    pub major_version: u16,
    /// Minor version of this table.
    pub minor_version: u16,
    /// The whole table, since `CBLC` offsets are relative to its start.
    data: ReadScope<'a>,
}

/// A PNG glyph image extracted from `CBDT`.
#[derive(Debug)]
pub struct BitmapGlyph<'a> {
    /// Glyph metrics.
    pub metrics: GlyphMetrics,
    /// The encoded PNG data.
    pub data: &'a [u8],
}

impl ReadBinary for CblcTable<'_> {
    type HostType<'a> = CblcTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let table = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version((2..=3).contains(&major_version))?;
        let minor_version = ctxt.read_u16be()?;
        let num_sizes = usize::safe_from(ctxt.read_u32be()?);
        let bitmap_sizes = ctxt
            .read_array_dep::<BitmapSize<'_>>(num_sizes, table)?
            .read_to_vec()?;

        Ok(CblcTable {
            major_version,
            minor_version,
            bitmap_sizes,
        })
    }
}

impl ReadBinaryDep for BitmapSize<'_> {
    type Args<'a> = ReadScope<'a>;
    type HostType<'a> = BitmapSize<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        cblc: ReadScope<'a>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let index_sub_table_array_offset = usize::safe_from(ctxt.read_u32be()?);
        let _index_tables_size = ctxt.read_u32be()?;
        let number_of_index_sub_tables = usize::safe_from(ctxt.read_u32be()?);
        let _color_ref = ctxt.read_u32be()?;
        // Horizontal and vertical SbitLineMetrics
        let _line_metrics = ctxt.read_slice(2 * 12)?;
        let start_glyph_index = ctxt.read_u16be()?;
        let end_glyph_index = ctxt.read_u16be()?;
        let ppem_x = ctxt.read_u8()?;
        let ppem_y = ctxt.read_u8()?;
        let bit_depth = ctxt.read_u8()?;
        let flags = ctxt.read_i8()?;

        let array = cblc.offset(index_sub_table_array_offset);
        let records = array
            .ctxt()
            .read_array::<IndexSubTableRecord>(number_of_index_sub_tables)?;
        let index_sub_tables = records
            .iter()
            .map(|record| {
                let offset = usize::safe_from(record.additional_offset_to_index_sub_table);
                array
                    .offset(offset)
                    .read_dep::<IndexSubTable<'_>>((
                        record.first_glyph_index,
                        record.last_glyph_index,
                    ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BitmapSize {
            start_glyph_index,
            end_glyph_index,
            ppem_x,
            ppem_y,
            bit_depth,
            flags,
            index_sub_tables,
        })
    }
}

impl ReadFixedSizeDep for BitmapSize<'_> {
    fn size(_: ReadScope<'_>) -> usize {
        // Four 32-bit fields, two 12-byte SbitLineMetrics, two glyph ids, four bytes
        (4 * size::U32) + (2 * 12) + (2 * size::U16) + 4
    }
}

struct IndexSubTableRecord {
    first_glyph_index: u16,
    last_glyph_index: u16,
    additional_offset_to_index_sub_table: u32,
}

impl ReadFrom for IndexSubTableRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from(
        (first_glyph_index, last_glyph_index, additional_offset_to_index_sub_table): (
            u16,
            u16,
            u32,
        ),
    ) -> Self {
        IndexSubTableRecord {
            first_glyph_index,
            last_glyph_index,
            additional_offset_to_index_sub_table,
        }
    }
}

impl ReadBinaryDep for IndexSubTable<'_> {
    type Args<'a> = (u16, u16);
    type HostType<'a> = IndexSubTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (first_glyph_index, last_glyph_index): (u16, u16),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let index_format = ctxt.read_u16be()?;
        let image_format = ctxt.read_u16be()?;
        let image_data_offset = ctxt.read_u32be()?;
        let glyph_count = last_glyph_index
            .checked_sub(first_glyph_index)
            .map(|count| usize::from(count) + 1)
            .ok_or(ParseError::BadValue)?;

        let offsets = match index_format {
            1 => GlyphOffsets::Long(ctxt.read_array::<U32Be>(glyph_count + 1)?),
            2 => {
                let image_size = ctxt.read_u32be()?;
                let big_metrics = ctxt.read::<BigGlyphMetrics>()?;
                GlyphOffsets::Constant {
                    image_size,
                    big_metrics,
                }
            }
            3 => GlyphOffsets::Short(ctxt.read_array::<U16Be>(glyph_count + 1)?),
            _ => return Err(ParseError::UnsupportedFormat(u32::from(index_format))),
        };

        Ok(IndexSubTable {
            first_glyph_index,
            last_glyph_index,
            image_format,
            image_data_offset,
            offsets,
        })
    }
}

impl ReadFrom for SmallGlyphMetrics {
    type ReadType = ((U8, U8), (I8, I8, U8));

    fn read_from(
        ((height, width), (bearing_x, bearing_y, advance)): ((u8, u8), (i8, i8, u8)),
    ) -> Self {
        SmallGlyphMetrics {
            height,
            width,
            bearing_x,
            bearing_y,
            advance,
        }
    }
}

impl ReadFrom for BigGlyphMetrics {
    type ReadType = ((U8, U8), (I8, I8, U8), (I8, I8, U8));

    fn read_from((size, hori, vert): ((u8, u8), (i8, i8, u8), (i8, i8, u8))) -> Self {
        BigGlyphMetrics {
            height: size.0,
            width: size.1,
            hori_bearing_x: hori.0,
            hori_bearing_y: hori.1,
            hori_advance: hori.2,
            vert_bearing_x: vert.0,
            vert_bearing_y: vert.1,
            vert_advance: vert.2,
        }
    }
}

impl<'a> CblcTable<'a> {
    /// The strike containing `glyph_id` whose vertical ppem is closest to `target_ppem`,
    /// preferring larger strikes on a tie.
    pub fn find_strike(&self, glyph_id: u16, target_ppem: u8) -> Option<&BitmapSize<'a>> {
        self.bitmap_sizes
            .iter()
            .filter(|strike| strike.contains_glyph(glyph_id))
            .min_by_key(|strike| {
                let distance = i16::from(strike.ppem_y) - i16::from(target_ppem);
                (distance.abs(), std::cmp::Reverse(strike.ppem_y))
            })
    }
}

impl BitmapSize<'_> {
    fn contains_glyph(&self, glyph_id: u16) -> bool {
        (self.start_glyph_index..=self.end_glyph_index).contains(&glyph_id)
            && self
                .index_sub_tables
                .iter()
                .any(|sub_table| sub_table.contains_glyph(glyph_id))
    }

    /// Locate the image of `glyph_id` in `CBDT`. `None` if this strike has no image for it.
    pub fn locate(&self, glyph_id: u16) -> Result<Option<GlyphLocation>, ParseError> {
        match self
            .index_sub_tables
            .iter()
            .find(|sub_table| sub_table.contains_glyph(glyph_id))
        {
            Some(sub_table) => sub_table.locate(glyph_id),
            None => Ok(None),
        }
    }
}

impl IndexSubTable<'_> {
    fn contains_glyph(&self, glyph_id: u16) -> bool {
        (self.first_glyph_index..=self.last_glyph_index).contains(&glyph_id)
    }

    fn locate(&self, glyph_id: u16) -> Result<Option<GlyphLocation>, ParseError> {
        let index = usize::from(glyph_id - self.first_glyph_index);
        let base = usize::safe_from(self.image_data_offset);
        let (start, end, big_metrics) = match &self.offsets {
            GlyphOffsets::Long(offsets) => (
                offsets.read_item(index).map(usize::safe_from)?,
                offsets.read_item(index + 1).map(usize::safe_from)?,
                None,
            ),
            GlyphOffsets::Short(offsets) => (
                offsets.read_item(index).map(usize::from)?,
                offsets.read_item(index + 1).map(usize::from)?,
                None,
            ),
            GlyphOffsets::Constant {
                image_size,
                big_metrics,
            } => {
                let image_size = usize::safe_from(*image_size);
                let start = index * image_size;
                (start, start + image_size, Some(*big_metrics))
            }
        };
        match end.checked_sub(start) {
            Some(0) => Ok(None),
            Some(length) => Ok(Some(GlyphLocation {
                image_format: self.image_format,
                offset: base + start,
                length,
                big_metrics,
            })),
            None => Err(ParseError::BadOffset),
        }
    }
}

impl ReadBinary for CbdtTable<'_> {
    type HostType<'a> = CbdtTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let data = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version((2..=3).contains(&major_version))?;
        let minor_version = ctxt.read_u16be()?;
        Ok(CbdtTable {
            major_version,
            minor_version,
            data,
        })
    }
}

impl<'a> CbdtTable<'a> {
    /// Extract the PNG image at `location`.
    pub fn glyph(&self, location: &GlyphLocation) -> Result<BitmapGlyph<'a>, ParseError> {
        let mut ctxt = self
            .data
            .offset_length(location.offset, location.length)?
            .ctxt();
        let metrics = match location.image_format {
            17 => GlyphMetrics::Small(ctxt.read::<SmallGlyphMetrics>()?),
            18 => GlyphMetrics::Big(ctxt.read::<BigGlyphMetrics>()?),
            19 => location
                .big_metrics
                .map(GlyphMetrics::Big)
                .unwrap_or(GlyphMetrics::None),
            format => return Err(ParseError::UnsupportedFormat(u32::from(format))),
        };
        let data_len = usize::safe_from(ctxt.read_u32be()?);
        let data = ctxt.read_slice(data_len)?;
        Ok(BitmapGlyph { metrics, data })
    }
}
