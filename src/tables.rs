//! OpenType font table parsing.
//!
//! The `sfnt` directory structures and the small fixed-layout tables live here. Larger tables
//! have their own modules.

pub mod cbdt;
pub mod cmap;
pub mod colr;
pub mod cpal;
pub mod glyf;
pub mod gsub;
pub mod kern;
pub mod loca;
pub mod os2;
pub mod post;
pub mod sbix;
pub mod svg;
pub mod variable_fonts;

use crate::binary::read::{ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, I32Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::tag;
use crate::{size, SafeFrom};

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Magic value identifying a CFF font (`OTTO`)
pub const CFF_MAGIC: u32 = tag::OTTO;

/// Magic number identifying TrueType 1.0
///
/// The version number 1.0 as a 16.16 fixed-point value, indicating TrueType glyph data.
pub const TTF_MAGIC: u32 = 0x00010000;

/// Magic value identifying a TrueType font collection `ttcf`
pub const TTCF_MAGIC: u32 = tag::TTCF;

/// `head` magic number.
const HEAD_MAGIC: u32 = 0x5F0F3CF5;

/// 32-bit signed fixed-point number (16.16)
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Fixed(i32);

/// The F2DOT14 format consists of a signed, 2’s complement integer and an unsigned fraction.
///
/// To compute the actual value, take the integer and add the fraction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct F2Dot14(i16);

/// Date represented in number of seconds since 12:00 midnight, January 1, 1904
type LongDateTime = i64;

/// The size of the offsets in the `loca` table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/loca>
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit. The actual local offset divided by 2 is stored.
    Short,
    /// Offsets are 32-bit. The actual local offset is stored.
    Long,
}

/// TrueType collection header
pub struct TTCHeader<'a> {
    pub major_version: u16,
    pub minor_version: u16,
    pub offset_tables: ReadArray<'a, U32Be>,
}

/// OpenType Offset Table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#table-directory>
#[derive(Clone)]
pub struct OffsetTable<'a> {
    pub sfnt_version: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: ReadArray<'a, TableRecord>,
}

/// An entry in the Offset Table
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    pub check_sum_adjustment: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: i16,
}

/// `hhea` horizontal header table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, PartialEq)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub num_h_metrics: u16,
}

/// `hmtx` horizontal metrics table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/hmtx>
#[derive(Debug)]
pub struct HmtxTable<'a> {
    num_glyphs: usize,
    pub h_metrics: ReadArray<'a, LongHorMetric>,
    pub left_side_bearings: ReadArray<'a, I16Be>,
}

/// A `longHorMetric` record in the `hmtx` table.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

/// `maxp` maximum profile
///
/// Fonts with CFF data use version 0.5 of this table, which only has the `num_glyphs` field.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxpTable {
    pub num_glyphs: u16,
    /// Extra fields, present if maxp table is version 1.0, absent if version 0.5.
    pub version1_sub_table: Option<MaxpVersion1SubTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxpVersion1SubTable {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

/// `name` table
///
/// This is the raw record structure. [crate::get_name] turns it into strings.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/name>
pub struct NameTable<'a> {
    pub string_storage: ReadScope<'a>,
    pub name_records: ReadArray<'a, NameRecord>,
    pub opt_langtag_records: Option<ReadArray<'a, LangTagRecord>>,
}

/// Record within the `name` table
#[derive(Debug, Copy, Clone)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub length: u16,
    pub offset: u16,
}

/// Language-tag record within the `name` table
#[derive(Debug, Copy, Clone)]
pub struct LangTagRecord {
    pub length: u16,
    pub offset: u16,
}

impl ReadBinary for TTCHeader<'_> {
    type HostType<'a> = TTCHeader<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let ttc_tag = ctxt.read_u32be()?;
        ctxt.check_version(ttc_tag == TTCF_MAGIC)?;
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1 || major_version == 2)?;
        let num_fonts = usize::safe_from(ctxt.read_u32be()?);
        let offset_tables = ctxt.read_array::<U32Be>(num_fonts)?;
        // Version 2 digital signature fields follow; they play no part in decoding.
        Ok(TTCHeader {
            major_version,
            minor_version,
            offset_tables,
        })
    }
}

impl ReadBinary for OffsetTable<'_> {
    type HostType<'a> = OffsetTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        match sfnt_version {
            TTF_MAGIC | CFF_MAGIC | tag::TRUE => {
                let num_tables = ctxt.read_u16be()?;
                let search_range = ctxt.read_u16be()?;
                let entry_selector = ctxt.read_u16be()?;
                let range_shift = ctxt.read_u16be()?;
                let table_records = ctxt.read_array::<TableRecord>(usize::from(num_tables))?;
                Ok(OffsetTable {
                    sfnt_version,
                    search_range,
                    entry_selector,
                    range_shift,
                    table_records,
                })
            }
            _ => Err(ParseError::BadVersion),
        }
    }
}

impl<'a> OffsetTable<'a> {
    /// Linearly scan the table records for `tag`.
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|table_record| table_record.table_tag == tag)
    }

    /// Return the scope of the table identified by `tag`, if present.
    ///
    /// `scope` must be the scope of the whole font file, since table offsets are relative to the
    /// start of the file, even within a collection.
    pub fn read_table(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<Option<ReadScope<'a>>, ParseError> {
        self.find_table_record(tag)
            .map(|table_record| table_record.read_table(scope))
            .transpose()
    }
}

impl ReadFrom for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));

    fn read_from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl TableRecord {
    pub const SIZE: usize = size::TABLE_RECORD;

    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        scope.offset_length(usize::safe_from(self.offset), usize::safe_from(self.length))
    }
}

impl ReadBinary for HeadTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        let font_revision = ctxt.read::<Fixed>()?;
        let check_sum_adjustment = ctxt.read_u32be()?;
        let magic_number = ctxt.read_u32be()?;
        ctxt.check(magic_number == HEAD_MAGIC)?;
        let flags = ctxt.read_u16be()?;
        let units_per_em = ctxt.read_u16be()?;
        let created = ctxt.read_i64be()?;
        let modified = ctxt.read_i64be()?;
        let x_min = ctxt.read_i16be()?;
        let y_min = ctxt.read_i16be()?;
        let x_max = ctxt.read_i16be()?;
        let y_max = ctxt.read_i16be()?;
        let mac_style = ctxt.read_u16be()?;
        let lowest_rec_ppem = ctxt.read_u16be()?;
        let font_direction_hint = ctxt.read_i16be()?;
        let index_to_loc_format = ctxt.read::<IndexToLocFormat>()?;
        let glyph_data_format = ctxt.read_i16be()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl HeadTable {
    // macStyle bit 0: bold, bit 1: italic
    pub fn is_bold(&self) -> bool {
        self.mac_style & 1 != 0
    }

    pub fn is_italic(&self) -> bool {
        self.mac_style & 2 != 0
    }
}

impl ReadBinary for HheaTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        let min_left_side_bearing = ctxt.read_i16be()?;
        let min_right_side_bearing = ctxt.read_i16be()?;
        let x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        let _reserved = ctxt.read_slice(4 * size::I16)?;
        let metric_data_format = ctxt.read_i16be()?;
        ctxt.check(metric_data_format == 0)?;
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            num_h_metrics,
        })
    }
}

impl ReadBinaryDep for HmtxTable<'_> {
    type Args<'a> = (usize, usize); // num_glyphs, num_h_metrics
    type HostType<'a> = HmtxTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, num_h_metrics): (usize, usize),
    ) -> Result<Self::HostType<'a>, ParseError> {
        ctxt.check(num_h_metrics > 0 || num_glyphs == 0)?;
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
        let left_side_bearings =
            ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;

        Ok(HmtxTable {
            num_glyphs,
            h_metrics,
            left_side_bearings,
        })
    }
}

impl HmtxTable<'_> {
    /// The advance width of `glyph_id`.
    ///
    /// When there are fewer metrics than glyphs the last advance applies to all remaining glyphs.
    pub fn horizontal_advance(&self, glyph_id: u16) -> Result<u16, ParseError> {
        let glyph_index = usize::from(glyph_id);
        if glyph_index >= self.num_glyphs {
            return Err(ParseError::BadIndex);
        }
        self.h_metrics
            .get_item(glyph_index)
            .or_else(|| self.h_metrics.last())
            .map(|metric| metric.advance_width)
            .ok_or(ParseError::BadIndex)
    }

    /// The left side bearing of `glyph_id`.
    pub fn left_side_bearing(&self, glyph_id: u16) -> Result<i16, ParseError> {
        let glyph_index = usize::from(glyph_id);
        if let Some(metric) = self.h_metrics.get_item(glyph_index) {
            return Ok(metric.lsb);
        }
        self.left_side_bearings
            .get_item(glyph_index - self.h_metrics.len())
            .ok_or(ParseError::BadIndex)
    }

    /// The advance widths of every glyph in the font, expanding the trailing run.
    pub fn advance_widths(&self) -> Vec<u16> {
        let last = self.h_metrics.last().map_or(0, |metric| metric.advance_width);
        let mut advances = Vec::with_capacity(self.num_glyphs);
        advances.extend(self.h_metrics.iter().map(|metric| metric.advance_width));
        advances.resize(self.num_glyphs, last);
        advances
    }

    pub fn num_glyphs(&self) -> usize {
        self.num_glyphs
    }
}

impl ReadFrom for LongHorMetric {
    type ReadType = (U16Be, I16Be);

    fn read_from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

impl ReadBinary for MaxpTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        let num_glyphs = ctxt.read_u16be()?;
        let version1_sub_table = match version {
            0x00010000 => Some(ctxt.read::<MaxpVersion1SubTable>()?),
            0x00005000 => None,
            _ => return Err(ParseError::BadVersion),
        };

        Ok(MaxpTable {
            num_glyphs,
            version1_sub_table,
        })
    }
}

impl ReadBinary for MaxpVersion1SubTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let max_points = ctxt.read_u16be()?;
        let max_contours = ctxt.read_u16be()?;
        let max_composite_points = ctxt.read_u16be()?;
        let max_composite_contours = ctxt.read_u16be()?;
        let max_zones = ctxt.read_u16be()?;
        let max_twilight_points = ctxt.read_u16be()?;
        let max_storage = ctxt.read_u16be()?;
        let max_function_defs = ctxt.read_u16be()?;
        let max_instruction_defs = ctxt.read_u16be()?;
        let max_stack_elements = ctxt.read_u16be()?;
        let max_size_of_instructions = ctxt.read_u16be()?;
        let max_component_elements = ctxt.read_u16be()?;
        let max_component_depth = ctxt.read_u16be()?;

        Ok(MaxpVersion1SubTable {
            max_points,
            max_contours,
            max_composite_points,
            max_composite_contours,
            max_zones,
            max_twilight_points,
            max_storage,
            max_function_defs,
            max_instruction_defs,
            max_stack_elements,
            max_size_of_instructions,
            max_component_elements,
            max_component_depth,
        })
    }
}

impl ReadBinary for NameTable<'_> {
    type HostType<'a> = NameTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format <= 1)?;
        let count = usize::from(ctxt.read_u16be()?);
        let string_offset = usize::from(ctxt.read_u16be()?);
        let string_storage = scope.offset(string_offset);
        let name_records = ctxt.read_array::<NameRecord>(count)?;
        let opt_langtag_records = if format > 0 {
            let langtag_count = usize::from(ctxt.read_u16be()?);
            Some(ctxt.read_array::<LangTagRecord>(langtag_count)?)
        } else {
            None
        };

        Ok(NameTable {
            string_storage,
            name_records,
            opt_langtag_records,
        })
    }
}

impl<'a> NameTable<'a> {
    /// The raw bytes of a name record's string.
    pub fn string_data(&self, record: &NameRecord) -> Result<&'a [u8], ParseError> {
        self.string_storage
            .offset_length(usize::from(record.offset), usize::from(record.length))
            .map(|scope| scope.data())
    }
}

impl ReadFrom for NameRecord {
    type ReadType = ((U16Be, U16Be, U16Be), (U16Be, U16Be, U16Be));

    fn read_from(
        ((platform_id, encoding_id, language_id), (name_id, length, offset)): (
            (u16, u16, u16),
            (u16, u16, u16),
        ),
    ) -> Self {
        NameRecord {
            platform_id,
            encoding_id,
            language_id,
            name_id,
            length,
            offset,
        }
    }
}

impl ReadFrom for LangTagRecord {
    type ReadType = (U16Be, U16Be);

    fn read_from((length, offset): (u16, u16)) -> Self {
        LangTagRecord { length, offset }
    }
}

impl ReadBinary for IndexToLocFormat {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        match ctxt.read_i16be()? {
            0 => Ok(IndexToLocFormat::Short),
            1 => Ok(IndexToLocFormat::Long),
            _ => Err(ParseError::BadValue),
        }
    }
}

impl Fixed {
    /// Construct from the raw 16.16 value.
    pub const fn from_raw(value: i32) -> Fixed {
        Fixed(value)
    }

    /// Construct from a whole number.
    pub const fn from_int(value: i16) -> Fixed {
        Fixed((value as i32) << 16)
    }

    pub const fn raw_value(self) -> i32 {
        self.0
    }
}

impl ReadFrom for Fixed {
    type ReadType = I32Be;

    fn read_from(value: i32) -> Self {
        Fixed(value)
    }
}

impl From<Fixed> for f32 {
    fn from(value: Fixed) -> f32 {
        (f64::from(value.0) / 65536.0) as f32
    }
}

impl From<f32> for Fixed {
    fn from(value: f32) -> Fixed {
        Fixed((value * 65536.0).round() as i32)
    }
}

impl From<F2Dot14> for Fixed {
    fn from(value: F2Dot14) -> Fixed {
        Fixed(i32::from(value.0) << 2)
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Fixed) -> Fixed {
        let product = (i64::from(self.0) * i64::from(rhs.0) + 0x8000) >> 16;
        Fixed(product as i32)
    }
}

impl Div for Fixed {
    type Output = Fixed;

    /// Division by zero yields zero.
    fn div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            return Fixed(0);
        }
        let quotient = (i64::from(self.0) << 16) / i64::from(rhs.0);
        Fixed(quotient.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", f32::from(*self))
    }
}

impl F2Dot14 {
    pub const ZERO: F2Dot14 = F2Dot14(0);
    pub const ONE: F2Dot14 = F2Dot14(0x4000);
    pub const NEG_ONE: F2Dot14 = F2Dot14(-0x4000);

    /// Construct from the raw 2.14 value.
    pub const fn from_raw(value: i16) -> F2Dot14 {
        F2Dot14(value)
    }

    pub const fn raw_value(self) -> i16 {
        self.0
    }
}

impl ReadFrom for F2Dot14 {
    type ReadType = I16Be;

    fn read_from(value: i16) -> Self {
        F2Dot14(value)
    }
}

impl From<F2Dot14> for f32 {
    fn from(value: F2Dot14) -> Self {
        f32::from(value.0) / 16384.0
    }
}

impl From<f32> for F2Dot14 {
    fn from(value: f32) -> Self {
        F2Dot14((value.clamp(-2.0, 1.999_94) * 16384.0).round() as i16)
    }
}

impl From<Fixed> for F2Dot14 {
    /// Convert 16.16 to 2.14, rounding. The value is expected to be in the range -2..2.
    fn from(value: Fixed) -> Self {
        let rounded = (value.0 + 2) >> 2;
        F2Dot14(rounded.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)
    }
}

impl PartialOrd for F2Dot14 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for F2Dot14 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for F2Dot14 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F2Dot14({})", f32::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < f32::EPSILON,
            "{} != {}",
            actual,
            expected
        );
    }

    #[test]
    fn f32_from_f2dot14() {
        // Examples from https://learn.microsoft.com/en-us/typography/opentype/spec/otff#data-types
        assert_close(f32::from(F2Dot14::from_raw(0x7fff)), 1.999939);
        assert_close(f32::from(F2Dot14::from_raw(0x7000)), 1.75);
        assert_close(f32::from(F2Dot14::from_raw(0x0001)), 0.0000610);
        assert_close(f32::from(F2Dot14::from_raw(0x0000)), 0.0);
        assert_close(f32::from(F2Dot14::from_raw(-1)), -0.000061);
        assert_close(f32::from(F2Dot14::from_raw(-0x8000)), -2.0);
    }

    #[test]
    fn f32_from_fixed() {
        assert_close(f32::from(Fixed::from_raw(0x7fff_ffff)), 32768.0);
        assert_close(f32::from(Fixed::from_raw(0x0001_0000)), 1.0);
        assert_close(f32::from(Fixed::from_raw(-0x0001_8000)), -1.5);
    }

    #[test]
    fn fixed_arithmetic() {
        let a = Fixed::from(2.5f32);
        let b = Fixed::from_int(2);
        assert_eq!(a + b, Fixed::from(4.5f32));
        assert_eq!(a - b, Fixed::from(0.5f32));
        assert_eq!(a * b, Fixed::from(5.0f32));
        assert_eq!(a / b, Fixed::from(1.25f32));
        assert_eq!(-a, Fixed::from(-2.5f32));
        assert_eq!(a / Fixed::from_int(0), Fixed::from_int(0));
        assert_eq!(
            F2Dot14::from(Fixed::from(0.5f32)),
            F2Dot14::from_raw(0x2000)
        );
    }

    #[test]
    fn hmtx_repeats_last_advance() {
        let data = writer::convert(&[
            UInt16(500),
            Int16(10),
            UInt16(600),
            Int16(20),
            Int16(30),
            Int16(-5),
        ]);
        let hmtx = ReadScope::new(&data)
            .read_dep::<HmtxTable<'_>>((4, 2))
            .unwrap();
        assert_eq!(hmtx.horizontal_advance(0).unwrap(), 500);
        assert_eq!(hmtx.horizontal_advance(3).unwrap(), 600);
        assert_eq!(hmtx.left_side_bearing(1).unwrap(), 20);
        assert_eq!(hmtx.left_side_bearing(3).unwrap(), -5);
        assert_eq!(hmtx.advance_widths(), vec![500, 600, 600, 600]);
        assert_eq!(hmtx.horizontal_advance(4), Err(ParseError::BadIndex));
    }

    #[test]
    fn head_rejects_bad_magic() {
        let mut data = crate::tests::head_table(0, 1000);
        data[12] = 0;
        assert_eq!(
            ReadScope::new(&data).read::<HeadTable>(),
            Err(ParseError::BadValue)
        );
    }

    #[test]
    fn head_is_54_bytes() {
        let data = crate::tests::head_table(1, 2048);
        assert_eq!(data.len(), size::HEAD_TABLE);
        let head = ReadScope::new(&data).read::<HeadTable>().unwrap();
        assert_eq!(head.units_per_em, 2048);
        assert_eq!(head.index_to_loc_format, IndexToLocFormat::Long);
        assert!(ReadScope::new(&data[..53]).read::<HeadTable>().is_err());
    }

    #[test]
    fn find_table_record_scans_directory() {
        let data = writer::convert(&[
            TrueTypeMagic,
            UInt16(2),
            UInt16(32),
            UInt16(1),
            UInt16(0),
            UInt32(tag::HEAD),
            UInt32(0),
            UInt32(44),
            UInt32(2),
            UInt32(tag::NAME),
            UInt32(0),
            UInt32(46),
            UInt32(2),
            UInt16(0xAAAA),
            UInt16(0xBBBB),
        ]);
        let scope = ReadScope::new(&data);
        let offset_table = scope.read::<OffsetTable<'_>>().unwrap();
        let name = offset_table.read_table(&scope, tag::NAME).unwrap().unwrap();
        assert_eq!(name.data(), &[0xBB, 0xBB]);
        assert!(offset_table.find_table_record(tag::GLYF).is_none());
    }
}
