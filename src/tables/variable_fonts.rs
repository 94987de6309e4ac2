#![deny(missing_docs)]

//! Structures shared by the variable font tables.
//!
//! The tuple variation store used by `gvar`, the item variation store and delta-set index maps
//! used by `HVAR`, and the region scalar both are evaluated with.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats>

use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;
use std::iter;

use log::warn;

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFixedSizeDep, ReadFrom, ReadScope,
    ReadUnchecked,
};
use crate::binary::{I16Be, U16Be, U32Be, I8, U8};
use crate::error::ParseError;
use crate::tables::{F2Dot14, Fixed};
use crate::SafeFrom;

pub mod avar;
pub mod fvar;
pub mod gvar;
pub mod hvar;
pub mod stat;

/// Flag indicating that some or all tuple variation tables reference a shared set of “point”
/// numbers.
const SHARED_POINT_NUMBERS: u16 = 0x8000;
/// Mask for the low bits to give the number of tuple variation tables.
const COUNT_MASK: u16 = 0x0FFF;
/// Flag indicating that the point numbers of a run are stored as uint16.
const POINTS_ARE_WORDS: u8 = 0x80;
/// Mask for the low 7 bits of the control byte to give the number of point numbers in the run,
/// minus 1.
const POINT_RUN_COUNT_MASK: u8 = 0x7F;

/// Flag indicating that this tuple variation header includes an embedded peak tuple record.
///
/// If set, the low 12 bits of the tupleIndex value are ignored.
const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
/// Flag indicating that the header includes start and end tuples for an intermediate region.
const INTERMEDIATE_REGION: u16 = 0x4000;
/// Flag indicating that the serialized data for this tuple variation table includes packed
/// point number data.
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;
/// Mask for the low 12 bits to give the shared tuple records index.
const TUPLE_INDEX_MASK: u16 = 0x0FFF;

/// Flag indicating that the deltas of this run are all zero and not stored.
const DELTAS_ARE_ZERO: u8 = 0x80;
/// Flag indicating that the run contains int16 deltas rather than int8.
const DELTAS_ARE_WORDS: u8 = 0x40;
/// Mask for the low 6 bits to provide the number of delta values in the run, minus one.
const DELTA_RUN_COUNT_MASK: u8 = 0x3F;

/// `wordDeltaCount` flag selecting int32/int16 deltas instead of int16/int8.
const LONG_WORDS: u16 = 0x8000;
/// Mask for the count of word deltas in `wordDeltaCount`.
const WORD_DELTA_COUNT_MASK: u16 = 0x7FFF;

/// `entryFormat` mask for the number of bits of the inner index, minus one.
const INNER_INDEX_BIT_COUNT_MASK: u8 = 0x0F;
/// `entryFormat` mask for the size of a map entry in bytes, minus one.
const MAP_ENTRY_SIZE_MASK: u8 = 0x30;

/// Coordinate array specifying a position within the font’s variation space.
///
/// The number of elements matches the axisCount of the `fvar` table.
pub type Tuple<'a> = ReadArray<'a, F2Dot14>;

/// A position in the font's variation space in user (design) coordinates.
#[derive(Debug, Clone)]
pub struct UserTuple<'a>(pub ReadArray<'a, Fixed>);

/// How out-of-range indices in variation data are handled.
///
/// Production fonts occasionally carry `HVAR` or `gvar` indices that point past the data they
/// index. `Degrade` substitutes a zero delta and logs a warning, `Strict` fails the lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum IndirectionPolicy {
    /// Substitute zero deltas and log a warning.
    #[default]
    Degrade,
    /// Fail with `ParseError::BadIndex`.
    Strict,
}

/// The start, peak and end of a region on one axis.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#variation-regions>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegionAxisCoordinates {
    /// The region start coordinate value for the current axis.
    pub start_coord: F2Dot14,
    /// The region peak coordinate value for the current axis.
    pub peak_coord: F2Dot14,
    /// The region end coordinate value for the current axis.
    pub end_coord: F2Dot14,
}

/// The variation regions of an item variation store.
pub struct VariationRegionList<'a> {
    /// The number of variation axes for this font.
    pub axis_count: u16,
    regions: ReadArray<'a, VariationRegion<'a>>,
}

/// A region of the variation space: one set of coordinates per axis.
#[derive(Clone)]
pub struct VariationRegion<'a> {
    region_axes: ReadArray<'a, RegionAxisCoordinates>,
}

/// Item Variation Store.
///
/// Holds delta sets for scalar values, addressed by an outer index selecting an
/// [ItemVariationData] subtable and an inner index selecting a row in it.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#item-variation-store>
pub struct ItemVariationStore<'a> {
    /// Format of the store, always 1.
    pub format: u16,
    variation_region_list: VariationRegionList<'a>,
    item_variation_data: Vec<ItemVariationData<'a>>,
}

/// A subtable of delta sets sharing the same regions.
pub struct ItemVariationData<'a> {
    item_count: u16,
    word_delta_count: u16,
    region_indexes: ReadArray<'a, U16Be>,
    delta_sets: &'a [u8],
}

struct DeltaSetIter<'a> {
    ctxt: ReadCtxt<'a>,
    word_delta_count: usize,
    long_words: bool,
    len: usize,
    pos: usize,
}

/// Maps glyph ids (or other item ids) to delta-set indices of an item variation store.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#associating-target-items-to-variation-data>
pub struct DeltaSetIndexMap<'a> {
    /// Format 0 stores a 16-bit map count, format 1 a 32-bit one.
    pub format: u8,
    entry_format: u8,
    map_count: u32,
    map_data: &'a [u8],
}

/// An outer/inner index pair into an [ItemVariationStore].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeltaSetIndexMapEntry {
    /// Index of the item variation data subtable.
    pub outer_index: u16,
    /// Row within the item variation data subtable.
    pub inner_index: u16,
}

/// Tuple Variation Store.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#tuple-variation-store-header>
pub struct TupleVariationStore<'a> {
    /// The number of points in the glyph this store is for, phantom points included.
    num_points: u32,
    /// Point numbers shared by every tuple variation table without private numbers.
    shared_point_numbers: Option<PointNumbers>,
    tuple_variation_headers: Vec<TupleVariationHeader<'a>>,
}

/// Tuple variation header.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#tuplevariationheader>
pub struct TupleVariationHeader<'a> {
    /// The size in bytes of the serialized data for this tuple variation table.
    variation_data_size: u16,
    /// Flags in the high 4 bits, shared tuple index in the low 12 bits.
    tuple_flags_and_index: u16,
    peak_tuple: Option<Tuple<'a>>,
    intermediate_region: Option<(Tuple<'a>, Tuple<'a>)>,
    /// The serialized data for this tuple variation table.
    data: &'a [u8],
}

/// Glyph variation data.
///
/// (x, y) deltas for numbered points.
pub struct GvarVariationData<'a> {
    point_numbers: Cow<'a, PointNumbers>,
    x_coord_deltas: Vec<i16>,
    y_coord_deltas: Vec<i16>,
}

/// The points a tuple variation table provides deltas for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointNumbers {
    /// Every point of the glyph, phantom points included.
    All(u32),
    /// An explicit, ascending list of point numbers.
    Specific(Vec<u16>),
}

struct PointNumbersIter<'a> {
    numbers: &'a PointNumbers,
    index: usize,
}

impl IndirectionPolicy {
    /// Resolve an out-of-range index: logs and returns `Ok` when degrading.
    pub(crate) fn out_of_range(self, what: fmt::Arguments<'_>) -> Result<(), ParseError> {
        match self {
            IndirectionPolicy::Degrade => {
                warn!("{}, using a zero delta", what);
                Ok(())
            }
            IndirectionPolicy::Strict => Err(ParseError::BadIndex),
        }
    }
}

impl UserTuple<'_> {
    /// Iterate over the axis values in this user tuple.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Fixed> + '_ {
        self.0.iter()
    }
}

impl ReadFrom for RegionAxisCoordinates {
    type ReadType = (F2Dot14, F2Dot14, F2Dot14);

    fn read_from((start_coord, peak_coord, end_coord): (F2Dot14, F2Dot14, F2Dot14)) -> Self {
        RegionAxisCoordinates {
            start_coord,
            peak_coord,
            end_coord,
        }
    }
}

impl RegionAxisCoordinates {
    /// The region of a peak without an intermediate region: from zero to the peak.
    pub fn from_peak(peak_coord: F2Dot14) -> Self {
        RegionAxisCoordinates {
            start_coord: peak_coord.min(F2Dot14::ZERO),
            peak_coord,
            end_coord: peak_coord.max(F2Dot14::ZERO),
        }
    }

    /// The tent function of this axis evaluated at the normalized coordinate `coord`.
    ///
    /// Axes whose coordinates are invalid or whose peak is zero do not participate and yield 1.
    pub fn scalar(&self, coord: F2Dot14) -> f32 {
        let RegionAxisCoordinates {
            start_coord: start,
            peak_coord: peak,
            end_coord: end,
        } = *self;
        if start > peak
            || peak > end
            || peak == F2Dot14::ZERO
            || (start < F2Dot14::ZERO && end > F2Dot14::ZERO)
        {
            1.0
        } else if coord < start || coord > end {
            0.0
        } else if coord == peak {
            1.0
        } else if coord < peak {
            (f32::from(coord) - f32::from(start)) / (f32::from(peak) - f32::from(start))
        } else {
            (f32::from(end) - f32::from(coord)) / (f32::from(end) - f32::from(peak))
        }
    }
}

/// The scalar of a region at the normalized position `coords`.
///
/// This is the product of the per-axis tents. Axes missing from `coords` are at the default
/// (zero).
pub fn region_scalar(
    region: impl IntoIterator<Item = RegionAxisCoordinates>,
    coords: &[F2Dot14],
) -> f32 {
    let mut scalar = 1.0;
    for (i, axis) in region.into_iter().enumerate() {
        let coord = coords.get(i).copied().unwrap_or(F2Dot14::ZERO);
        let axis_scalar = axis.scalar(coord);
        if axis_scalar == 0.0 {
            return 0.0;
        }
        scalar *= axis_scalar;
    }
    scalar
}

impl ReadBinary for VariationRegionList<'_> {
    type HostType<'a> = VariationRegionList<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let axis_count = ctxt.read_u16be()?;
        let region_count = ctxt.read_u16be()?;
        let regions =
            ctxt.read_array_dep::<VariationRegion<'_>>(usize::from(region_count), axis_count)?;
        Ok(VariationRegionList {
            axis_count,
            regions,
        })
    }
}

impl<'a> VariationRegionList<'a> {
    /// The number of regions in the list.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// The region at `index`.
    pub fn region(&self, index: usize) -> Result<VariationRegion<'a>, ParseError> {
        self.regions.read_item(index)
    }
}

impl ReadBinaryDep for VariationRegion<'_> {
    type Args<'a> = u16;
    type HostType<'a> = VariationRegion<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        axis_count: u16,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let region_axes = ctxt.read_array(usize::from(axis_count))?;
        Ok(VariationRegion { region_axes })
    }
}

impl ReadFixedSizeDep for VariationRegion<'_> {
    fn size(axis_count: u16) -> usize {
        usize::from(axis_count) * RegionAxisCoordinates::SIZE
    }
}

impl VariationRegion<'_> {
    /// Iterate over the per-axis coordinates of this region.
    pub fn region_axes(&self) -> impl Iterator<Item = RegionAxisCoordinates> + '_ {
        self.region_axes.iter()
    }

    /// The scalar of this region at the normalized position `coords`.
    pub fn scalar(&self, coords: &[F2Dot14]) -> f32 {
        region_scalar(self.region_axes.iter(), coords)
    }
}

impl ReadBinary for ItemVariationStore<'_> {
    type HostType<'a> = ItemVariationStore<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let format = ctxt.read_u16be()?;
        ctxt.check_version(format == 1)?;
        let variation_region_list_offset = ctxt.read_u32be()?;
        let item_variation_data_count = ctxt.read_u16be()?;
        let item_variation_data_offsets =
            ctxt.read_array::<U32Be>(usize::from(item_variation_data_count))?;
        let variation_region_list = scope
            .offset(usize::safe_from(variation_region_list_offset))
            .read::<VariationRegionList<'_>>()?;
        let item_variation_data = item_variation_data_offsets
            .iter()
            .map(|offset| {
                scope
                    .offset(usize::safe_from(offset))
                    .read::<ItemVariationData<'_>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ItemVariationStore {
            format,
            variation_region_list,
            item_variation_data,
        })
    }
}

impl<'a> ItemVariationStore<'a> {
    /// The number of axes the regions of this store are defined over.
    pub fn axis_count(&self) -> u16 {
        self.variation_region_list.axis_count
    }

    /// The variation regions of this store.
    pub fn regions(&self) -> &VariationRegionList<'a> {
        &self.variation_region_list
    }

    /// The item variation data subtables.
    pub fn item_variation_data(&self) -> &[ItemVariationData<'a>] {
        &self.item_variation_data
    }

    /// Calculate the adjustment for the delta set `entry` at the normalized position `coords`.
    ///
    /// Indices past the end of the store, and region indices past the end of the region list,
    /// are resolved according to `policy`.
    pub fn adjustment(
        &self,
        entry: DeltaSetIndexMapEntry,
        coords: &[F2Dot14],
        policy: IndirectionPolicy,
    ) -> Result<f32, ParseError> {
        let data = match self.item_variation_data.get(usize::from(entry.outer_index)) {
            Some(data) => data,
            None => {
                policy.out_of_range(format_args!(
                    "item variation data {} of {} out of range",
                    entry.outer_index,
                    self.item_variation_data.len()
                ))?;
                return Ok(0.0);
            }
        };
        let deltas = match data.delta_set(entry.inner_index) {
            Some(deltas) => deltas,
            None => {
                policy.out_of_range(format_args!(
                    "delta set {} of {} out of range",
                    entry.inner_index, data.item_count
                ))?;
                return Ok(0.0);
            }
        };

        let mut adjustment = 0.0;
        for (region_index, delta) in data.region_indexes.iter().zip(deltas) {
            let region_index = usize::from(region_index);
            if region_index >= self.variation_region_list.region_count() {
                policy.out_of_range(format_args!(
                    "variation region {} out of range",
                    region_index
                ))?;
                continue;
            }
            let region = self.variation_region_list.region(region_index)?;
            let scalar = region.scalar(coords);
            if scalar != 0.0 {
                adjustment += scalar * delta as f32;
            }
        }
        Ok(adjustment)
    }
}

impl ReadBinary for ItemVariationData<'_> {
    type HostType<'a> = ItemVariationData<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let item_count = ctxt.read_u16be()?;
        let word_delta_count = ctxt.read_u16be()?;
        let region_index_count = ctxt.read_u16be()?;
        let word_count = word_delta_count & WORD_DELTA_COUNT_MASK;
        ctxt.check(word_count <= region_index_count)?;
        let region_indexes = ctxt.read_array::<U16Be>(usize::from(region_index_count))?;
        let row_size = row_size(word_delta_count, region_index_count);
        let delta_sets = ctxt.read_slice(usize::from(item_count) * row_size)?;

        Ok(ItemVariationData {
            item_count,
            word_delta_count,
            region_indexes,
            delta_sets,
        })
    }
}

/// The size of a delta-set row.
///
/// The first `word_count` deltas are int16 (int32 with long words), the rest int8 (int16).
fn row_size(word_delta_count: u16, region_index_count: u16) -> usize {
    let word_count = usize::from(word_delta_count & WORD_DELTA_COUNT_MASK);
    let short_count = usize::from(region_index_count) - word_count;
    if word_delta_count & LONG_WORDS != 0 {
        word_count * 4 + short_count * 2
    } else {
        word_count * 2 + short_count
    }
}

impl<'a> ItemVariationData<'a> {
    /// The number of delta sets (rows) in this subtable.
    pub fn item_count(&self) -> u16 {
        self.item_count
    }

    /// Indices into the region list for the columns of each delta set.
    pub fn region_indexes(&self) -> &ReadArray<'a, U16Be> {
        &self.region_indexes
    }

    /// The per-region deltas of row `inner_index`, or `None` if there is no such row.
    pub fn delta_set(&self, inner_index: u16) -> Option<impl Iterator<Item = i32> + 'a> {
        if inner_index >= self.item_count {
            return None;
        }
        let len = self.region_indexes.len();
        // NOTE(cast): region_indexes was read from a u16 count
        let row_size = row_size(self.word_delta_count, len as u16);
        let offset = usize::from(inner_index) * row_size;
        let ctxt = ReadScope::new(self.delta_sets.get(offset..)?).ctxt();
        Some(DeltaSetIter {
            ctxt,
            word_delta_count: usize::from(self.word_delta_count & WORD_DELTA_COUNT_MASK),
            long_words: self.word_delta_count & LONG_WORDS != 0,
            len,
            pos: 0,
        })
    }
}

impl Iterator for DeltaSetIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.pos >= self.len {
            return None;
        }
        let is_word = self.pos < self.word_delta_count;
        self.pos += 1;
        let delta = match (is_word, self.long_words) {
            (true, true) => self.ctxt.read_i32be(),
            (true, false) | (false, true) => self.ctxt.read_i16be().map(i32::from),
            (false, false) => self.ctxt.read_i8().map(i32::from),
        };
        delta.ok()
    }
}

impl ReadBinary for DeltaSetIndexMap<'_> {
    type HostType<'a> = DeltaSetIndexMap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let format = ctxt.read_u8()?;
        let entry_format = ctxt.read_u8()?;
        let map_count = match format {
            0 => u32::from(ctxt.read_u16be()?),
            1 => ctxt.read_u32be()?,
            _ => return Err(ParseError::BadVersion),
        };
        let entry_size = usize::from(entry_size(entry_format));
        let map_data = ctxt.read_slice(usize::safe_from(map_count) * entry_size)?;

        Ok(DeltaSetIndexMap {
            format,
            entry_format,
            map_count,
            map_data,
        })
    }
}

fn entry_size(entry_format: u8) -> u8 {
    ((entry_format & MAP_ENTRY_SIZE_MASK) >> 4) + 1
}

impl DeltaSetIndexMap<'_> {
    /// The number of entries in the map.
    pub fn map_count(&self) -> u32 {
        self.map_count
    }

    /// The number of bits of each entry holding the inner index.
    pub fn inner_bit_count(&self) -> u32 {
        u32::from(self.entry_format & INNER_INDEX_BIT_COUNT_MASK) + 1
    }

    /// Look up the delta set of item `index`.
    ///
    /// Indices past the end of the map use the last entry. An empty map fails with
    /// `ParseError::BadIndex`.
    pub fn entry(&self, index: u32) -> Result<DeltaSetIndexMapEntry, ParseError> {
        let last = self.map_count.checked_sub(1).ok_or(ParseError::BadIndex)?;
        let index = usize::safe_from(index.min(last));
        let entry_size = entry_size(self.entry_format);
        let mut ctxt = ReadScope::new(self.map_data)
            .offset(index * usize::from(entry_size))
            .ctxt();
        let entry = match entry_size {
            1 => u32::from(ctxt.read_u8()?),
            2 => u32::from(ctxt.read_u16be()?),
            3 => ctxt.read_u24be()?,
            _ => ctxt.read_u32be()?,
        };
        let bit_count = self.inner_bit_count();
        // NOTE(cast): at most 16 bits of inner index; the outer index is at most 32 - 1 bits
        // but only 16-bit outer indices address a store
        Ok(DeltaSetIndexMapEntry {
            outer_index: (entry >> bit_count) as u16,
            inner_index: (entry & ((1 << bit_count) - 1)) as u16,
        })
    }
}

impl ReadBinaryDep for TupleVariationStore<'_> {
    type Args<'a> = (u16, u32);
    type HostType<'a> = TupleVariationStore<'a>;

    /// Read a tuple variation store for a glyph with `num_points` points, phantom points
    /// included, in a font with `axis_count` axes.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (axis_count, num_points): (u16, u32),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let axis_count = usize::from(axis_count);

        let scope = ctxt.scope();
        let tuple_variation_flags_and_count = ctxt.read_u16be()?;
        let tuple_variation_count = usize::from(tuple_variation_flags_and_count & COUNT_MASK);
        let data_offset = ctxt.read_u16be()?;

        let mut tuple_variation_headers = (0..tuple_variation_count)
            .map(|_| ctxt.read_dep::<TupleVariationHeader<'_>>(axis_count))
            .collect::<Result<Vec<_>, _>>()?;

        let mut data_ctxt = scope.offset(usize::from(data_offset)).ctxt();

        let shared_point_numbers = ((tuple_variation_flags_and_count & SHARED_POINT_NUMBERS)
            == SHARED_POINT_NUMBERS)
            .then(|| read_packed_point_numbers(&mut data_ctxt, num_points))
            .transpose()?;

        for header in tuple_variation_headers.iter_mut() {
            header.data = data_ctxt.read_slice(usize::from(header.variation_data_size))?;
        }

        Ok(TupleVariationStore {
            num_points,
            shared_point_numbers,
            tuple_variation_headers,
        })
    }
}

impl<'a> TupleVariationStore<'a> {
    /// The tuple variation headers of this store.
    pub fn headers(&self) -> &[TupleVariationHeader<'a>] {
        &self.tuple_variation_headers
    }

    /// Retrieve the variation data for the variation tuple at the given index.
    pub fn variation_data(&self, index: u16) -> Result<GvarVariationData<'_>, ParseError> {
        let header = self
            .tuple_variation_headers
            .get(usize::from(index))
            .ok_or(ParseError::BadIndex)?;
        header.variation_data(self.num_points, self.shared_point_numbers.as_ref())
    }
}

impl PointNumbers {
    /// Returns the number of point numbers contained by this value
    pub fn len(&self) -> usize {
        match self {
            PointNumbers::All(n) => usize::safe_from(*n),
            PointNumbers::Specific(vec) => vec.len(),
        }
    }

    /// Whether there are no point numbers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the point numbers contained by this value.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        PointNumbersIter {
            numbers: self,
            index: 0,
        }
    }
}

impl Iterator for PointNumbersIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.numbers.len() {
            return None;
        }

        let index = self.index;
        self.index += 1;
        match self.numbers {
            PointNumbers::All(_n) => u32::try_from(index).ok(),
            PointNumbers::Specific(numbers) => numbers.get(index).copied().map(u32::from),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.numbers.len() - self.index;
        (remaining, Some(remaining))
    }
}

/// Read packed point numbers for a glyph with `num_points` points.
///
/// Point numbers are stored as differences from the previous number, and the running total
/// carries across runs.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-point-numbers>
fn read_packed_point_numbers(
    ctxt: &mut ReadCtxt<'_>,
    num_points: u32,
) -> Result<PointNumbers, ParseError> {
    let count = read_count(ctxt)?;
    if count == 0 {
        return Ok(PointNumbers::All(num_points));
    }

    let mut num_read = 0;
    let mut last = 0u16;
    let mut point_numbers = Vec::with_capacity(usize::from(count));
    while num_read < count {
        let control_byte = ctxt.read_u8()?;
        let point_run_count = u16::from(control_byte & POINT_RUN_COUNT_MASK) + 1;
        let mut push = |diff: u16| {
            last = last.wrapping_add(diff);
            point_numbers.push(last);
        };
        if (control_byte & POINTS_ARE_WORDS) == POINTS_ARE_WORDS {
            let array = ctxt.read_array::<U16Be>(usize::from(point_run_count))?;
            array.iter().for_each(&mut push);
        } else {
            let array = ctxt.read_array::<U8>(usize::from(point_run_count))?;
            array.iter().map(u16::from).for_each(&mut push);
        }
        num_read += point_run_count;
    }
    Ok(PointNumbers::Specific(point_numbers))
}

// The count is stored in one or two bytes. Zero means all points. With the high bit of the first
// byte set the count is the two bytes as a big-endian u16 with that bit masked out.
fn read_count(ctxt: &mut ReadCtxt<'_>) -> Result<u16, ParseError> {
    let count1 = u16::from(ctxt.read_u8()?);
    let count = match count1 {
        0..=127 => count1,
        _ => {
            let count2 = ctxt.read_u8()?;
            ((count1 & 0x7F) << 8) | u16::from(count2)
        }
    };
    Ok(count)
}

/// Read `num_deltas` packed deltas.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/otvarcommonformats#packed-deltas>
fn read_packed_deltas(ctxt: &mut ReadCtxt<'_>, num_deltas: u32) -> Result<Vec<i16>, ParseError> {
    let mut deltas_read = 0;
    let mut deltas = Vec::with_capacity(usize::safe_from(num_deltas));

    while deltas_read < num_deltas {
        let control_byte = ctxt.read_u8()?;
        let count = usize::from(control_byte & DELTA_RUN_COUNT_MASK) + 1;

        deltas.reserve(count);
        if (control_byte & DELTAS_ARE_ZERO) == DELTAS_ARE_ZERO {
            deltas.extend(iter::repeat(0).take(count));
        } else if (control_byte & DELTAS_ARE_WORDS) == DELTAS_ARE_WORDS {
            let array = ctxt.read_array::<I16Be>(count)?;
            deltas.extend(array.iter())
        } else {
            let array = ctxt.read_array::<I8>(count)?;
            deltas.extend(array.iter().map(i16::from));
        };
        // NOTE(cast): count is at most 64
        deltas_read += count as u32;
    }
    // A run may overshoot the requested number of deltas
    deltas.truncate(usize::safe_from(num_deltas));

    Ok(deltas)
}

impl<'a> GvarVariationData<'a> {
    /// Iterates over the point numbers and (x, y) deltas.
    pub fn iter(&self) -> impl Iterator<Item = (u32, (i16, i16))> + '_ {
        let deltas = self
            .x_coord_deltas
            .iter()
            .copied()
            .zip(self.y_coord_deltas.iter().copied());
        self.point_numbers.iter().zip(deltas)
    }

    /// The points these deltas apply to.
    pub fn point_numbers(&self) -> &PointNumbers {
        &self.point_numbers
    }

    /// Split into the point numbers and the x and y deltas.
    pub fn into_parts(self) -> (PointNumbers, Vec<i16>, Vec<i16>) {
        (
            self.point_numbers.into_owned(),
            self.x_coord_deltas,
            self.y_coord_deltas,
        )
    }
}

impl<'data> TupleVariationHeader<'data> {
    /// Read the `gvar` variation data of this header.
    ///
    /// `num_points` is the number of points in the glyph this variation relates to.
    fn variation_data<'a>(
        &'a self,
        num_points: u32,
        shared_point_numbers: Option<&'a PointNumbers>,
    ) -> Result<GvarVariationData<'a>, ParseError> {
        let mut ctxt = ReadScope::new(self.data).ctxt();

        let point_numbers = self.read_point_numbers(&mut ctxt, num_points, shared_point_numbers)?;
        let num_deltas = u32::try_from(point_numbers.len())?;

        // The deltas are stored X, followed by Y, but the delta runs can span the boundary of the
        // two so they are read as a single span of packed deltas and then split.
        let mut x_coord_deltas = read_packed_deltas(&mut ctxt, 2 * num_deltas)?;
        let y_coord_deltas = x_coord_deltas.split_off(usize::safe_from(num_deltas));

        Ok(GvarVariationData {
            point_numbers,
            x_coord_deltas,
            y_coord_deltas,
        })
    }

    /// Returns the index of the shared tuple that this header relates to.
    ///
    /// `None` if the header has an embedded peak tuple.
    pub fn tuple_index(&self) -> Option<u16> {
        self.peak_tuple
            .is_none()
            .then(|| self.tuple_flags_and_index & TUPLE_INDEX_MASK)
    }

    /// Returns the embedded peak tuple if present.
    pub fn peak_tuple(&self) -> Option<&Tuple<'data>> {
        self.peak_tuple.as_ref()
    }

    /// Returns the start and end tuples of the intermediate region if present.
    pub fn intermediate_region(&self) -> Option<&(Tuple<'data>, Tuple<'data>)> {
        self.intermediate_region.as_ref()
    }

    /// Read the private point numbers of this header, falling back on the shared ones.
    fn read_point_numbers<'a>(
        &'a self,
        ctxt: &mut ReadCtxt<'data>,
        num_points: u32,
        shared_point_numbers: Option<&'a PointNumbers>,
    ) -> Result<Cow<'a, PointNumbers>, ParseError> {
        let private_point_numbers =
            if (self.tuple_flags_and_index & PRIVATE_POINT_NUMBERS) == PRIVATE_POINT_NUMBERS {
                read_packed_point_numbers(ctxt, num_points).map(Some)?
            } else {
                None
            };

        private_point_numbers
            .map(Cow::Owned)
            .or_else(|| shared_point_numbers.map(Cow::Borrowed))
            .ok_or(ParseError::MissingValue)
    }
}

impl ReadBinaryDep for TupleVariationHeader<'_> {
    type Args<'a> = usize;
    type HostType<'a> = TupleVariationHeader<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        axis_count: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let variation_data_size = ctxt.read_u16be()?;
        let tuple_flags_and_index = ctxt.read_u16be()?;
        // Without an embedded peak the low 12 bits index the shared tuples of gvar
        let peak_tuple = ((tuple_flags_and_index & EMBEDDED_PEAK_TUPLE) == EMBEDDED_PEAK_TUPLE)
            .then(|| ctxt.read_array(axis_count))
            .transpose()?;
        let intermediate_region =
            if (tuple_flags_and_index & INTERMEDIATE_REGION) == INTERMEDIATE_REGION {
                let start = ctxt.read_array(axis_count)?;
                let end = ctxt.read_array(axis_count)?;
                Some((start, end))
            } else {
                None
            };
        Ok(TupleVariationHeader {
            variation_data_size,
            tuple_flags_and_index,
            peak_tuple,
            intermediate_region,
            data: &[], // filled in later
        })
    }
}
