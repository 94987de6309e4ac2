#![deny(missing_docs)]

//! `gvar` Glyph Variations Table
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gvar>

use crate::binary::read::{ReadBinaryDep, ReadCtxt, ReadScope, ReadUnchecked};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::loca::LocaOffsets;
use crate::tables::variable_fonts::{
    region_scalar, IndirectionPolicy, PointNumbers, RegionAxisCoordinates, Tuple,
    TupleVariationHeader, TupleVariationStore,
};
use crate::tables::F2Dot14;
use crate::SafeFrom;

/// `gvar` Glyph Variations Table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/gvar#gvar-header>
pub struct GvarTable<'a> {
    /// Major version number of the glyph variations table.
    pub major_version: u16,
    /// Minor version number of the glyph variations table.
    pub minor_version: u16,
    /// The number of variation axes, equal to the `fvar` axis count.
    axis_count: u16,
    /// The number of shared tuple records.
    ///
    /// Shared tuple records can be referenced within glyph variation data tables for multiple
    /// glyphs, as opposed to other tuple records stored directly within a glyph variation data
    /// table.
    shared_tuple_count: u16,
    /// Scope containing data for the shared tuple records.
    shared_tuples_scope: ReadScope<'a>,
    /// The number of glyphs in this font.
    glyph_count: u16,
    /// Scope containing the data for the array of GlyphVariationData tables.
    glyph_variation_data_array_scope: ReadScope<'a>,
    /// Offsets from the start of the GlyphVariationData array to each GlyphVariationData table.
    glyph_variation_data_offsets: LocaOffsets<'a>,
}

/// One tuple variation of a glyph with its region resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphVariation {
    /// The region of the variation space this variation applies in, one entry per axis.
    pub region: Vec<RegionAxisCoordinates>,
    /// The points that have explicit deltas.
    pub point_numbers: PointNumbers,
    /// X deltas, parallel to `point_numbers`.
    pub x_deltas: Vec<i16>,
    /// Y deltas, parallel to `point_numbers`.
    pub y_deltas: Vec<i16>,
}

impl ReadBinaryDep for GvarTable<'_> {
    /// The `fvar` axis count
    type Args<'a> = u16;
    type HostType<'a> = GvarTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        fvar_axis_count: u16,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let axis_count = ctxt.read_u16be()?;
        ctxt.check(axis_count == fvar_axis_count)?;
        let shared_tuple_count = ctxt.read_u16be()?;
        let shared_tuples_offset = ctxt.read_u32be()?;
        let glyph_count = ctxt.read_u16be()?;
        let flags = ctxt.read_u16be()?;
        let glyph_variation_data_array_offset = ctxt.read_u32be()?;
        // If bit 0 is set the offsets are u32, otherwise u16 offsets divided by 2
        let glyph_variation_data_offsets = if flags & 1 == 1 {
            LocaOffsets::Long(ctxt.read_array::<U32Be>(usize::from(glyph_count) + 1)?)
        } else {
            LocaOffsets::Short(ctxt.read_array::<U16Be>(usize::from(glyph_count) + 1)?)
        };

        let shared_tuples_len =
            usize::from(shared_tuple_count) * usize::from(axis_count) * F2Dot14::SIZE;
        let shared_tuples_scope =
            scope.offset_length(usize::safe_from(shared_tuples_offset), shared_tuples_len)?;

        let data_len = glyph_variation_data_offsets
            .last()
            .ok_or(ParseError::BadIndex)?;
        let glyph_variation_data_array_scope = scope.offset_length(
            usize::safe_from(glyph_variation_data_array_offset),
            usize::safe_from(data_len),
        )?;

        Ok(GvarTable {
            major_version,
            minor_version,
            axis_count,
            shared_tuple_count,
            shared_tuples_scope,
            glyph_count,
            glyph_variation_data_array_scope,
            glyph_variation_data_offsets,
        })
    }
}

impl<'a> GvarTable<'a> {
    /// The number of variation axes.
    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    /// The number of glyphs with a (possibly empty) variation data slot.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// The number of shared peak tuples.
    pub fn shared_tuple_count(&self) -> u16 {
        self.shared_tuple_count
    }

    /// The shared peak tuple at `index`.
    pub fn shared_tuple(&self, index: u16) -> Result<Tuple<'a>, ParseError> {
        if index >= self.shared_tuple_count {
            return Err(ParseError::BadIndex);
        }
        let axis_count = usize::from(self.axis_count);
        let offset = usize::from(index) * axis_count * F2Dot14::SIZE;
        self.shared_tuples_scope
            .offset(offset)
            .ctxt()
            .read_array(axis_count)
    }

    /// The tuple variation store of a glyph.
    ///
    /// `num_points` is the number of points in the glyph including the four phantom points.
    /// Returns `None` when the glyph has no variation data.
    pub fn glyph_variation_data(
        &self,
        glyph_index: u16,
        num_points: u32,
    ) -> Result<Option<TupleVariationStore<'a>>, ParseError> {
        let glyph_index = usize::from(glyph_index);
        let start = self
            .glyph_variation_data_offsets
            .get(glyph_index)
            .ok_or(ParseError::BadIndex)?;
        let end = self
            .glyph_variation_data_offsets
            .get(glyph_index + 1)
            .ok_or(ParseError::BadIndex)?;
        if end <= start {
            return Ok(None);
        }
        let length = usize::safe_from(end - start);
        self.glyph_variation_data_array_scope
            .offset_length(usize::safe_from(start), length)?
            .read_dep::<TupleVariationStore<'_>>((self.axis_count, num_points))
            .map(Some)
    }

    /// The variations of a glyph with each region resolved against the shared tuples.
    ///
    /// A variation that references a shared tuple that does not exist is dropped when `policy`
    /// is [IndirectionPolicy::Degrade].
    pub fn glyph_variations(
        &self,
        glyph_index: u16,
        num_points: u32,
        policy: IndirectionPolicy,
    ) -> Result<Vec<GlyphVariation>, ParseError> {
        let store = match self.glyph_variation_data(glyph_index, num_points)? {
            Some(store) => store,
            None => return Ok(Vec::new()),
        };

        let mut variations = Vec::with_capacity(store.headers().len());
        for (index, header) in store.headers().iter().enumerate() {
            let region = match self.region(header)? {
                Some(region) => region,
                None => {
                    policy.out_of_range(format_args!(
                        "gvar: glyph {} references missing shared tuple {:?}",
                        glyph_index,
                        header.tuple_index()
                    ))?;
                    continue;
                }
            };
            // NOTE(cast): index is bounded by the 12-bit tuple variation count
            let data = store.variation_data(index as u16)?;
            let (point_numbers, x_deltas, y_deltas) = data.into_parts();
            variations.push(GlyphVariation {
                region,
                point_numbers,
                x_deltas,
                y_deltas,
            });
        }
        Ok(variations)
    }

    // None when the shared tuple index is out of range
    fn region(
        &self,
        header: &TupleVariationHeader<'a>,
    ) -> Result<Option<Vec<RegionAxisCoordinates>>, ParseError> {
        let peak = match (header.peak_tuple(), header.tuple_index()) {
            (Some(peak), _) => peak.clone(),
            (None, Some(index)) if index < self.shared_tuple_count => self.shared_tuple(index)?,
            _ => return Ok(None),
        };

        let region = match header.intermediate_region() {
            Some((start, end)) => peak
                .iter()
                .zip(start.iter())
                .zip(end.iter())
                .map(|((peak_coord, start_coord), end_coord)| RegionAxisCoordinates {
                    start_coord,
                    peak_coord,
                    end_coord,
                })
                .collect(),
            None => peak.iter().map(RegionAxisCoordinates::from_peak).collect(),
        };
        Ok(Some(region))
    }
}

impl GlyphVariation {
    /// The scalar this variation's deltas are multiplied by at the normalized position `coords`.
    pub fn scalar(&self, coords: &[F2Dot14]) -> f32 {
        region_scalar(self.region.iter().copied(), coords)
    }

    /// Iterate over the point numbers and (x, y) deltas.
    pub fn deltas(&self) -> impl Iterator<Item = (u32, (i16, i16))> + '_ {
        let deltas = self
            .x_deltas
            .iter()
            .copied()
            .zip(self.y_deltas.iter().copied());
        self.point_numbers.iter().zip(deltas)
    }
}
