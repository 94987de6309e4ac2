#![deny(missing_docs)]

//! `avar` Axis Variations Table
//!
//! The axis variations table (`avar`) is an optional table used in variable fonts. It can be used
//! to modify aspects of how a design varies for different instances along a particular
//! design-variation axis. Specifically, it allows modification of the coordinate normalization
//! that is used when processing variation data for a particular variation instance.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/avar>

use crate::binary::read::{ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom};
use crate::error::ParseError;
use crate::tables::{F2Dot14, Fixed};

/// `avar` Axis Variations Table.
pub struct AvarTable<'a> {
    /// Major version number of the axis variations table.
    pub major_version: u16,
    /// Minor version number of the axis variations table.
    pub minor_version: u16,
    segment_maps: Vec<SegmentMap<'a>>,
}

/// Segment map record.
///
/// Contains an array of mappings from a normalised coordinate value to a modified value.
#[derive(Clone)]
pub struct SegmentMap<'a> {
    /// The array of axis value map records for this axis.
    axis_value_maps: ReadArray<'a, AxisValueMap>,
}

/// A mapping from a normalised coordinate value to a modified value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AxisValueMap {
    /// A normalized coordinate value obtained using default normalization.
    pub from_coordinate: F2Dot14,
    /// The modified, normalized coordinate value.
    pub to_coordinate: F2Dot14,
}

impl<'a> AvarTable<'a> {
    /// The number of segment maps, one per `fvar` axis.
    pub fn axis_count(&self) -> u16 {
        // NOTE(cast): segment_maps was read from a u16 count
        self.segment_maps.len() as u16
    }

    /// Iterate over the segment maps in axis order.
    pub fn segment_maps(&self) -> impl Iterator<Item = &SegmentMap<'a>> + '_ {
        self.segment_maps.iter()
    }

    /// The segment map for the axis at `index`.
    pub fn segment_map(&self, index: usize) -> Option<&SegmentMap<'a>> {
        self.segment_maps.get(index)
    }
}

impl ReadBinaryDep for AvarTable<'_> {
    /// The `fvar` axis count
    type Args<'a> = u16;
    type HostType<'a> = AvarTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        fvar_axis_count: u16,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let _reserved = ctxt.read_u16be()?;
        let axis_count = ctxt.read_u16be()?;
        ctxt.check(axis_count == fvar_axis_count)?;

        let segment_maps = (0..axis_count)
            .map(|_| ctxt.read::<SegmentMap<'_>>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AvarTable {
            major_version,
            minor_version,
            segment_maps,
        })
    }
}

impl SegmentMap<'_> {
    /// Iterate over the axis value mappings.
    pub fn axis_value_mappings(&self) -> impl Iterator<Item = AxisValueMap> + '_ {
        self.axis_value_maps.iter()
    }

    /// Performs `avar` normalization to a value that has already been default normalised.
    ///
    /// `normalized_value` should be in the range [-1, +1]. A map with no records returns the
    /// value unchanged.
    pub fn normalize(&self, mut normalized_value: Fixed) -> Fixed {
        // Find the first record with from_coordinate >= normalized_value and interpolate
        // linearly from the record before it
        let mut start_seg: Option<AxisValueMap> = None;
        for end_seg in self.axis_value_mappings() {
            if let Some(start_seg) = start_seg {
                let end_seg_from_coordinate = Fixed::from(end_seg.from_coordinate);
                if end_seg_from_coordinate == normalized_value {
                    normalized_value = end_seg.to_coordinate.into();
                    break;
                } else if end_seg_from_coordinate > normalized_value {
                    let ratio = (normalized_value - Fixed::from(start_seg.from_coordinate))
                        / (Fixed::from(end_seg.from_coordinate)
                            - Fixed::from(start_seg.from_coordinate));
                    normalized_value = Fixed::from(start_seg.to_coordinate)
                        + ratio
                            * (Fixed::from(end_seg.to_coordinate)
                                - Fixed::from(start_seg.to_coordinate));
                    break;
                }
            }
            start_seg = Some(end_seg);
        }
        normalized_value
    }
}

impl ReadBinary for SegmentMap<'_> {
    type HostType<'a> = SegmentMap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let position_map_count = ctxt.read_u16be()?;
        let axis_value_maps = ctxt.read_array::<AxisValueMap>(usize::from(position_map_count))?;

        Ok(SegmentMap { axis_value_maps })
    }
}

impl ReadFrom for AxisValueMap {
    type ReadType = (F2Dot14, F2Dot14);

    fn read_from((from_coordinate, to_coordinate): (F2Dot14, F2Dot14)) -> Self {
        AxisValueMap {
            from_coordinate,
            to_coordinate,
        }
    }
}
