#![deny(missing_docs)]

//! `fvar` Font Variations Table
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/fvar>

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope, ReadUnchecked,
};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::variable_fonts::avar::AvarTable;
use crate::tables::variable_fonts::UserTuple;
use crate::tables::{F2Dot14, Fixed};
use tinyvec::TinyVec;

/// `fvar` font Variations Table
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/fvar#fvar-header>
pub struct FvarTable<'a> {
    /// Major version number of the font variations table
    pub major_version: u16,
    /// Minor version number of the font variations table
    pub minor_version: u16,
    axes: ReadArray<'a, VariationAxisRecord>,
    /// The number of named instances defined in the font.
    instance_count: u16,
    /// The size in bytes of each InstanceRecord
    instance_size: u16,
    instance_array: &'a [u8],
}

/// Variation axis
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/fvar#variationaxisrecord>
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct VariationAxisRecord {
    /// Tag identifying the design variation for the axis.
    pub axis_tag: u32,
    /// The minimum coordinate value for the axis.
    pub min_value: Fixed,
    /// The default coordinate value for the axis.
    pub default_value: Fixed,
    /// The maximum coordinate value for the axis.
    pub max_value: Fixed,
    /// Axis qualifiers. Bit 0 hides the axis from user interfaces.
    pub flags: u16,
    /// The name ID for entries in the `name` table that provide a display name
    /// for this axis.
    pub axis_name_id: u16,
}

/// Variation instance record
///
/// Instances are like named presets for a variable font. Each instance has name
/// and a value for each variation axis.
///
/// <https://learn.microsoft.com/en-us/typography/opentype/spec/fvar#instancerecord>
#[derive(Debug)]
pub struct InstanceRecord<'a> {
    /// The name ID for entries in the `name` table that provide subfamily names
    /// for this instance.
    pub subfamily_name_id: u16,
    /// Reserved flags.
    pub flags: u16,
    /// The coordinates array for this instance.
    pub coordinates: UserTuple<'a>,
    /// Optional. The name ID for entries in the `name` table that provide
    /// PostScript names for this instance.
    pub post_script_name_id: Option<u16>,
}

// Most variable fonts have one or two axes. The inline capacity of 4 uses no more space than 2
// since a TinyVec is at least as large as the Vec it can spill into.

/// Coordinate array specifying a normalized position within the font’s variation space
/// (owned version).
///
/// Construct through [FvarTable] so that the number of elements matches the axis count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedTuple(TinyVec<[F2Dot14; 4]>);

impl<'a> FvarTable<'a> {
    /// Returns an iterator over the variation axes of the font.
    pub fn axes(&self) -> impl Iterator<Item = VariationAxisRecord> + 'a {
        self.axes.iter()
    }

    /// Returns the number of variation axes in the font.
    pub fn axis_count(&self) -> u16 {
        // NOTE(cast): Valid as self.axes is contructed from a u16 length
        self.axes.len() as u16
    }

    /// The axis with the tag `axis_tag`, if present.
    pub fn axis(&self, axis_tag: u32) -> Option<VariationAxisRecord> {
        self.axes().find(|axis| axis.axis_tag == axis_tag)
    }

    /// The number of named instances.
    pub fn instance_count(&self) -> u16 {
        self.instance_count
    }

    /// Returns an iterator over the pre-defined instances in the font.
    pub fn instances(&self) -> impl Iterator<Item = Result<InstanceRecord<'a>, ParseError>> + 'a {
        let instance_array = self.instance_array;
        let axis_count = self.axis_count();
        let instance_size = usize::from(self.instance_size);
        (0..usize::from(self.instance_count)).map(move |i| {
            let offset = i * instance_size;
            instance_array
                .get(offset..(offset + instance_size))
                .ok_or(ParseError::BadIndex)
                .and_then(|data| {
                    ReadScope::new(data).read_dep::<InstanceRecord<'_>>((instance_size, axis_count))
                })
        })
    }

    /// Turn a user tuple into a tuple normalized over the range -1..1.
    ///
    /// Each coordinate is clamped to its axis range, normalized against the default, remapped
    /// through `avar` when present, and converted to 2.14.
    pub fn normalize(
        &self,
        user_tuple: impl ExactSizeIterator<Item = Fixed>,
        avar: Option<&AvarTable<'_>>,
    ) -> Result<OwnedTuple, ParseError> {
        if user_tuple.len() != usize::from(self.axis_count()) {
            return Err(ParseError::BadValue);
        }

        let mut tuple = TinyVec::with_capacity(user_tuple.len());
        let mut segment_maps = avar.map(|avar| avar.segment_maps());
        for (axis, user_value) in self.axes().zip(user_tuple) {
            let mut normalized_value = default_normalize(&axis, user_value);

            if let Some(segment_maps) = segment_maps.as_mut() {
                let segment_map = segment_maps.next().ok_or(ParseError::BadIndex)?;
                normalized_value = segment_map.normalize(normalized_value);
                // The remapped value must stay within -1..1
                normalized_value = normalized_value.clamp(Fixed::from_int(-1), Fixed::from_int(1));
            }

            tuple.push(F2Dot14::from(normalized_value));
        }
        Ok(OwnedTuple(tuple))
    }

    /// The normalized tuple of the default instance: zero on every axis.
    pub fn default_tuple(&self) -> OwnedTuple {
        OwnedTuple(
            std::iter::repeat(F2Dot14::ZERO)
                .take(usize::from(self.axis_count()))
                .collect(),
        )
    }

    /// Construct a new [OwnedTuple].
    ///
    /// Returns `None` if the number of elements in `values` does not match the axis count.
    pub fn owned_tuple(&self, values: &[F2Dot14]) -> Option<OwnedTuple> {
        (values.len() == usize::from(self.axis_count())).then(|| OwnedTuple(TinyVec::from(values)))
    }
}

fn default_normalize(axis: &VariationAxisRecord, coord: Fixed) -> Fixed {
    let coord = coord.clamp(axis.min_value, axis.max_value);

    let normalised_value = if coord < axis.default_value {
        -(axis.default_value - coord) / (axis.default_value - axis.min_value)
    } else if coord > axis.default_value {
        (coord - axis.default_value) / (axis.max_value - axis.default_value)
    } else {
        Fixed::from_int(0)
    };

    // Rounding can take the result slightly outside -1..1
    normalised_value.clamp(Fixed::from_int(-1), Fixed::from_int(1))
}

impl ReadBinary for FvarTable<'_> {
    type HostType<'a> = FvarTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let axes_array_offset = ctxt.read_u16be()?;
        let _reserved = ctxt.read_u16be()?;
        let axis_count = ctxt.read_u16be()?;
        let axis_size = ctxt.read_u16be()?;
        let instance_count = ctxt.read_u16be()?;
        let instance_size = ctxt.read_u16be()?;
        ctxt.check(usize::from(instance_size) >= usize::from(axis_count) * Fixed::SIZE + 4)?;
        let instance_length = usize::from(instance_count) * usize::from(instance_size);
        let mut data_ctxt = scope.offset(usize::from(axes_array_offset)).ctxt();
        let axes = data_ctxt.read_array_stride(usize::from(axis_count), usize::from(axis_size))?;
        // Every axis range must hold its default
        ctxt.check(axes.iter().all(|axis: VariationAxisRecord| {
            axis.min_value <= axis.default_value && axis.default_value <= axis.max_value
        }))?;
        let instance_array = data_ctxt.read_slice(instance_length)?;

        Ok(FvarTable {
            major_version,
            minor_version,
            axes,
            instance_count,
            instance_size,
            instance_array,
        })
    }
}

impl ReadFrom for VariationAxisRecord {
    type ReadType = ((U32Be, Fixed, Fixed), (Fixed, U16Be, U16Be));

    fn read_from(
        ((axis_tag, min_value, default_value), (max_value, flags, axis_name_id)): (
            (u32, Fixed, Fixed),
            (Fixed, u16, u16),
        ),
    ) -> Self {
        VariationAxisRecord {
            axis_tag,
            min_value,
            default_value,
            max_value,
            flags,
            axis_name_id,
        }
    }
}

impl VariationAxisRecord {
    /// Whether the axis should be hidden from user interfaces.
    pub fn is_hidden(&self) -> bool {
        self.flags & 1 != 0
    }
}

impl ReadBinaryDep for InstanceRecord<'_> {
    type Args<'a> = (usize, u16);
    type HostType<'a> = InstanceRecord<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (record_size, axis_count): (usize, u16),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let axis_count = usize::from(axis_count);
        let subfamily_name_id = ctxt.read_u16be()?;
        let flags = ctxt.read_u16be()?;
        let coordinates = ctxt.read_array(axis_count).map(UserTuple)?;
        // The optional postScriptNameID follows when the record is larger than its fixed fields
        let post_script_name_id = (record_size > axis_count * Fixed::SIZE + 4)
            .then(|| ctxt.read_u16be())
            .transpose()?;

        Ok(InstanceRecord {
            subfamily_name_id,
            flags,
            coordinates,
            post_script_name_id,
        })
    }
}

impl std::ops::Deref for OwnedTuple {
    type Target = [F2Dot14];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
