//! `HVAR`: Horizontal Metrics Variations Table
//!
//! Optional table in variable fonts to provide horizontal metrics variations. If absent then
//! `gvar` deltas much be used to determine adjustments to metrics.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/hvar>

use crate::binary::read::{ReadBinaryDep, ReadCtxt, ReadScope};
use crate::error::ParseError;
use crate::tables::variable_fonts::{
    DeltaSetIndexMap, DeltaSetIndexMapEntry, IndirectionPolicy, ItemVariationStore,
};
use crate::tables::F2Dot14;
use crate::SafeFrom;

/// `HVAR`: Horizontal Metrics Variations Table.
pub struct HvarTable<'a> {
    /// Major version number of the horizontal metrics variations table.
    pub major_version: u16,
    /// Minor version number of the horizontal metrics variations table.
    pub minor_version: u16,
    item_variation_store: ItemVariationStore<'a>,
    /// Without a mapping the glyph id is the inner index of the first item variation data.
    advance_width_mapping: Option<DeltaSetIndexMap<'a>>,
    lsb_mapping: Option<DeltaSetIndexMap<'a>>,
    rsb_mapping: Option<DeltaSetIndexMap<'a>>,
}

impl<'a> HvarTable<'a> {
    /// The item variation store holding the metric deltas.
    pub fn item_variation_store(&self) -> &ItemVariationStore<'a> {
        &self.item_variation_store
    }

    /// Calculate the delta for the advance of the supplied `glyph_id` at the normalized
    /// position `coords`.
    pub fn advance_delta(
        &self,
        coords: &[F2Dot14],
        glyph_id: u16,
        policy: IndirectionPolicy,
    ) -> Result<f32, ParseError> {
        let entry = match self.advance_width_mapping.as_ref() {
            Some(mapping) => match Self::delta_set_entry_for_glyph(glyph_id, mapping, policy)? {
                Some(entry) => entry,
                None => return Ok(0.0),
            },
            None => DeltaSetIndexMapEntry {
                outer_index: 0,
                inner_index: glyph_id,
            },
        };
        self.item_variation_store.adjustment(entry, coords, policy)
    }

    /// Calculate the delta for the left-side bearing of the supplied `glyph_id`.
    ///
    /// `None` if the table has no left side bearing mapping.
    pub fn left_side_bearing_delta(
        &self,
        coords: &[F2Dot14],
        glyph_id: u16,
        policy: IndirectionPolicy,
    ) -> Result<Option<f32>, ParseError> {
        self.mapped_delta(self.lsb_mapping.as_ref(), coords, glyph_id, policy)
    }

    /// Calculate the delta for the right-side bearing of the supplied `glyph_id`.
    ///
    /// `None` if the table has no right side bearing mapping.
    pub fn right_side_bearing_delta(
        &self,
        coords: &[F2Dot14],
        glyph_id: u16,
        policy: IndirectionPolicy,
    ) -> Result<Option<f32>, ParseError> {
        self.mapped_delta(self.rsb_mapping.as_ref(), coords, glyph_id, policy)
    }

    fn mapped_delta(
        &self,
        mapping: Option<&DeltaSetIndexMap<'_>>,
        coords: &[F2Dot14],
        glyph_id: u16,
        policy: IndirectionPolicy,
    ) -> Result<Option<f32>, ParseError> {
        let mapping = match mapping {
            Some(mapping) => mapping,
            None => return Ok(None),
        };
        match Self::delta_set_entry_for_glyph(glyph_id, mapping, policy)? {
            Some(entry) => self
                .item_variation_store
                .adjustment(entry, coords, policy)
                .map(Some),
            None => Ok(Some(0.0)),
        }
    }

    // None when the map has no entries and the policy degrades
    fn delta_set_entry_for_glyph(
        glyph_id: u16,
        mapping: &DeltaSetIndexMap<'_>,
        policy: IndirectionPolicy,
    ) -> Result<Option<DeltaSetIndexMapEntry>, ParseError> {
        match mapping.entry(u32::from(glyph_id)) {
            Ok(entry) => Ok(Some(entry)),
            Err(ParseError::BadIndex) => {
                policy.out_of_range(format_args!(
                    "HVAR: empty delta-set index map for glyph {}",
                    glyph_id
                ))?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl ReadBinaryDep for HvarTable<'_> {
    /// The `fvar` axis count
    type Args<'a> = u16;
    type HostType<'a> = HvarTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        fvar_axis_count: u16,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let major_version = ctxt.read_u16be()?;
        ctxt.check_version(major_version == 1)?;
        let minor_version = ctxt.read_u16be()?;
        let item_variation_store_offset = ctxt.read_u32be()?;
        let advance_width_mapping_offset = ctxt.read_u32be()?;
        let lsb_mapping_offset = ctxt.read_u32be()?;
        let rsb_mapping_offset = ctxt.read_u32be()?;

        let item_variation_store = scope
            .offset(usize::safe_from(item_variation_store_offset))
            .read::<ItemVariationStore<'_>>()?;
        ctxt.check(item_variation_store.axis_count() == fvar_axis_count)?;
        let advance_width_mapping = read_optional_index_map(scope, advance_width_mapping_offset)?;
        let lsb_mapping = read_optional_index_map(scope, lsb_mapping_offset)?;
        let rsb_mapping = read_optional_index_map(scope, rsb_mapping_offset)?;

        Ok(HvarTable {
            major_version,
            minor_version,
            item_variation_store,
            advance_width_mapping,
            lsb_mapping,
            rsb_mapping,
        })
    }
}

fn read_optional_index_map(
    scope: ReadScope<'_>,
    offset: u32,
) -> Result<Option<DeltaSetIndexMap<'_>>, ParseError> {
    (offset > 0)
        .then(|| {
            scope
                .offset(usize::safe_from(offset))
                .read::<DeltaSetIndexMap<'_>>()
        })
        .transpose()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    /// One axis with one region peaking at +1. Item deltas are [100, -50, 20].
    ///
    /// The advance mapping sends glyph 0 to item 2, glyph 1 to a missing outer index and glyph 2
    /// to item 0. The right side bearing mapping sends every glyph to item 1.
    pub(crate) fn hvar_data(with_advance_mapping: bool) -> Vec<u8> {
        let advance_offset = if with_advance_mapping { 56 } else { 0 };
        writer::convert(&[
            UInt16(1),
            UInt16(0),
            UInt32(20),
            UInt32(advance_offset),
            UInt32(0),
            UInt32(63),
            // Item variation store
            UInt16(1),
            UInt32(12),
            UInt16(1),
            UInt32(22),
            // Region list
            UInt16(1),
            UInt16(1),
            Int16(0),
            Int16(0x4000),
            Int16(0x4000),
            // Item variation data
            UInt16(3),
            UInt16(1),
            UInt16(1),
            UInt16(0),
            Int16(100),
            Int16(-50),
            Int16(20),
            // Advance width mapping: 1 byte entries, 2 inner bits
            UInt8(0),
            UInt8(0x01),
            UInt16(3),
            UInt8(0b010),
            UInt8(0b100),
            UInt8(0b000),
            // Right side bearing mapping
            UInt8(0),
            UInt8(0x01),
            UInt16(1),
            UInt8(0b001),
        ])
    }

    fn half() -> [F2Dot14; 1] {
        [F2Dot14::from(0.5)]
    }

    #[test]
    fn advance_delta() {
        let data = hvar_data(true);
        let hvar = ReadScope::new(&data).read_dep::<HvarTable<'_>>(1).unwrap();
        let policy = IndirectionPolicy::Strict;
        assert_eq!(hvar.advance_delta(&half(), 0, policy), Ok(10.0));
        assert_eq!(hvar.advance_delta(&half(), 2, policy), Ok(50.0));
        // Glyphs past the end of the map use the last entry
        assert_eq!(hvar.advance_delta(&half(), 7, policy), Ok(50.0));
        assert_eq!(hvar.advance_delta(&[F2Dot14::ZERO], 2, policy), Ok(0.0));
    }

    #[test]
    fn advance_delta_without_mapping() {
        let data = hvar_data(false);
        let hvar = ReadScope::new(&data).read_dep::<HvarTable<'_>>(1).unwrap();
        let policy = IndirectionPolicy::Strict;
        assert_eq!(hvar.advance_delta(&half(), 1, policy), Ok(-25.0));
        assert_eq!(
            hvar.advance_delta(&half(), 5, policy),
            Err(ParseError::BadIndex)
        );
        assert_eq!(
            hvar.advance_delta(&half(), 5, IndirectionPolicy::Degrade),
            Ok(0.0)
        );
    }

    #[test]
    fn out_of_range_outer_index() {
        let data = hvar_data(true);
        let hvar = ReadScope::new(&data).read_dep::<HvarTable<'_>>(1).unwrap();
        assert_eq!(
            hvar.advance_delta(&half(), 1, IndirectionPolicy::Degrade),
            Ok(0.0)
        );
        assert_eq!(
            hvar.advance_delta(&half(), 1, IndirectionPolicy::Strict),
            Err(ParseError::BadIndex)
        );
    }

    #[test]
    fn side_bearing_deltas() {
        let data = hvar_data(true);
        let hvar = ReadScope::new(&data).read_dep::<HvarTable<'_>>(1).unwrap();
        let policy = IndirectionPolicy::Strict;
        assert_eq!(hvar.left_side_bearing_delta(&half(), 0, policy), Ok(None));
        assert_eq!(
            hvar.right_side_bearing_delta(&half(), 4, policy),
            Ok(Some(-25.0))
        );
    }

    #[test]
    fn axis_count_must_match_fvar() {
        let data = hvar_data(true);
        assert_eq!(
            ReadScope::new(&data).read_dep::<HvarTable<'_>>(2).err(),
            Some(ParseError::BadValue)
        );
    }
}
