//! Parsing of the `cmap` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/cmap>
//!
//! Every subtable is decoded once even when several encoding records point at the same offset.

use log::warn;
use rustc_hash::FxHashMap;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be, U8};
use crate::error::ParseError;
use crate::{size, SafeFrom};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);
    pub const UNICODE_BMP: EncodingId = EncodingId(3);
    pub const UNICODE_FULL: EncodingId = EncodingId(4);
    pub const UNICODE_FULL_REPERTOIRE: EncodingId = EncodingId(6);
}

/// Unicode subtables in order of preference.
const PREFERRED_SUBTABLES: [(PlatformId, Option<EncodingId>); 7] = [
    (PlatformId::WINDOWS, Some(EncodingId::WINDOWS_UNICODE_UCS4)),
    (PlatformId::UNICODE, Some(EncodingId::UNICODE_FULL_REPERTOIRE)),
    (PlatformId::UNICODE, Some(EncodingId::UNICODE_FULL)),
    (PlatformId::WINDOWS, Some(EncodingId::WINDOWS_UNICODE_BMP_UCS2)),
    (PlatformId::UNICODE, Some(EncodingId::UNICODE_BMP)),
    (PlatformId::UNICODE, None),
    (PlatformId::WINDOWS, Some(EncodingId::WINDOWS_SYMBOL)),
];

/// `cmap` table with all of its subtables decoded
#[derive(Debug)]
pub struct Cmap<'a> {
    pub encoding_records: Vec<EncodingRecord>,
    /// One entry per distinct subtable offset, in order of first reference.
    pub subtables: Vec<CmapSubtable<'a>>,
    /// Index into `subtables` for each encoding record.
    record_subtables: Vec<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

#[derive(Debug)]
pub enum CmapSubtable<'a> {
    Format0 {
        language: u16,
        glyph_id_array: ReadArray<'a, U8>,
    },
    Format4 {
        language: u16,
        end_codes: ReadArray<'a, U16Be>,
        start_codes: ReadArray<'a, U16Be>,
        id_deltas: ReadArray<'a, I16Be>,
        id_range_offsets: ReadArray<'a, U16Be>,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format6 {
        language: u16,
        first_code: u16,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format12 {
        language: u32,
        groups: ReadArray<'a, SequentialMapGroup>,
    },
    /// A subtable in a format that is not decoded, such as the format 14 variation selectors.
    Unsupported { format: u16 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl ReadBinary for Cmap<'_> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?.to_vec();

        let mut by_offset = FxHashMap::default();
        let mut subtables = Vec::new();
        let mut record_subtables = Vec::with_capacity(encoding_records.len());
        for record in &encoding_records {
            let index = match by_offset.get(&record.offset) {
                Some(&index) => index,
                None => {
                    let subtable = scope
                        .offset(usize::safe_from(record.offset))
                        .read::<CmapSubtable<'_>>()?;
                    subtables.push(subtable);
                    by_offset.insert(record.offset, subtables.len() - 1);
                    subtables.len() - 1
                }
            };
            record_subtables.push(index);
        }

        Ok(Cmap {
            encoding_records,
            subtables,
            record_subtables,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id,
            encoding_id,
            offset,
        }
    }
}

impl ReadBinary for CmapSubtable<'_> {
    type HostType<'a> = CmapSubtable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let subtable_format = ctxt.read_u16be()?;
        match subtable_format {
            0 => {
                let length = usize::from(ctxt.read_u16be()?);
                ctxt.check(length >= 3 * size::U16 + 256)?;
                let language = ctxt.read_u16be()?;
                let glyph_id_array = ctxt.read_array::<U8>(256)?;
                Ok(CmapSubtable::Format0 {
                    language,
                    glyph_id_array,
                })
            }
            4 => {
                let length = usize::from(ctxt.read_u16be()?);
                let language = ctxt.read_u16be()?;
                let seg_count_x2 = usize::from(ctxt.read_u16be()?);
                ctxt.check((seg_count_x2 & 1) == 0)?;
                let seg_count = seg_count_x2 >> 1;
                let _search_range = ctxt.read_u16be()?;
                let _entry_selector = ctxt.read_u16be()?;
                let _range_shift = ctxt.read_u16be()?;
                let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let _reserved_pad = ctxt.read_u16be()?;
                let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
                let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
                let header_length = (8 + (4 * seg_count)) * size::U16;
                ctxt.check(length >= header_length)?;
                let num_indices = (length - header_length) >> 1;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;
                Ok(CmapSubtable::Format4 {
                    language,
                    end_codes,
                    start_codes,
                    id_deltas,
                    id_range_offsets,
                    glyph_id_array,
                })
            }
            6 => {
                let _length = ctxt.read_u16be()?;
                let language = ctxt.read_u16be()?;
                let first_code = ctxt.read_u16be()?;
                let entry_count = usize::from(ctxt.read_u16be()?);
                let glyph_id_array = ctxt.read_array::<U16Be>(entry_count)?;
                Ok(CmapSubtable::Format6 {
                    language,
                    first_code,
                    glyph_id_array,
                })
            }
            12 => {
                let _reserved = ctxt.read_u16be()?;
                let _length = ctxt.read_u32be()?;
                let language = ctxt.read_u32be()?;
                let num_groups = usize::safe_from(ctxt.read_u32be()?);
                let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
                Ok(CmapSubtable::Format12 { language, groups })
            }
            format => {
                warn!("cmap subtable format {} is not decoded", format);
                Ok(CmapSubtable::Unsupported { format })
            }
        }
    }
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);

    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl<'a> Cmap<'a> {
    /// Find the subtable for the given `platform_id` and `encoding_id`.
    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<&CmapSubtable<'a>> {
        self.find(|record| {
            record.platform_id == platform_id.0 && record.encoding_id == encoding_id.0
        })
    }

    /// The subtable for `record_index` in `encoding_records`.
    pub fn subtable_for_record(&self, record_index: usize) -> Option<&CmapSubtable<'a>> {
        self.record_subtables
            .get(record_index)
            .and_then(|&index| self.subtables.get(index))
    }

    /// The preferred Unicode subtable.
    pub fn unicode_subtable(&self) -> Option<&CmapSubtable<'a>> {
        PREFERRED_SUBTABLES
            .iter()
            .find_map(|&(platform_id, encoding_id)| {
                self.find(|record| {
                    record.platform_id == platform_id.0
                        && encoding_id.map_or(true, |id| record.encoding_id == id.0)
                })
                .filter(|subtable| !matches!(subtable, CmapSubtable::Unsupported { .. }))
            })
    }

    /// Map a Unicode scalar value to a glyph through the preferred Unicode subtable.
    pub fn map_glyph(&self, ch: char) -> Result<Option<u16>, ParseError> {
        match self.unicode_subtable() {
            Some(subtable) => subtable.map_glyph(u32::from(ch)),
            None => Ok(None),
        }
    }

    fn find(&self, predicate: impl Fn(&EncodingRecord) -> bool) -> Option<&CmapSubtable<'a>> {
        self.encoding_records
            .iter()
            .position(predicate)
            .and_then(|index| self.subtable_for_record(index))
    }
}

impl CmapSubtable<'_> {
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        match *self {
            CmapSubtable::Format0 {
                ref glyph_id_array, ..
            } => Ok(glyph_id_array
                .get_item(usize::safe_from(ch))
                .map(u16::from)),
            CmapSubtable::Format4 {
                ref end_codes,
                ref start_codes,
                ref id_deltas,
                ref id_range_offsets,
                ref glyph_id_array,
                ..
            } => {
                // Segments are sorted by end code, find the first that ends at or after `ch`
                let (Err(i) | Ok(i)) = end_codes.binary_search_by(|end| u32::from(end).cmp(&ch));
                let (Some(start_code), Some(id_delta), Some(id_range_offset)) = (
                    start_codes.get_item(i).map(u32::from),
                    id_deltas.get_item(i).map(i32::from),
                    id_range_offsets.get_item(i).map(usize::from),
                ) else {
                    return Ok(None);
                };
                if ch < start_code {
                    return Ok(None);
                }
                if id_range_offset == 0 {
                    let glyph_id = (ch as i32 + id_delta) & 0xFFFF;
                    return Ok(Some(glyph_id as u16));
                }
                // idRangeOffset is relative to its own position in the id_range_offsets array
                let glyph_id_offset =
                    id_range_offset + i * 2 + usize::safe_from(ch - start_code) * 2;
                let index = (glyph_id_offset >> 1)
                    .checked_sub(id_range_offsets.len())
                    .ok_or(ParseError::BadIndex)?;
                match glyph_id_array.get_item(index) {
                    Some(0) => Ok(Some(0)),
                    Some(glyph_id) => Ok(Some(((i32::from(glyph_id) + id_delta) & 0xFFFF) as u16)),
                    None => Err(ParseError::BadIndex),
                }
            }
            CmapSubtable::Format6 {
                first_code,
                ref glyph_id_array,
                ..
            } => match ch.checked_sub(u32::from(first_code)) {
                Some(index) => Ok(glyph_id_array.get_item(usize::safe_from(index))),
                None => Ok(None),
            },
            CmapSubtable::Format12 { ref groups, .. } => {
                let found = groups.binary_search_by(|group| {
                    if ch < group.start_char_code {
                        std::cmp::Ordering::Greater
                    } else if ch > group.end_char_code {
                        std::cmp::Ordering::Less
                    } else {
                        std::cmp::Ordering::Equal
                    }
                });
                match found.ok().and_then(|index| groups.get_item(index)) {
                    Some(group) => {
                        let glyph_id = group.start_glyph_id + (ch - group.start_char_code);
                        Ok(Some(u16::try_from(glyph_id)?))
                    }
                    None => Ok(None),
                }
            }
            CmapSubtable::Unsupported { format } => {
                Err(ParseError::UnsupportedFormat(u32::from(format)))
            }
        }
    }

    /// Iterate every `(char code, glyph)` pair the subtable maps.
    pub fn mappings(&self) -> Vec<(u32, u16)> {
        let mut mappings = Vec::new();
        match self {
            CmapSubtable::Format0 { glyph_id_array, .. } => mappings.extend(
                glyph_id_array
                    .iter()
                    .enumerate()
                    .filter(|&(_, glyph)| glyph != 0)
                    .map(|(code, glyph)| (code as u32, u16::from(glyph))),
            ),
            CmapSubtable::Format4 {
                start_codes,
                end_codes,
                ..
            } => {
                for (start, end) in start_codes.iter().zip(end_codes.iter()) {
                    for code in u32::from(start)..=u32::from(end) {
                        if let Ok(Some(glyph)) = self.map_glyph(code) {
                            if glyph != 0 {
                                mappings.push((code, glyph));
                            }
                        }
                    }
                }
            }
            CmapSubtable::Format6 {
                first_code,
                glyph_id_array,
                ..
            } => mappings.extend(
                glyph_id_array
                    .iter()
                    .enumerate()
                    .filter(|&(_, glyph)| glyph != 0)
                    .map(|(index, glyph)| (u32::from(*first_code) + index as u32, glyph)),
            ),
            CmapSubtable::Format12 { groups, .. } => {
                for group in groups {
                    for code in group.start_char_code..=group.end_char_code {
                        let glyph = group.start_glyph_id + (code - group.start_char_code);
                        match u16::try_from(glyph) {
                            Ok(glyph) => mappings.push((code, glyph)),
                            Err(_) => break,
                        }
                    }
                }
            }
            CmapSubtable::Unsupported { .. } => {}
        }
        mappings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::writer::{self, TtfType::*};

    fn format4() -> Vec<u8> {
        // Segments: 'A'..='C' by delta, 'a'..='b' through glyph_id_array, 0xFFFF terminator
        writer::convert(&[
            UInt16(4),
            UInt16(16 + 3 * 8 + 4),
            UInt16(0),
            UInt16(6),
            UInt16(4),
            UInt16(1),
            UInt16(2),
            UInt16(0x43),
            UInt16(0x62),
            UInt16(0xFFFF),
            UInt16(0),
            UInt16(0x41),
            UInt16(0x61),
            UInt16(0xFFFF),
            Int16(-0x40),
            Int16(0),
            Int16(1),
            UInt16(0),
            UInt16(4),
            UInt16(0),
            UInt16(10),
            UInt16(11),
        ])
    }

    #[test]
    fn format4_lookup() {
        let data = format4();
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(0x41).unwrap(), Some(1));
        assert_eq!(subtable.map_glyph(0x43).unwrap(), Some(3));
        assert_eq!(subtable.map_glyph(0x44).unwrap(), None);
        assert_eq!(subtable.map_glyph(0x61).unwrap(), Some(10));
        assert_eq!(subtable.map_glyph(0x62).unwrap(), Some(11));
        assert_eq!(subtable.map_glyph(0x20).unwrap(), None);
        assert_eq!(subtable.mappings().len(), 5);
    }

    #[test]
    fn format6_and_12_lookup() {
        let data = writer::convert(&[
            UInt16(6),
            UInt16(14),
            UInt16(0),
            UInt16(0x30),
            UInt16(2),
            UInt16(7),
            UInt16(8),
        ]);
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(0x31).unwrap(), Some(8));
        assert_eq!(subtable.map_glyph(0x32).unwrap(), None);
        assert_eq!(subtable.map_glyph(0x2F).unwrap(), None);

        let data = writer::convert(&[
            UInt16(12),
            UInt16(0),
            UInt32(40),
            UInt32(0),
            UInt32(2),
            UInt32(0x20),
            UInt32(0x21),
            UInt32(1),
            UInt32(0x1F600),
            UInt32(0x1F602),
            UInt32(50),
        ]);
        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.map_glyph(0x21).unwrap(), Some(2));
        assert_eq!(subtable.map_glyph(0x1F601).unwrap(), Some(51));
        assert_eq!(subtable.map_glyph(0x1F603).unwrap(), None);
    }

    #[test]
    fn shared_subtables_are_decoded_once() {
        let mut data = writer::convert(&[
            UInt16(0),
            UInt16(3),
            UInt16(0),
            UInt16(3),
            UInt32(28),
            UInt16(3),
            UInt16(1),
            UInt32(28),
            UInt16(3),
            UInt16(10),
            UInt32(28 + 44),
        ]);
        data.extend(format4());
        data.extend(writer::convert(&[
            UInt16(6),
            UInt16(12),
            UInt16(0),
            UInt16(0x41),
            UInt16(1),
            UInt16(99),
        ]));
        let cmap = ReadScope::new(&data).read::<Cmap<'_>>().unwrap();
        assert_eq!(cmap.encoding_records.len(), 3);
        assert_eq!(cmap.subtables.len(), 2);
        // (3, 10) is preferred over the BMP subtables
        assert_eq!(cmap.map_glyph('A').unwrap(), Some(99));
        assert_eq!(
            cmap.find_subtable(PlatformId::UNICODE, EncodingId::UNICODE_BMP)
                .unwrap()
                .map_glyph(0x41)
                .unwrap(),
            Some(1)
        );
    }
}
