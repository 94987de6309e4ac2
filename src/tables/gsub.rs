//! `GSUB` feature and script directories.
//!
//! Only the script and feature lists are read. Lookups are not decoded.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/gsub>

use std::collections::BTreeSet;
use std::fmt;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFixedSizeDep, ReadScope};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::size;
use crate::tag::DisplayTag;

/// The header and directories of a `GSUB` table.
#[derive(Debug, Clone)]
pub struct GsubTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub script_records: Vec<ScriptRecord>,
    pub feature_records: Vec<FeatureRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub script_tag: u32,
    pub has_default_lang_sys: bool,
    /// Tags of the language systems with their own record.
    pub lang_sys_tags: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    pub feature_tag: u32,
    pub lookup_indices: Vec<u16>,
}

/// The set of feature tags present in a font.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    tags: BTreeSet<u32>,
}

impl ReadBinary for GsubTable {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let table = ctxt.scope();

        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        // Versions 1.0 and 1.1; 1.1 adds a FeatureVariations offset, which is not needed here
        ctxt.check_version(major_version == 1)?;
        let script_list_offset = usize::from(ctxt.read_u16be()?);
        let feature_list_offset = usize::from(ctxt.read_u16be()?);
        let _lookup_list_offset = ctxt.read_u16be()?;

        let script_records = match list_ctxt(table, script_list_offset)? {
            Some((scope, mut ctxt, count)) => ctxt
                .read_array_dep::<ScriptRecord>(count, scope)?
                .read_to_vec()?,
            None => Vec::new(),
        };
        let feature_records = match list_ctxt(table, feature_list_offset)? {
            Some((scope, mut ctxt, count)) => ctxt
                .read_array_dep::<FeatureRecord>(count, scope)?
                .read_to_vec()?,
            None => Vec::new(),
        };

        Ok(GsubTable {
            major_version,
            minor_version,
            script_records,
            feature_records,
        })
    }
}

/// A context positioned after the count of a list whose record offsets are relative to the
/// list. `None` for a null offset.
fn list_ctxt(
    table: ReadScope<'_>,
    offset: usize,
) -> Result<Option<(ReadScope<'_>, ReadCtxt<'_>, usize)>, ParseError> {
    if offset == 0 {
        return Ok(None);
    } else if offset >= table.data().len() {
        return Err(ParseError::BadOffset);
    }
    let scope = table.offset(offset);
    let mut ctxt = scope.ctxt();
    let count = usize::from(ctxt.read_u16be()?);
    Ok(Some((scope, ctxt, count)))
}

impl ReadBinaryDep for ScriptRecord {
    type Args<'a> = ReadScope<'a>;
    type HostType<'a> = ScriptRecord;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, scope: ReadScope<'a>) -> Result<Self, ParseError> {
        let script_tag = ctxt.read_u32be()?;
        let script_offset = usize::from(ctxt.read_u16be()?);
        let mut script = scope.offset(script_offset).ctxt();
        let default_lang_sys_offset = script.read_u16be()?;
        let lang_sys_count = usize::from(script.read_u16be()?);
        // LangSysRecord: tag then offset
        let lang_sys_tags = script
            .read_array::<(U32Be, U16Be)>(lang_sys_count)?
            .iter()
            .map(|(tag, _offset)| tag)
            .collect();
        Ok(ScriptRecord {
            script_tag,
            has_default_lang_sys: default_lang_sys_offset != 0,
            lang_sys_tags,
        })
    }
}

impl ReadFixedSizeDep for ScriptRecord {
    fn size(_scope: ReadScope<'_>) -> usize {
        size::U32 + size::U16
    }
}

impl ReadBinaryDep for FeatureRecord {
    type Args<'a> = ReadScope<'a>;
    type HostType<'a> = FeatureRecord;

    fn read_dep<'a>(ctxt: &mut ReadCtxt<'a>, scope: ReadScope<'a>) -> Result<Self, ParseError> {
        let feature_tag = ctxt.read_u32be()?;
        let feature_offset = usize::from(ctxt.read_u16be()?);
        let mut feature = scope.offset(feature_offset).ctxt();
        let _feature_params = feature.read_u16be()?;
        let lookup_index_count = usize::from(feature.read_u16be()?);
        let lookup_indices = feature.read_array::<U16Be>(lookup_index_count)?.to_vec();
        Ok(FeatureRecord {
            feature_tag,
            lookup_indices,
        })
    }
}

impl ReadFixedSizeDep for FeatureRecord {
    fn size(_scope: ReadScope<'_>) -> usize {
        size::U32 + size::U16
    }
}

impl GsubTable {
    /// The distinct feature tags of the feature list.
    pub fn features(&self) -> FeatureSet {
        FeatureSet {
            tags: self
                .feature_records
                .iter()
                .map(|record| record.feature_tag)
                .collect(),
        }
    }

    pub fn script_tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.script_records.iter().map(|record| record.script_tag)
    }
}

impl FeatureSet {
    pub fn contains(&self, feature_tag: u32) -> bool {
        self.tags.contains(&feature_tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.tags.iter().copied()
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", DisplayTag(tag))?;
            first = false;
        }
        Ok(())
    }
}
