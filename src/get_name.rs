//! Decoding of `name` table strings and selection of the preferred set of names.
//!
//! Every record is decoded and grouped by platform and language, in the order the groups first
//! appear in the table. One group is then selected as the font's names: the first group with a
//! PostScript name in US English, then in the universal language, then in Canadian French, then
//! in any language. Without any PostScript name the first group is used.

use std::borrow::Cow;
use std::collections::BTreeMap;

use encoding_rs::{Encoding, MACINTOSH, UTF_16BE};
use log::{debug, warn};

use crate::error::ParseError;
use crate::tables::{NameRecord, NameTable};

pub const COPYRIGHT: u16 = 0;
pub const FAMILY: u16 = 1;
pub const SUBFAMILY: u16 = 2;
pub const UNIQUE_ID: u16 = 3;
pub const FULL_NAME: u16 = 4;
pub const VERSION: u16 = 5;
pub const POSTSCRIPT_NAME: u16 = 6;
pub const TYPOGRAPHIC_FAMILY: u16 = 16;
pub const TYPOGRAPHIC_SUBFAMILY: u16 = 17;

/// Symbolic keys for name IDs 0 to 24. ID 15 is reserved.
const NAME_KEYS: [&str; 25] = [
    "copyright",
    "fontFamily",
    "fontSubfamily",
    "ID",
    "fullName",
    "version",
    "postScriptName",
    "trademark",
    "manufacturer",
    "designer",
    "description",
    "urlVendor",
    "urlDesigner",
    "licence",
    "licenceURL",
    "---",
    "typoFamilyName",
    "typoSubfamilyName",
    "compatibleFull",
    "sampleText",
    "postScriptCID",
    "wwsFamilyName",
    "wwsSubfamilyName",
    "lightPalette",
    "darkPalette",
];

const LANGUAGE_PRIORITY: [u16; 3] = [0x0409, 0x0000, 0x0C0C];

/// The symbolic key of a name ID, `_<id>` for IDs without one.
pub fn name_key(name_id: u16) -> Cow<'static, str> {
    match NAME_KEYS.get(usize::from(name_id)) {
        Some(key) => Cow::Borrowed(key),
        None => Cow::Owned(format!("_{}", name_id)),
    }
}

/// The names of one platform and language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGroup {
    pub platform_id: u16,
    pub language_id: u16,
    /// The BCP 47 tag for language IDs of 0x8000 and above in format 1 tables.
    pub language_tag: Option<String>,
    strings: BTreeMap<u16, String>,
}

/// The selected names of a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Names {
    /// Language of the selected group.
    pub language_id: u16,
    strings: BTreeMap<u16, String>,
    groups: Vec<NameGroup>,
}

enum NameEncoding {
    Utf16Be,
    MacRoman,
    Ascii,
}

impl NameEncoding {
    fn for_record(platform_id: u16, encoding_id: u16) -> NameEncoding {
        match (platform_id, encoding_id) {
            (0, _) | (3, 0) | (1, 25) => NameEncoding::Utf16Be,
            (1, 0) => NameEncoding::MacRoman,
            (_, 1 | 3 | 4 | 5 | 10) => NameEncoding::Utf16Be,
            (_, 0) => NameEncoding::Ascii,
            _ => {
                warn!(
                    "name record with platform {} encoding {} read as ASCII",
                    platform_id, encoding_id
                );
                NameEncoding::Ascii
            }
        }
    }

    fn decode(&self, data: &[u8]) -> String {
        let encoding: &'static Encoding = match self {
            NameEncoding::Utf16Be => UTF_16BE,
            NameEncoding::MacRoman => MACINTOSH,
            NameEncoding::Ascii => {
                return data.iter().map(|&byte| char::from(byte & 0x7F)).collect()
            }
        };
        let (text, _had_errors) = encoding.decode_without_bom_handling(data);
        text.into_owned()
    }
}

impl NameGroup {
    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.strings.get(&name_id).map(String::as_str)
    }
}

impl Names {
    /// Decode and select the names of a `name` table.
    pub fn from_table(table: &NameTable<'_>) -> Result<Names, ParseError> {
        let mut groups: Vec<NameGroup> = Vec::new();
        for record in &table.name_records {
            let text = decode_record(table, &record)?;
            let index = match groups.iter().position(|group| {
                group.platform_id == record.platform_id && group.language_id == record.language_id
            }) {
                Some(index) => index,
                None => {
                    groups.push(NameGroup {
                        platform_id: record.platform_id,
                        language_id: record.language_id,
                        language_tag: language_tag(table, record.language_id),
                        strings: BTreeMap::new(),
                    });
                    groups.len() - 1
                }
            };
            // A later record with the same ID replaces an earlier one
            groups[index].strings.insert(record.name_id, text);
        }
        Ok(Names::select(groups))
    }

    fn select(groups: Vec<NameGroup>) -> Names {
        let with_postscript_name =
            |group: &&NameGroup| group.strings.contains_key(&POSTSCRIPT_NAME);
        let selected = LANGUAGE_PRIORITY
            .iter()
            .find_map(|&language_id| {
                groups
                    .iter()
                    .filter(with_postscript_name)
                    .find(|group| group.language_id == language_id)
            })
            .or_else(|| groups.iter().find(with_postscript_name))
            .or_else(|| groups.first());

        let (language_id, mut strings) = match selected {
            Some(group) => (group.language_id, group.strings.clone()),
            None => (0, BTreeMap::new()),
        };
        if selected.map_or(false, |group| !group.strings.contains_key(&POSTSCRIPT_NAME)) {
            debug!("no name group has a PostScript name, using language {:#x}", language_id);
        }

        if !strings.contains_key(&FAMILY) {
            if let Some(family) = groups.iter().find_map(|group| group.get(FAMILY)) {
                strings.insert(FAMILY, family.to_owned());
            }
        }
        if !strings.contains_key(&POSTSCRIPT_NAME) {
            if let Some(unique_id) = strings.get(&UNIQUE_ID).cloned() {
                strings.insert(POSTSCRIPT_NAME, unique_id);
            }
        }

        Names {
            language_id,
            strings,
            groups,
        }
    }

    /// A copy of these names for a named instance of a variable font.
    ///
    /// The subfamily becomes `subfamily`. The PostScript name becomes `postscript_name` if
    /// given, or the family and subfamily joined by a hyphen with spaces removed.
    pub fn for_instance(&self, subfamily: &str, postscript_name: Option<&str>) -> Names {
        let mut names = self.clone();
        names.strings.insert(SUBFAMILY, subfamily.to_owned());
        let postscript_name = match postscript_name {
            Some(name) => name.to_owned(),
            None => format!("{}-{}", self.family().unwrap_or_default(), subfamily)
                .chars()
                .filter(|c| *c != ' ')
                .collect(),
        };
        names.strings.insert(POSTSCRIPT_NAME, postscript_name);
        names
    }

    /// The string for `name_id` in the selected group.
    pub fn get(&self, name_id: u16) -> Option<&str> {
        self.strings.get(&name_id).map(String::as_str)
    }

    /// The string for `name_id` in any group, preferring the selected one.
    pub fn lookup(&self, name_id: u16) -> Option<&str> {
        self.get(name_id)
            .or_else(|| self.groups.iter().find_map(|group| group.get(name_id)))
    }

    pub fn copyright(&self) -> Option<&str> {
        self.get(COPYRIGHT)
    }

    pub fn family(&self) -> Option<&str> {
        self.get(FAMILY)
    }

    pub fn subfamily(&self) -> Option<&str> {
        self.get(SUBFAMILY)
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.get(UNIQUE_ID)
    }

    pub fn full_name(&self) -> Option<&str> {
        self.get(FULL_NAME)
    }

    pub fn version(&self) -> Option<&str> {
        self.get(VERSION)
    }

    pub fn postscript_name(&self) -> Option<&str> {
        self.get(POSTSCRIPT_NAME)
    }

    pub fn typographic_family(&self) -> Option<&str> {
        self.get(TYPOGRAPHIC_FAMILY)
    }

    pub fn typographic_subfamily(&self) -> Option<&str> {
        self.get(TYPOGRAPHIC_SUBFAMILY)
    }

    /// The selected names keyed by their symbolic key, in name ID order.
    pub fn entries(&self) -> impl Iterator<Item = (Cow<'static, str>, &str)> + '_ {
        self.strings
            .iter()
            .map(|(&name_id, text)| (name_key(name_id), text.as_str()))
    }

    /// All decoded groups in table order.
    pub fn groups(&self) -> &[NameGroup] {
        &self.groups
    }
}

fn decode_record(table: &NameTable<'_>, record: &NameRecord) -> Result<String, ParseError> {
    let data = table.string_data(record)?;
    Ok(NameEncoding::for_record(record.platform_id, record.encoding_id).decode(data))
}

fn language_tag(table: &NameTable<'_>, language_id: u16) -> Option<String> {
    let index = usize::from(language_id.checked_sub(0x8000)?);
    let record = table.opt_langtag_records.as_ref()?.get_item(index)?;
    let data = table
        .string_storage
        .offset_length(usize::from(record.offset), usize::from(record.length))
        .ok()?
        .data();
    Some(NameEncoding::Utf16Be.decode(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::name_table;

    fn decode_names(records: &[(u16, u16, u16, u16, &str)]) -> Names {
        let data = name_table(records);
        let table = ReadScope::new(&data).read::<NameTable<'_>>().unwrap();
        Names::from_table(&table).unwrap()
    }

    #[test]
    fn prefers_us_english() {
        let names = decode_names(&[
            (3, 1, 0x0407, FAMILY, "Schrift"),
            (3, 1, 0x0407, POSTSCRIPT_NAME, "Schrift-Regular"),
            (3, 1, 0x0409, FAMILY, "Font"),
            (3, 1, 0x0409, SUBFAMILY, "Regular"),
            (3, 1, 0x0409, POSTSCRIPT_NAME, "Font-Regular"),
        ]);
        assert_eq!(names.language_id, 0x0409);
        assert_eq!(names.family(), Some("Font"));
        assert_eq!(names.subfamily(), Some("Regular"));
        assert_eq!(names.groups().len(), 2);
    }

    #[test]
    fn falls_back_to_universal_then_canadian_french() {
        let names = decode_names(&[
            (3, 1, 0x0C0C, POSTSCRIPT_NAME, "Police"),
            (1, 0, 0, POSTSCRIPT_NAME, "Mac"),
        ]);
        assert_eq!(names.postscript_name(), Some("Mac"));

        let names = decode_names(&[
            (3, 1, 0x0407, POSTSCRIPT_NAME, "Schrift"),
            (3, 1, 0x0C0C, POSTSCRIPT_NAME, "Police"),
        ]);
        assert_eq!(names.postscript_name(), Some("Police"));
    }

    #[test]
    fn missing_names_are_filled_in() {
        let names = decode_names(&[
            (3, 1, 0x0407, FAMILY, "Schrift"),
            (3, 1, 0x0409, UNIQUE_ID, "Font 1.0"),
            (3, 1, 0x0409, 256, "Swash"),
        ]);
        // No group has a PostScript name, so the first group is selected
        assert_eq!(names.language_id, 0x0407);
        let names = decode_names(&[
            (3, 1, 0x0409, UNIQUE_ID, "Font 1.0"),
            (3, 1, 0x0407, FAMILY, "Schrift"),
            (3, 1, 0x0409, 256, "Swash"),
        ]);
        assert_eq!(names.family(), Some("Schrift"));
        assert_eq!(names.postscript_name(), Some("Font 1.0"));
        let entries = names.entries().collect::<Vec<_>>();
        assert_eq!(entries[0], (Cow::Borrowed("fontFamily"), "Schrift"));
        assert!(entries.contains(&(Cow::Owned("_256".to_string()), "Swash")));
    }

    #[test]
    fn instance_names() {
        let names = decode_names(&[
            (3, 1, 0x0409, FAMILY, "My Font"),
            (3, 1, 0x0409, SUBFAMILY, "Regular"),
        ]);
        let bold = names.for_instance("Semi Bold", None);
        assert_eq!(bold.subfamily(), Some("Semi Bold"));
        assert_eq!(bold.postscript_name(), Some("MyFont-SemiBold"));
        let named = names.for_instance("Bold", Some("MyFont-Bd"));
        assert_eq!(named.postscript_name(), Some("MyFont-Bd"));
        assert_eq!(names.subfamily(), Some("Regular"));
    }
}
