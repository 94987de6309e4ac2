//! Memoized views of a font for user interfaces and font registration.
//!
//! A [Parser] wraps one [FontObject]. Each view is computed from the decoded tables on first
//! access and kept for the lifetime of the parser, so repeated calls neither walk the tables
//! again nor decode anything.

use std::cell::OnceCell;
use std::fmt;

use log::warn;

use crate::font::FontObject;
use crate::get_name::Names;
use crate::instance;
use crate::tables::gsub::FeatureSet;
use crate::tables::variable_fonts::fvar::VariationAxisRecord;
use crate::tables::variable_fonts::stat::{AxisValueTable, AxisValueTableFlags, StatTable};
use crate::tag::{self, DisplayTag};

/// Widths as a percentage of normal for `usWidthClass` 1 to 9.
const WIDTH_CLASS_PERCENT: [f32; 9] = [50.0, 62.5, 75.0, 87.5, 100.0, 112.5, 125.0, 150.0, 200.0];

const DEFAULT_WEIGHT: u16 = 400;

/// A variation axis with its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub tag: u32,
    pub min: f32,
    pub default: f32,
    pub max: f32,
    pub flags: u16,
    pub hidden: bool,
    pub name: Option<String>,
}

/// A named instance with its names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedInstance {
    pub name: String,
    pub flags: u16,
    /// User coordinates per axis, in axis order.
    pub coordinates: Vec<(u32, f32)>,
    pub postscript_name: Option<String>,
}

/// The style attributes of a font with names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub design_axes: Vec<StatAxis>,
    pub values: Vec<StatValue>,
    pub elided_fallback_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatAxis {
    pub tag: u32,
    pub name: Option<String>,
    pub ordering: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatValue {
    pub flags: AxisValueTableFlags,
    pub name: Option<String>,
    pub kind: StatValueKind,
}

/// The four axis value formats.
#[derive(Debug, Clone, PartialEq)]
pub enum StatValueKind {
    Single {
        axis_index: u16,
        value: f32,
    },
    Range {
        axis_index: u16,
        nominal: f32,
        min: f32,
        max: f32,
    },
    Linked {
        axis_index: u16,
        value: f32,
        linked_value: f32,
    },
    /// Values on several axes at once.
    Combination(Vec<(u16, f32)>),
}

/// CSS `@font-face` style descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDescriptor {
    pub family: Option<String>,
    /// A weight or a `min max` weight range.
    pub weight: String,
    /// A percentage or a `min% max%` range.
    pub stretch: String,
    /// `normal`, `italic` or `oblique <min>deg <max>deg`.
    pub style: String,
}

/// Memoized views of one font.
pub struct Parser<'a> {
    font: FontObject<'a>,
    axes: OnceCell<Vec<Axis>>,
    features: OnceCell<FeatureSet>,
    stat: OnceCell<Option<Stat>>,
    postscript_name: OnceCell<Option<String>>,
    instances: OnceCell<Vec<NamedInstance>>,
    face_descriptor: OnceCell<FaceDescriptor>,
}

impl<'a> Parser<'a> {
    pub fn new(font: FontObject<'a>) -> Parser<'a> {
        Parser {
            font,
            axes: OnceCell::new(),
            features: OnceCell::new(),
            stat: OnceCell::new(),
            postscript_name: OnceCell::new(),
            instances: OnceCell::new(),
            face_descriptor: OnceCell::new(),
        }
    }

    pub fn font(&self) -> &FontObject<'a> {
        &self.font
    }

    /// The variation axes, in `fvar` order. Empty for a static font.
    pub fn axes(&self) -> &[Axis] {
        self.axes.get_or_init(|| {
            let fvar = match self.font.fvar() {
                Some(fvar) => fvar,
                None => return Vec::new(),
            };
            let names = self.font.names();
            fvar.axes()
                .map(|record| axis(&record, names.as_deref()))
                .collect()
        })
    }

    pub fn axis(&self, axis_tag: u32) -> Option<&Axis> {
        self.axes().iter().find(|axis| axis.tag == axis_tag)
    }

    /// The `GSUB` feature tags. Empty without a `GSUB` table.
    pub fn features(&self) -> &FeatureSet {
        self.features.get_or_init(|| {
            self.font
                .gsub()
                .map(|gsub| gsub.features())
                .unwrap_or_default()
        })
    }

    /// The `STAT` table with names resolved, if present.
    pub fn stat(&self) -> Option<&Stat> {
        self.stat
            .get_or_init(|| {
                let stat = self.font.stat()?;
                Some(resolve_stat(&stat, self.font.names().as_deref()))
            })
            .as_ref()
    }

    /// The PostScript name. Names without one fall back to the unique ID.
    pub fn postscript_name(&self) -> Option<&str> {
        self.postscript_name
            .get_or_init(|| {
                let names = self.font.names()?;
                names.postscript_name().map(str::to_owned)
            })
            .as_deref()
    }

    /// The named instances, in `fvar` order. Empty for a static font.
    pub fn instances(&self) -> &[NamedInstance] {
        self.instances.get_or_init(|| {
            let fonts = instance::named_instances(&self.font).unwrap_or_else(|err| {
                warn!("unable to read named instances: {}", err);
                Vec::new()
            });
            fonts
                .iter()
                .filter_map(|font| {
                    let instance = font.instance()?;
                    let names = font.names()?;
                    Some(NamedInstance {
                        name: names.subfamily().unwrap_or_default().to_owned(),
                        flags: instance.flags,
                        coordinates: instance.coordinates.clone(),
                        postscript_name: names.postscript_name().map(str::to_owned),
                    })
                })
                .collect()
        })
    }

    /// `@font-face` descriptors covering the whole design space of the font.
    pub fn face_descriptor(&self) -> &FaceDescriptor {
        self.face_descriptor.get_or_init(|| self.describe_face())
    }

    fn describe_face(&self) -> FaceDescriptor {
        let names = self.font.names();
        let family = names
            .as_deref()
            .and_then(|names| names.typographic_family().or_else(|| names.family()))
            .map(str::to_owned);
        let os2 = self.font.os2();

        let weight = match self.axis(tag::WGHT) {
            Some(axis) => format!("{} {}", axis.min, axis.max),
            None => os2
                .as_ref()
                .map_or(DEFAULT_WEIGHT, |os2| os2.us_weight_class)
                .to_string(),
        };
        let stretch = match self.axis(tag::WDTH) {
            Some(axis) => format!("{}% {}%", axis.min, axis.max),
            None => {
                let percent = os2
                    .as_ref()
                    .and_then(|os2| {
                        let class = usize::from(os2.us_width_class);
                        WIDTH_CLASS_PERCENT.get(class.checked_sub(1)?).copied()
                    })
                    .unwrap_or(100.0);
                format!("{}%", percent)
            }
        };
        let style = match self.axis(tag::SLNT) {
            Some(axis) if axis.min != axis.max => {
                format!("oblique {}deg {}deg", axis.min, axis.max)
            }
            _ => {
                let italic = match &os2 {
                    Some(os2) => os2.is_italic(),
                    None => self.font.head().map_or(false, |head| head.is_italic()),
                };
                String::from(if italic { "italic" } else { "normal" })
            }
        };

        FaceDescriptor {
            family,
            weight,
            stretch,
            style,
        }
    }
}

fn axis(record: &VariationAxisRecord, names: Option<&Names>) -> Axis {
    Axis {
        tag: record.axis_tag,
        min: f32::from(record.min_value),
        default: f32::from(record.default_value),
        max: f32::from(record.max_value),
        flags: record.flags,
        hidden: record.is_hidden(),
        name: lookup_name(names, record.axis_name_id),
    }
}

fn lookup_name(names: Option<&Names>, name_id: u16) -> Option<String> {
    names
        .and_then(|names| names.lookup(name_id))
        .map(str::to_owned)
}

fn resolve_stat(stat: &StatTable<'_>, names: Option<&Names>) -> Stat {
    let design_axes = stat
        .design_axes()
        .filter_map(|record| match record {
            Ok(record) => Some(StatAxis {
                tag: record.axis_tag,
                name: lookup_name(names, record.axis_name_id),
                ordering: record.axis_ordering,
            }),
            Err(err) => {
                warn!("STAT: skipping design axis: {}", err);
                None
            }
        })
        .collect();

    let values = stat
        .axis_value_tables()
        .filter_map(|table| match table {
            Ok(table) => Some(StatValue {
                flags: table.flags(),
                name: lookup_name(names, table.value_name_id()),
                kind: value_kind(&table),
            }),
            Err(err) => {
                warn!("STAT: skipping axis value table: {}", err);
                None
            }
        })
        .collect();

    Stat {
        design_axes,
        values,
        elided_fallback_name: stat
            .elided_fallback_name_id
            .and_then(|name_id| lookup_name(names, name_id)),
    }
}

fn value_kind(table: &AxisValueTable<'_>) -> StatValueKind {
    match table {
        AxisValueTable::Format1(format1) => StatValueKind::Single {
            axis_index: format1.axis_index,
            value: f32::from(format1.value),
        },
        AxisValueTable::Format2(format2) => StatValueKind::Range {
            axis_index: format2.axis_index,
            nominal: f32::from(format2.nominal_value),
            min: f32::from(format2.range_min_value),
            max: f32::from(format2.range_max_value),
        },
        AxisValueTable::Format3(format3) => StatValueKind::Linked {
            axis_index: format3.axis_index,
            value: f32::from(format3.value),
            linked_value: f32::from(format3.linked_value),
        },
        AxisValueTable::Format4(format4) => StatValueKind::Combination(
            format4
                .axis_values
                .iter_res()
                .filter_map(Result::ok)
                .map(|value| (value.axis_index, f32::from(value.value)))
                .collect(),
        ),
    }
}

impl Stat {
    /// The format 3 value whose linked value is `linked_value`.
    ///
    /// Queried with a bold weight this finds the regular weight the bold style is linked from.
    pub fn bold_mapping(&self, linked_value: f32) -> Option<&StatValue> {
        self.values.iter().find(|value| match value.kind {
            StatValueKind::Linked {
                linked_value: linked,
                ..
            } => linked == linked_value,
            _ => false,
        })
    }
}

impl StatValue {
    /// The value on a single axis: the nominal value of a range. `None` for combinations.
    pub fn value(&self) -> Option<f32> {
        match self.kind {
            StatValueKind::Single { value, .. } => Some(value),
            StatValueKind::Linked { value, .. } => Some(value),
            StatValueKind::Range { nominal, .. } => Some(nominal),
            StatValueKind::Combination(_) => None,
        }
    }

    pub fn is_elidable(&self) -> bool {
        self.flags
            .contains(AxisValueTableFlags::ELIDABLE_AXIS_VALUE_NAME)
    }
}

impl NamedInstance {
    pub fn coordinate(&self, axis_tag: u32) -> Option<f32> {
        self.coordinates
            .iter()
            .find(|(tag, _)| *tag == axis_tag)
            .map(|&(_, value)| value)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' {} {} {}",
            DisplayTag(self.tag),
            self.min,
            self.default,
            self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontFile;
    use crate::tests::{
        fvar_table, gsub_table, sfnt, truetype_tables, variable_tables, TRUETYPE_VERSION,
    };

    #[test]
    fn variable_font_views() {
        let data = sfnt(TRUETYPE_VERSION, &variable_tables());
        let file = FontFile::parse(&data).unwrap();
        let fonts = file.fonts().unwrap();
        let parser = Parser::new(fonts[0].clone());

        let axes = parser.axes();
        assert_eq!(axes.len(), 1);
        assert_eq!(axes[0].to_string(), "'wght' 100 400 900");
        assert_eq!(axes[0].name.as_deref(), Some("Weight"));
        assert!(!axes[0].hidden);

        assert!(parser.features().contains(tag::LIGA));
        assert_eq!(parser.features().to_string(), "liga smcp");

        let stat = parser.stat().unwrap();
        assert_eq!(stat.design_axes[0].tag, tag::WGHT);
        assert_eq!(stat.values.len(), 3);
        assert_eq!(stat.elided_fallback_name.as_deref(), Some("Regular"));
        let regular = stat.bold_mapping(700.0).unwrap();
        assert_eq!(regular.value(), Some(400.0));
        assert_eq!(regular.name.as_deref(), Some("Regular"));
        assert!(regular.is_elidable());
        assert!(stat.bold_mapping(400.0).is_none());

        assert_eq!(parser.postscript_name(), Some("VarSans-Regular"));

        let instances = parser.instances();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].name, "Bold");
        assert_eq!(instances[1].coordinate(tag::WGHT), Some(700.0));
        assert_eq!(instances[1].postscript_name.as_deref(), Some("VarSans-Bd"));
    }

    #[test]
    fn views_are_memoized() {
        let data = sfnt(TRUETYPE_VERSION, &variable_tables());
        let file = FontFile::parse(&data).unwrap();
        let fonts = file.fonts().unwrap();
        let parser = Parser::new(fonts[0].clone());

        let axes = parser.axes().as_ptr();
        let features: *const FeatureSet = parser.features();
        assert_eq!(parser.axes().as_ptr(), axes);
        assert!(std::ptr::eq(parser.features(), features));
        parser.stat();
        parser.stat();
        parser.postscript_name();
        parser.postscript_name();
        for table in [tag::FVAR, tag::GSUB, tag::STAT, tag::NAME] {
            assert_eq!(parser.font().decode_count(table), 1);
        }
    }

    #[test]
    fn static_face_descriptor() {
        let data = sfnt(TRUETYPE_VERSION, &truetype_tables("Test Serif", "Bold", 700));
        let file = FontFile::parse(&data).unwrap();
        let parser = Parser::new(file.fonts().unwrap().remove(0));
        assert!(parser.axes().is_empty());
        assert!(parser.instances().is_empty());
        assert!(parser.features().is_empty());
        assert!(parser.stat().is_none());
        assert_eq!(
            parser.face_descriptor(),
            &FaceDescriptor {
                family: Some(String::from("Test Serif")),
                weight: String::from("700"),
                stretch: String::from("100%"),
                style: String::from("normal"),
            }
        );
    }

    #[test]
    fn variable_face_descriptor() {
        let mut tables = truetype_tables("Flex", "Regular", 400);
        tables.push((
            *b"fvar",
            fvar_table(
                &[
                    (*b"wght", 100.0, 400.0, 1000.0, 256),
                    (*b"wdth", 25.0, 100.0, 151.0, 257),
                    (*b"slnt", -10.0, 0.0, 0.0, 258),
                ],
                &[],
            ),
        ));
        tables.push((*b"GSUB", gsub_table(&[*b"latn"], &[*b"liga", *b"ss01"])));
        let data = sfnt(TRUETYPE_VERSION, &tables);
        let file = FontFile::parse(&data).unwrap();
        let parser = Parser::new(file.fonts().unwrap().remove(0));
        let face = parser.face_descriptor();
        assert_eq!(face.weight, "100 1000");
        assert_eq!(face.stretch, "25% 151%");
        assert_eq!(face.style, "oblique -10deg 0deg");
        assert!(parser.features().contains(tag!(b"ss01")));
        assert!(parser.features().contains(tag::LIGA));
    }
}
