//! Named instances of variable fonts.
//!
//! Each instance record in `fvar` becomes a [FontObject] sharing the base font's bytes and
//! decoded tables. Only the names differ: the subfamily is the instance name and the PostScript
//! name is the instance's own or one synthesized from the family and subfamily.

use std::rc::Rc;

use log::{debug, warn};

use crate::error::ParseError;
use crate::font::FontObject;
use crate::get_name::Names;
use crate::tables::variable_fonts::fvar::OwnedTuple;
use crate::tag;

/// A `postScriptNameID` of 0xFFFF means the instance has no PostScript name.
const NO_NAME_ID: u16 = 0xFFFF;

/// A named instance: a position in the design space with its own names.
#[derive(Debug)]
pub struct Instance {
    /// Index of the instance record in `fvar`.
    pub index: usize,
    pub subfamily_name_id: u16,
    pub flags: u16,
    /// User coordinates for each axis, in `fvar` axis order.
    pub coordinates: Vec<(u32, f32)>,
    /// The coordinates normalized and remapped through `avar`.
    pub normalized: OwnedTuple,
    pub names: Rc<Names>,
}

impl Instance {
    /// The user coordinate on the axis `axis_tag`.
    pub fn coordinate(&self, axis_tag: u32) -> Option<f32> {
        self.coordinates
            .iter()
            .find(|(tag, _)| *tag == axis_tag)
            .map(|&(_, value)| value)
    }
}

/// Produce one font per named instance of `font`, in `fvar` order.
///
/// Empty if the font has no `fvar` table. A variable font needs a `name` table to name its
/// instances.
pub fn named_instances<'a>(font: &FontObject<'a>) -> Result<Vec<FontObject<'a>>, ParseError> {
    let fvar = match font.fvar() {
        Some(fvar) => fvar,
        None => return Ok(Vec::new()),
    };
    let names = font.names().ok_or(ParseError::MissingTable(tag::NAME))?;
    let avar = font.avar();
    let axis_tags = fvar.axes().map(|axis| axis.axis_tag).collect::<Vec<_>>();

    let instances = fvar
        .instances()
        .enumerate()
        .map(|(index, record)| {
            let record = record?;
            let normalized = fvar.normalize(record.coordinates.iter(), avar.as_deref())?;
            let coordinates = axis_tags
                .iter()
                .copied()
                .zip(record.coordinates.iter().map(f32::from))
                .collect();
            let subfamily = match names.lookup(record.subfamily_name_id) {
                Some(name) => name.to_owned(),
                None => {
                    warn!(
                        "instance {}: no name for subfamily name id {}",
                        index, record.subfamily_name_id
                    );
                    format!("Instance {}", index)
                }
            };
            let postscript_name = record
                .post_script_name_id
                .filter(|&name_id| name_id != NO_NAME_ID)
                .and_then(|name_id| names.lookup(name_id));
            let instance = Instance {
                index,
                subfamily_name_id: record.subfamily_name_id,
                flags: record.flags,
                coordinates,
                normalized,
                names: Rc::new(names.for_instance(&subfamily, postscript_name)),
            };
            Ok(font.with_instance(instance))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    debug!(
        "font {}: synthesized {} named instances",
        font.index(),
        instances.len()
    );
    Ok(instances)
}
