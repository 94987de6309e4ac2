//! Parsing of the `glyf` table.
//!
//! > This table contains information that describes the glyphs in the font in the TrueType outline
//! > format.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/glyf>
//!
//! Reading the table only slices it into per-glyph records using `loca`. Outlines are decoded
//! when a glyph is requested with [GlyfTable::glyph].

use std::iter;

use bitflags::bitflags;
use log::warn;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U8};
use crate::error::ParseError;
use crate::tables::loca::{LocaOffsets, LocaTable};
use crate::tables::F2Dot14;
use crate::SafeFrom;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT                       = 0b00000001;
        const X_SHORT_VECTOR                       = 0b00000010;
        const Y_SHORT_VECTOR                       = 0b00000100;
        const REPEAT_FLAG                          = 0b00001000;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0b00010000;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0b00100000;
        const OVERLAP_SIMPLE                       = 0b01000000;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct CompositeGlyphFlag: u16 {
        /// Arguments are 16-bit; otherwise they are bytes.
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        /// Arguments are signed xy values; otherwise they are unsigned point numbers.
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        /// A single scale for both directions follows the arguments.
        const WE_HAVE_A_SCALE = 0x0008;
        /// At least one more component follows this one.
        const MORE_COMPONENTS = 0x0020;
        /// Separate x and y scales follow the arguments.
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        /// A 2 by 2 transformation follows the arguments.
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        /// Instructions follow the last component.
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// `glyf` table
///
/// Holds the table bytes and the `loca` offsets. A glyph's range is checked when that glyph is
/// requested, so one bad `loca` entry only affects its own glyph.
#[derive(Debug, Clone)]
pub struct GlyfTable<'a> {
    scope: ReadScope<'a>,
    offsets: LocaOffsets<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Glyph<'a> {
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    pub data: GlyphData<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum GlyphData<'a> {
    Simple(SimpleGlyph<'a>),
    Composite {
        glyphs: Vec<CompositeGlyph>,
        instructions: &'a [u8],
    },
}

#[derive(Debug, PartialEq, Clone)]
pub struct SimpleGlyph<'a> {
    pub end_pts_of_contours: Vec<u16>,
    pub instructions: &'a [u8],
    pub flags: Vec<SimpleGlyphFlag>,
    pub coordinates: Vec<Point>,
}

/// One component of a composite glyph.
#[derive(Debug, PartialEq, Clone)]
pub struct CompositeGlyph {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    pub argument1: CompositeGlyphArgument,
    pub argument2: CompositeGlyphArgument,
    pub scale: Option<CompositeGlyphScale>,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphArgument {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompositeGlyphScale {
    Scale(F2Dot14),
    XY { x_scale: F2Dot14, y_scale: F2Dot14 },
    Matrix([[F2Dot14; 2]; 2]),
}

/// How a component is positioned relative to the glyph built so far.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ComponentAnchor {
    /// Translate the component by `(x, y)`.
    Offset { x: i32, y: i32 },
    /// Align point `child` of the component with point `parent` of the composite.
    Points { parent: u32, child: u32 },
}

struct CompositeGlyphs {
    glyphs: Vec<CompositeGlyph>,
    have_instructions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(pub i16, pub i16);

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct BoundingBox {
    pub x_min: i16,
    pub x_max: i16,
    pub y_min: i16,
    pub y_max: i16,
}

impl<'a> GlyfTable<'a> {
    pub fn new(scope: ReadScope<'a>, loca: &LocaTable<'a>) -> Result<GlyfTable<'a>, ParseError> {
        if loca.offsets.len() < 2 {
            return Err(ParseError::BadIndex);
        }
        Ok(GlyfTable {
            scope,
            offsets: loca.offsets.clone(),
        })
    }

    /// The number of glyphs, equal to `maxp.num_glyphs`.
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len() - 1
    }

    /// The undecoded data of `glyph_index`, `None` when its `loca` range is empty.
    pub fn glyph_data(&self, glyph_index: u16) -> Result<Option<ReadScope<'a>>, ParseError> {
        let index = usize::from(glyph_index);
        let (start, end) = match (self.offsets.get(index), self.offsets.get(index + 1)) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(ParseError::BadIndex),
        };
        let length = match end.checked_sub(start) {
            Some(0) => return Ok(None),
            Some(length) => usize::safe_from(length),
            None => return Err(ParseError::BadOffset),
        };
        let offset = usize::safe_from(start);
        match self.scope.offset_length(offset, length) {
            Ok(glyph_scope) => Ok(Some(glyph_scope)),
            Err(ParseError::BadEof) => {
                // loca claims more data than glyf holds. The outline may still be complete so
                // keep everything up to the end of the table.
                warn!("glyph {} extends past end of glyf", glyph_index);
                Ok(Some(self.scope.offset(offset)))
            }
            Err(err) => Err(err),
        }
    }

    /// Decode the outline of `glyph_index`.
    ///
    /// Returns `Ok(None)` for glyphs without outline data.
    pub fn glyph(&self, glyph_index: u16) -> Result<Option<Glyph<'a>>, ParseError> {
        match self.glyph_data(glyph_index)? {
            Some(scope) => scope.read::<Glyph<'_>>().map(Some),
            None => Ok(None),
        }
    }
}

impl ReadBinary for Glyph<'_> {
    type HostType<'a> = Glyph<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;

        if let Ok(contours) = u16::try_from(number_of_contours) {
            let glyph = ctxt.read_dep::<SimpleGlyph<'_>>(contours)?;

            Ok(Glyph {
                number_of_contours,
                bounding_box,
                data: GlyphData::Simple(glyph),
            })
        } else {
            let glyphs = ctxt.read::<CompositeGlyphs>()?;

            let instruction_length = if glyphs.have_instructions {
                usize::from(ctxt.read::<U16Be>()?)
            } else {
                0
            };
            let instructions = ctxt.read_slice(instruction_length)?;

            Ok(Glyph {
                number_of_contours,
                bounding_box,
                data: GlyphData::Composite {
                    glyphs: glyphs.glyphs,
                    instructions,
                },
            })
        }
    }
}

impl Glyph<'_> {
    pub fn is_composite(&self) -> bool {
        matches!(self.data, GlyphData::Composite { .. })
    }

    /// The number of points that variation data addresses, excluding phantom points.
    ///
    /// For a composite glyph each component counts as one point.
    pub fn number_of_points(&self) -> usize {
        match &self.data {
            GlyphData::Simple(simple) => simple.coordinates.len(),
            GlyphData::Composite { glyphs, .. } => glyphs.len(),
        }
    }
}

impl SimpleGlyph<'_> {
    pub fn contours(&self) -> impl Iterator<Item = &[Point]> {
        self.end_pts_of_contours.iter().scan(0, move |i, &end| {
            let start = *i;
            let end = usize::from(end);
            *i = end + 1;
            self.coordinates.get(start..=end)
        })
    }

    pub fn contour_flags(&self) -> impl Iterator<Item = &[SimpleGlyphFlag]> {
        self.end_pts_of_contours.iter().scan(0, move |i, &end| {
            let start = *i;
            let end = usize::from(end);
            *i = end + 1;
            self.flags.get(start..=end)
        })
    }
}

impl ReadBinaryDep for SimpleGlyph<'_> {
    type Args<'a> = u16;
    type HostType<'a> = SimpleGlyph<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        number_of_contours: u16,
    ) -> Result<Self::HostType<'a>, ParseError> {
        let end_pts_of_contours = ctxt
            .read_array::<U16Be>(usize::from(number_of_contours))?
            .to_vec();
        let instruction_length = ctxt.read::<U16Be>()?;
        let instructions = ctxt.read_slice(usize::from(instruction_length))?;
        // end_pts_of_contours holds the index of each end point so the count is the last + 1
        let number_of_coordinates = end_pts_of_contours
            .last()
            .map_or(0, |&last| usize::from(last) + 1);

        let mut flags = Vec::with_capacity(number_of_coordinates);
        while flags.len() < number_of_coordinates {
            let flag = ctxt.read::<SimpleGlyphFlag>()?;
            if flag.is_repeated() {
                // + 1 to include the current entry
                let count = usize::from(ctxt.read::<U8>()?) + 1;
                flags.extend(iter::repeat(flag).take(count))
            } else {
                flags.push(flag);
            }
        }
        // A repeat run may overshoot the point count in malformed fonts
        flags.truncate(number_of_coordinates);

        let mut coordinates = flags
            .iter()
            .map(|flag| {
                if flag.x_is_short() {
                    ctxt.read::<U8>()
                        .map(|val| i16::from(val) * flag.x_short_sign())
                } else if flag.x_is_same_or_positive() {
                    Ok(0)
                } else {
                    ctxt.read::<I16Be>()
                }
                .map(|x| Point(x, 0))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Coordinates are deltas against the previous point, starting from (0, 0)
        let mut prev_point = Point(0, 0);
        for (flag, point) in flags.iter().zip(coordinates.iter_mut()) {
            let y = if flag.y_is_short() {
                ctxt.read::<U8>()
                    .map(|val| i16::from(val) * flag.y_short_sign())?
            } else if flag.y_is_same_or_positive() {
                0
            } else {
                ctxt.read::<I16Be>()?
            };

            prev_point = Point(
                prev_point.0.wrapping_add(point.0),
                prev_point.1.wrapping_add(y),
            );
            *point = prev_point
        }

        Ok(SimpleGlyph {
            end_pts_of_contours,
            instructions,
            flags,
            coordinates,
        })
    }
}

impl ReadFrom for SimpleGlyphFlag {
    type ReadType = U8;

    fn read_from(flag: u8) -> Self {
        SimpleGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinary for CompositeGlyphs {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let mut have_instructions = false;
        let mut glyphs = Vec::new();
        loop {
            let flags = ctxt.read::<CompositeGlyphFlag>()?;
            let data = ctxt.read_dep::<CompositeGlyph>(flags)?;

            if flags.contains(CompositeGlyphFlag::WE_HAVE_INSTRUCTIONS) {
                have_instructions = true;
            }

            glyphs.push(data);

            if !flags.contains(CompositeGlyphFlag::MORE_COMPONENTS) {
                break;
            }
        }

        Ok(CompositeGlyphs {
            glyphs,
            have_instructions,
        })
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self.contains(Self::ON_CURVE_POINT)
    }

    pub fn x_is_short(self) -> bool {
        self.contains(Self::X_SHORT_VECTOR)
    }

    pub fn y_is_short(self) -> bool {
        self.contains(Self::Y_SHORT_VECTOR)
    }

    pub fn is_repeated(self) -> bool {
        self.contains(Self::REPEAT_FLAG)
    }

    pub fn x_short_sign(self) -> i16 {
        if self.x_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn y_short_sign(self) -> i16 {
        if self.y_is_same_or_positive() {
            1
        } else {
            -1
        }
    }

    pub fn x_is_same_or_positive(self) -> bool {
        self.contains(Self::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR)
    }

    pub fn y_is_same_or_positive(self) -> bool {
        self.contains(Self::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR)
    }
}

impl ReadFrom for CompositeGlyphFlag {
    type ReadType = U16Be;

    fn read_from(flag: u16) -> Self {
        CompositeGlyphFlag::from_bits_truncate(flag)
    }
}

impl ReadBinaryDep for CompositeGlyphArgument {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep(ctxt: &mut ReadCtxt<'_>, flags: CompositeGlyphFlag) -> Result<Self, ParseError> {
        let arg = match (
            flags.contains(CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS),
            flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES),
        ) {
            (true, true) => CompositeGlyphArgument::I16(ctxt.read_i16be()?),
            (true, false) => CompositeGlyphArgument::U16(ctxt.read_u16be()?),
            (false, true) => CompositeGlyphArgument::I8(ctxt.read_i8()?),
            (false, false) => CompositeGlyphArgument::U8(ctxt.read_u8()?),
        };

        Ok(arg)
    }
}

impl From<CompositeGlyphArgument> for i32 {
    fn from(arg: CompositeGlyphArgument) -> i32 {
        match arg {
            CompositeGlyphArgument::U8(value) => i32::from(value),
            CompositeGlyphArgument::I8(value) => i32::from(value),
            CompositeGlyphArgument::U16(value) => i32::from(value),
            CompositeGlyphArgument::I16(value) => i32::from(value),
        }
    }
}

impl ReadBinaryDep for CompositeGlyph {
    type Args<'a> = CompositeGlyphFlag;
    type HostType<'a> = Self;

    fn read_dep(ctxt: &mut ReadCtxt<'_>, flags: CompositeGlyphFlag) -> Result<Self, ParseError> {
        let glyph_index = ctxt.read_u16be()?;
        let argument1 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;
        let argument2 = ctxt.read_dep::<CompositeGlyphArgument>(flags)?;

        let scale = if flags.contains(CompositeGlyphFlag::WE_HAVE_A_SCALE) {
            Some(CompositeGlyphScale::Scale(ctxt.read::<F2Dot14>()?))
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_AN_X_AND_Y_SCALE) {
            Some(CompositeGlyphScale::XY {
                x_scale: ctxt.read::<F2Dot14>()?,
                y_scale: ctxt.read::<F2Dot14>()?,
            })
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_A_TWO_BY_TWO) {
            Some(CompositeGlyphScale::Matrix([
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
            ]))
        } else {
            None
        };

        Ok(CompositeGlyph {
            flags,
            glyph_index,
            argument1,
            argument2,
            scale,
        })
    }
}

impl CompositeGlyph {
    pub fn anchor(&self) -> ComponentAnchor {
        let arg1 = i32::from(self.argument1);
        let arg2 = i32::from(self.argument2);
        if self.flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES) {
            ComponentAnchor::Offset { x: arg1, y: arg2 }
        } else {
            // Point numbers are read unsigned so these are never negative
            ComponentAnchor::Points {
                parent: arg1.unsigned_abs(),
                child: arg2.unsigned_abs(),
            }
        }
    }

    /// The 2x2 linear part of the component transform as `[[xx, xy], [yx, yy]]`.
    pub fn matrix(&self) -> [[f32; 2]; 2] {
        match self.scale {
            None => [[1.0, 0.0], [0.0, 1.0]],
            Some(CompositeGlyphScale::Scale(scale)) => {
                let scale = f32::from(scale);
                [[scale, 0.0], [0.0, scale]]
            }
            Some(CompositeGlyphScale::XY { x_scale, y_scale }) => {
                [[f32::from(x_scale), 0.0], [0.0, f32::from(y_scale)]]
            }
            Some(CompositeGlyphScale::Matrix([[a, b], [c, d]])) => {
                [[f32::from(a), f32::from(b)], [f32::from(c), f32::from(d)]]
            }
        }
    }

    /// The full affine transform `[xx, xy, yx, yy, dx, dy]`.
    ///
    /// Point anchored components have no translation of their own.
    pub fn transform(&self) -> [f32; 6] {
        let [[xx, xy], [yx, yy]] = self.matrix();
        let (dx, dy) = match self.anchor() {
            ComponentAnchor::Offset { x, y } => (x as f32, y as f32),
            ComponentAnchor::Points { .. } => (0.0, 0.0),
        };
        [xx, xy, yx, yy, dx, dy]
    }
}

impl ReadFrom for BoundingBox {
    type ReadType = ((I16Be, I16Be), (I16Be, I16Be));

    fn read_from(((x_min, y_min), (x_max, y_max)): ((i16, i16), (i16, i16))) -> Self {
        BoundingBox {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

impl BoundingBox {
    /// Calculate the bounds of `points`, or `None` if there are none.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (&Point(x, y), rest) = points.split_first()?;
        let initial = BoundingBox {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        };

        Some(rest.iter().fold(initial, |bbox, &Point(x, y)| BoundingBox {
            x_min: bbox.x_min.min(x),
            x_max: bbox.x_max.max(x),
            y_min: bbox.y_min.min(y),
            y_max: bbox.y_max.max(y),
        }))
    }
}
