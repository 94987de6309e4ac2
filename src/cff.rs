//! CFF font handling.
//!
//! Refer to [Technical Note #5176](http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/font/pdfs/5176.CFF.pdf)
//! for more information.

use std::convert::TryFrom;
use std::fmt;
use std::iter;
use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder};
use itertools::Itertools;
use tinyvec::TinyVec;

use crate::binary::read::{
    CheckIndex, ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope,
    ReadUnchecked,
};
use crate::binary::{U16Be, U8};
use crate::error::ParseError;

pub mod charstring;
mod strings;

use strings::{EXPERT_CHARSET, EXPERT_SUBSET_CHARSET, STANDARD_STRINGS};

// CFF Spec: An operator may be preceded by up to a maximum of 48 operands.
const MAX_OPERANDS: usize = 48;
const END_OF_FLOAT_FLAG: u8 = 0xf;

const OPERAND_ZERO: [Operand; 1] = [Operand::Integer(0)];
const DEFAULT_UNDERLINE_POSITION: [Operand; 1] = [Operand::Integer(-100)];
const DEFAULT_UNDERLINE_THICKNESS: [Operand; 1] = [Operand::Integer(50)];
const DEFAULT_CHARSTRING_TYPE: [Operand; 1] = [Operand::Integer(2)];
const DEFAULT_BBOX: [Operand; 4] = [
    Operand::Integer(0),
    Operand::Integer(0),
    Operand::Integer(0),
    Operand::Integer(0),
];
const DEFAULT_CID_COUNT: [Operand; 1] = [Operand::Integer(8720)];
const DEFAULT_BLUE_SHIFT: [Operand; 1] = [Operand::Integer(7)];
const DEFAULT_BLUE_FUZZ: [Operand; 1] = [Operand::Integer(1)];
const DEFAULT_FONT_MATRIX: [f64; 6] = [0.001, 0.0, 0.0, 0.001, 0.0, 0.0];

const ISO_ADOBE_LAST_SID: u16 = 228;

/// A string id in the font
pub type SID = u16;

/// Top level representation of a CFF font file, typically read from a CFF OpenType table.
///
/// Refer to Technical Note #5176
#[derive(Clone)]
pub struct CFF<'a> {
    pub header: Header,
    pub name_index: Index<'a>,
    pub string_index: Index<'a>,
    pub global_subr_index: Index<'a>,
    pub fonts: Vec<Font<'a>>,
}

/// CFF Font Header described in Section 6 of Technical Note #5176
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub major: u8,
    pub minor: u8,
    pub hdr_size: u8,
    pub off_size: u8,
}

/// A CFF INDEX described in Section 5 of Technical Note #5176
#[derive(Clone)]
pub struct Index<'a> {
    pub count: usize,
    off_size: u8,
    offset_array: &'a [u8],
    data_array: &'a [u8],
}

/// A single font within a CFF file
#[derive(Clone)]
pub struct Font<'a> {
    pub top_dict: TopDict,
    pub char_strings_index: Index<'a>,
    pub charset: Charset<'a>,
    pub data: CFFVariant<'a>,
}

/// Errors raised while interpreting Type 2 charstrings.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum CFFError {
    ParseError(ParseError),
    InvalidOperator,
    UnsupportedOperator,
    MissingEndChar,
    NestingLimitReached,
    ArgumentsStackLimitReached,
    InvalidArgumentsStackLength,
    InvalidSubroutineIndex,
    NoLocalSubroutines,
}

#[derive(Clone)]
pub enum CFFVariant<'a> {
    CID(CIDData<'a>),
    Type1(Type1Data<'a>),
}

/// The Font DICTs of a CID-keyed font and the FDSelect that assigns glyphs to them.
#[derive(Clone)]
pub struct CIDData<'a> {
    pub font_dicts: Vec<FontDict>,
    pub private_dicts: Vec<PrivateDict>,
    /// An optional local subroutine index per Private DICT.
    pub local_subr_indices: Vec<Option<Index<'a>>>,
    pub fd_select: FDSelect<'a>,
}

#[derive(Clone)]
pub struct Type1Data<'a> {
    pub private_dict: PrivateDict,
    pub local_subr_index: Option<Index<'a>>,
}

#[derive(Clone)]
pub enum Charset<'a> {
    ISOAdobe,
    Expert,
    ExpertSubset,
    Custom(CustomCharset<'a>),
}

#[derive(Clone)]
pub enum CustomCharset<'a> {
    Format0 {
        glyphs: ReadArray<'a, U16Be>,
    },
    Format1 {
        ranges: ReadArray<'a, Range<SID, u8>>,
    },
    Format2 {
        ranges: ReadArray<'a, Range<SID, u16>>,
    },
}

/// A Range from `first` to `first + n_left`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range<F, N> {
    pub first: F,
    pub n_left: N,
}

/// A CFF DICT described in Section 4 of Technical Note #5176
#[derive(Debug, PartialEq, Clone)]
pub struct Dict<T>
where
    T: DictDefault,
{
    dict: Vec<(Operator, Vec<Operand>)>,
    default: PhantomData<T>,
}

/// The default values of a DICT
pub trait DictDefault {
    /// Returns the default operand(s) if any for the supplied `op`.
    fn default(op: Operator) -> Option<&'static [Operand]>;
}

#[derive(Debug, PartialEq, Clone)]
pub struct TopDictDefault;

#[derive(Debug, PartialEq, Clone)]
pub struct FontDictDefault;

#[derive(Debug, PartialEq, Clone)]
pub struct PrivateDictDefault;

pub type TopDict = Dict<TopDictDefault>;

pub type FontDict = Dict<FontDictDefault>;

pub type PrivateDict = Dict<PrivateDictDefault>;

/// Font DICT select as described in Section 19 of Technical Note #5176
#[derive(Clone, Debug)]
pub enum FDSelect<'a> {
    Format0 {
        glyph_font_dict_indices: ReadArray<'a, U8>,
    },
    // Formats 1 and 2 are not defined
    Format3 {
        ranges: ReadArray<'a, Range<u16, u8>>,
        sentinel: u16,
    },
}

/// CFF DICT operator
#[derive(Debug, PartialEq)]
enum Op {
    Operator(Operator),
    Operand(Operand),
}

/// CFF operand to an operator
#[derive(Debug, PartialEq, Clone)]
pub enum Operand {
    Integer(i32),
    Real(Real),
}

/// A real number, kept as its packed BCD nibbles.
///
/// Real operands in fonts are rarely longer than 7 bytes, so they are stored inline.
#[derive(Debug, PartialEq, Clone)]
pub struct Real(TinyVec<[u8; 7]>);

#[repr(u16)]
#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Operator {
    Version = 0,
    Notice = 1,
    FullName = 2,
    FamilyName = 3,
    Weight = 4,
    FontBBox = 5,
    BlueValues = 6,
    OtherBlues = 7,
    FamilyBlues = 8,
    FamilyOtherBlues = 9,
    StdHW = 10,
    StdVW = 11,
    UniqueID = 13,
    XUID = 14,
    Charset = 15,
    Encoding = 16,
    CharStrings = 17,
    Private = 18,
    Subrs = 19,
    DefaultWidthX = 20,
    NominalWidthX = 21,
    Copyright = op2(0),
    IsFixedPitch = op2(1),
    ItalicAngle = op2(2),
    UnderlinePosition = op2(3),
    UnderlineThickness = op2(4),
    PaintType = op2(5),
    CharstringType = op2(6),
    FontMatrix = op2(7),
    StrokeWidth = op2(8),
    BlueScale = op2(9),
    BlueShift = op2(10),
    BlueFuzz = op2(11),
    StemSnapH = op2(12),
    StemSnapV = op2(13),
    ForceBold = op2(14),
    LanguageGroup = op2(17),
    ExpansionFactor = op2(18),
    InitialRandomSeed = op2(19),
    SyntheticBase = op2(20),
    PostScript = op2(21),
    BaseFontName = op2(22),
    BaseFontBlend = op2(23),
    ROS = op2(30),
    CIDFontVersion = op2(31),
    CIDFontRevision = op2(32),
    CIDFontType = op2(33),
    CIDCount = op2(34),
    UIDBase = op2(35),
    FDArray = op2(36),
    FDSelect = op2(37),
    FontName = op2(38),
}

const fn op2(value: u8) -> u16 {
    (12 << 8) | (value as u16)
}

impl ReadBinary for CFF<'_> {
    type HostType<'a> = CFF<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        // Offsets in the DICTs are from the start of the CFF data
        let scope = ctxt.scope();

        let header = ctxt.read::<Header>()?;
        let name_index = ctxt.read::<Index<'_>>()?;
        let top_dict_index = ctxt.read::<Index<'_>>()?;
        let string_index = ctxt.read::<Index<'_>>()?;
        let global_subr_index = ctxt.read::<Index<'_>>()?;

        let mut fonts = Vec::with_capacity(name_index.count);
        for font_index in 0..name_index.count {
            let top_dict = top_dict_index.read::<TopDict>(font_index)?;

            let offset = top_dict
                .get_i32(Operator::CharStrings)
                .unwrap_or(Err(ParseError::MissingValue))?;
            let char_strings_index = scope.offset(usize::try_from(offset)?).read::<Index<'_>>()?;

            // CIDFonts begin their Top DICT with ROS
            let data = match top_dict.first_operator() {
                Some(Operator::ROS) => {
                    let cid_data = read_cid_data(&scope, &top_dict, char_strings_index.count)?;
                    CFFVariant::CID(cid_data)
                }
                Some(Operator::SyntheticBase) => {
                    return Err(ParseError::NotImplemented);
                }
                Some(_) => {
                    let (private_dict, private_dict_offset) = top_dict.read_private_dict(&scope)?;
                    let local_subr_index =
                        read_local_subr_index(&scope, &private_dict, private_dict_offset)?;
                    CFFVariant::Type1(Type1Data {
                        private_dict,
                        local_subr_index,
                    })
                }
                None => return Err(ParseError::MissingValue),
            };

            let charset = read_charset(&scope, &top_dict, char_strings_index.count)?;

            fonts.push(Font {
                top_dict,
                char_strings_index,
                charset,
                data,
            });
        }

        Ok(CFF {
            header,
            name_index,
            string_index,
            global_subr_index,
            fonts,
        })
    }
}

impl<'a> CFF<'a> {
    /// Read a string with the given SID, from the standard strings or the String INDEX.
    pub fn read_string(&self, sid: SID) -> Result<&'a str, ParseError> {
        let sid = usize::from(sid);
        match STANDARD_STRINGS.get(sid) {
            Some(string) => Ok(string),
            None => {
                let bytes = self
                    .string_index
                    .read_object(sid - STANDARD_STRINGS.len())
                    .ok_or(ParseError::BadIndex)?;
                std::str::from_utf8(bytes).map_err(|_utf8_err| ParseError::BadValue)
            }
        }
    }

    /// The PostScript name of the font at `index` from the Name INDEX.
    pub fn font_name(&self, index: usize) -> Option<&'a str> {
        self.name_index
            .read_object(index)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// The string value of a SID-valued operator of `dict`, such as `FullName` or `Notice`.
    pub fn dict_string<T: DictDefault>(
        &self,
        dict: &Dict<T>,
        operator: Operator,
    ) -> Result<Option<&'a str>, ParseError> {
        match dict.get_i32(operator).transpose()? {
            Some(sid) => self.read_string(SID::try_from(sid)?).map(Some),
            None => Ok(None),
        }
    }

    /// The name of `glyph_id` in the font at `font_index` through its charset.
    ///
    /// CID-keyed fonts have no glyph names and return `None`.
    pub fn glyph_name(&self, font_index: usize, glyph_id: u16) -> Option<&'a str> {
        let font = self.fonts.get(font_index)?;
        if font.is_cid_keyed() {
            return None;
        }
        let sid = font.charset.id_for_glyph(glyph_id)?;
        self.read_string(sid).ok()
    }
}

impl ReadBinary for Header {
    type HostType<'b> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        // Only the major version must be understood to read the font
        let major = ctxt.read_u8()?;
        ctxt.check_version(major == 1)?;
        let minor = ctxt.read_u8()?;
        let hdr_size = ctxt.read_u8()?;
        let off_size = ctxt.read_u8()?;

        if hdr_size < 4 {
            return Err(ParseError::BadValue);
        }

        if !(1..=4).contains(&off_size) {
            return Err(ParseError::BadValue);
        }

        let _unknown = ctxt.read_slice(usize::from(hdr_size - 4))?;

        Ok(Header {
            major,
            minor,
            hdr_size,
            off_size,
        })
    }
}

impl ReadBinary for Index<'_> {
    type HostType<'a> = Index<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let count = usize::from(ctxt.read_u16be()?);

        if count == 0 {
            return Ok(Index {
                count,
                off_size: 1,
                offset_array: &[],
                data_array: &[],
            });
        }

        let off_size = ctxt.read_u8()?;
        if !(1..=4).contains(&off_size) {
            return Err(ParseError::BadValue);
        }

        let offset_array_size = (count + 1) * usize::from(off_size);
        let offset_array = ctxt.read_slice(offset_array_size)?;

        // Offsets are 1-based from the byte before the data
        let last_offset = lookup_offset_index(off_size, offset_array, count);
        if last_offset < 1 {
            return Err(ParseError::BadValue);
        }
        let data_array = ctxt.read_slice(last_offset - 1)?;

        Ok(Index {
            count,
            off_size,
            offset_array,
            data_array,
        })
    }
}

impl<'a> Index<'a> {
    /// The bytes of object `index`, or `None` if out of range or the offsets are inconsistent.
    pub fn read_object(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.count {
            return None;
        }
        let start = lookup_offset_index(self.off_size, self.offset_array, index).checked_sub(1)?;
        let end = lookup_offset_index(self.off_size, self.offset_array, index + 1).checked_sub(1)?;
        self.data_array.get(start..end)
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(
        &self,
        index: usize,
    ) -> Result<T::HostType<'a>, ParseError> {
        let data = self.read_object(index).ok_or(ParseError::BadIndex)?;
        ReadScope::new(data).read_dep::<T>(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.count).map_while(move |i| self.read_object(i))
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the size of the data held by this INDEX.
    pub fn data_len(&self) -> usize {
        self.data_array.len()
    }
}

impl<T> ReadBinary for Dict<T>
where
    T: DictDefault,
{
    type HostType<'b> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let mut dict = Vec::new();
        let mut operands = Vec::new();

        while ctxt.bytes_available() {
            match Op::read(ctxt)? {
                Op::Operator(operator) => {
                    dict.push((operator, std::mem::take(&mut operands)));
                }
                Op::Operand(operand) => {
                    operands.push(operand);
                    if operands.len() > MAX_OPERANDS {
                        return Err(ParseError::LimitExceeded);
                    }
                }
            }
        }

        Ok(Dict {
            dict,
            default: PhantomData,
        })
    }
}

impl ReadBinary for Op {
    type HostType<'b> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        let b0 = ctxt.read_u8()?;

        match b0 {
            0..=11 | 13..=21 => Ok(Op::Operator(Operator::try_from(u16::from(b0))?)),
            12 => Ok(Op::Operator(Operator::try_from(op2(ctxt.read_u8()?))?)),
            28 => Ok(integer(i32::from(ctxt.read_i16be()?))),
            29 => Ok(integer(ctxt.read_i32be()?)),
            30 => {
                let nibbles = ctxt.read_until_nibble(END_OF_FLOAT_FLAG)?;
                Ok(Op::Operand(Operand::Real(Real(TinyVec::from(nibbles)))))
            }
            32..=246 => Ok(integer(i32::from(b0) - 139)),
            247..=250 => {
                let b1 = ctxt.read_u8()?;
                Ok(integer((i32::from(b0) - 247) * 256 + i32::from(b1) + 108))
            }
            251..=254 => {
                let b1 = ctxt.read_u8()?;
                Ok(integer(-(i32::from(b0) - 251) * 256 - i32::from(b1) - 108))
            }
            22..=27 | 31 | 255 => Err(ParseError::UnsupportedFormat(u32::from(b0))),
        }
    }
}

fn integer(value: i32) -> Op {
    Op::Operand(Operand::Integer(value))
}

const FLOAT_BUF_LEN: usize = 64;

impl TryFrom<&Real> for f64 {
    type Error = ParseError;

    /// Parse the nibbles of this `Real` into an `f64`.
    fn try_from(real: &Real) -> Result<Self, Self::Error> {
        let mut buf = String::with_capacity(real.0.len() * 2);

        'nibbles: for byte in real.0.iter() {
            for nibble in [byte >> 4, byte & 0xF] {
                if nibble == END_OF_FLOAT_FLAG {
                    break 'nibbles;
                }
                push_float_nibble(nibble, &mut buf)?;
            }
        }

        buf.parse().map_err(|_| ParseError::BadValue)
    }
}

// Adobe Technical Note #5176, Table 5 Nibble Definitions
fn push_float_nibble(nibble: u8, buf: &mut String) -> Result<(), ParseError> {
    if buf.len() >= FLOAT_BUF_LEN {
        return Err(ParseError::LimitExceeded);
    }

    match nibble {
        0..=9 => buf.push(char::from(b'0' + nibble)),
        10 => buf.push('.'),
        11 => buf.push('E'),
        12 => buf.push_str("E-"),
        14 => buf.push('-'),
        _ => return Err(ParseError::BadValue),
    }

    Ok(())
}

impl ReadFrom for Range<SID, u8> {
    type ReadType = (U16Be, U8);
    fn read_from((first, n_left): (SID, u8)) -> Self {
        Range { first, n_left }
    }
}

impl ReadFrom for Range<SID, u16> {
    type ReadType = (U16Be, U16Be);
    fn read_from((first, n_left): (SID, u16)) -> Self {
        Range { first, n_left }
    }
}

impl<F, N> Range<F, N>
where
    N: Copy,
    usize: From<N>,
{
    pub fn len(&self) -> usize {
        usize::from(self.n_left) + 1
    }
}

impl<'a> Charset<'a> {
    /// Returns the SID (Type 1 font) or CID (CID keyed font) of the name of the supplied glyph
    pub fn id_for_glyph(&self, glyph_id: u16) -> Option<u16> {
        match self {
            // In ISOAdobe glyph ID maps to SID
            Charset::ISOAdobe => (glyph_id <= ISO_ADOBE_LAST_SID).then_some(glyph_id),
            Charset::Expert => EXPERT_CHARSET.get(usize::from(glyph_id)).copied(),
            Charset::ExpertSubset => EXPERT_SUBSET_CHARSET.get(usize::from(glyph_id)).copied(),
            Charset::Custom(custom) => custom.id_for_glyph(glyph_id),
        }
    }

    /// Returns the glyph id of the supplied string id.
    pub fn sid_to_gid(&self, sid: SID) -> Option<u16> {
        if sid == 0 {
            return Some(0);
        }

        let position = |charset: &[u16]| {
            charset
                .iter()
                .position(|&id| id == sid)
                .and_then(|index| u16::try_from(index).ok())
        };
        match self {
            Charset::ISOAdobe => (sid <= ISO_ADOBE_LAST_SID).then_some(sid),
            Charset::Expert => position(&EXPERT_CHARSET[..]),
            Charset::ExpertSubset => position(&EXPERT_SUBSET_CHARSET[..]),
            Charset::Custom(custom) => custom.sid_to_gid(sid),
        }
    }
}

impl ReadBinaryDep for CustomCharset<'_> {
    type Args<'a> = usize;
    type HostType<'a> = CustomCharset<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        n_glyphs: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        // .notdef is implied so the charset covers one less than the number of glyphs
        let n_glyphs = n_glyphs.checked_sub(1).ok_or(ParseError::BadValue)?;
        match ctxt.read::<U8>()? {
            0 => {
                let glyphs = ctxt.read_array::<U16Be>(n_glyphs)?;
                Ok(CustomCharset::Format0 { glyphs })
            }
            1 => {
                let ranges = read_range_array(ctxt, n_glyphs)?;
                Ok(CustomCharset::Format1 { ranges })
            }
            2 => {
                let ranges = read_range_array(ctxt, n_glyphs)?;
                Ok(CustomCharset::Format2 { ranges })
            }
            format => Err(ParseError::UnsupportedFormat(u32::from(format))),
        }
    }
}

impl<'a> CustomCharset<'a> {
    /// The SIDs (or CIDs) of every glyph, starting with .notdef.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u16> + 'a> {
        let notdef = iter::once(0);
        match self {
            CustomCharset::Format0 { glyphs } => Box::new(notdef.chain(glyphs.iter())),
            CustomCharset::Format1 { ranges } => Box::new(
                notdef.chain(
                    ranges
                        .iter()
                        .flat_map(|range| range.first..=range.first + u16::from(range.n_left)),
                ),
            ),
            CustomCharset::Format2 { ranges } => Box::new(
                notdef.chain(
                    ranges
                        .iter()
                        .flat_map(|range| range.first..=range.first.saturating_add(range.n_left)),
                ),
            ),
        }
    }

    /// Returns the SID (Type 1 font) or CID (CID keyed font) of the name of the supplied glyph
    pub fn id_for_glyph(&self, glyph_id: u16) -> Option<u16> {
        // GID 0 is always .notdef and is not stored
        if glyph_id == 0 {
            return Some(0);
        }

        match self {
            CustomCharset::Format0 { glyphs } => {
                let index = usize::from(glyph_id - 1);
                glyphs
                    .check_index(index)
                    .ok()
                    .and_then(|_| glyphs.get_item(index))
            }
            CustomCharset::Format1 { ranges } => id_for_glyph_in_ranges(ranges, glyph_id),
            CustomCharset::Format2 { ranges } => id_for_glyph_in_ranges(ranges, glyph_id),
        }
    }

    pub fn sid_to_gid(&self, sid: SID) -> Option<u16> {
        self.iter()
            .position(|id| id == sid)
            .and_then(|index| u16::try_from(index).ok())
    }
}

fn id_for_glyph_in_ranges<N>(ranges: &ReadArray<'_, Range<SID, N>>, glyph_id: u16) -> Option<u16>
where
    N: Copy,
    usize: From<N>,
    Range<SID, N>: ReadUnchecked<HostType = Range<SID, N>>,
{
    // `usize: From<N>` shadows the u16 conversion here
    let glyph_id = <usize as From<u16>>::from(glyph_id);

    ranges
        .iter()
        .scan(0usize, |glyphs_covered, range| {
            *glyphs_covered += range.len();
            Some((*glyphs_covered, range))
        })
        .find(|(glyphs_covered, _range)| glyph_id <= *glyphs_covered)
        .and_then(|(glyphs_covered, range)| {
            let offset = glyph_id - (glyphs_covered - range.len()) - 1;
            u16::try_from(<usize as From<SID>>::from(range.first) + offset).ok()
        })
}

/// Read ranges until they cover `n_glyphs` glyphs.
fn read_range_array<'a, N>(
    ctxt: &mut ReadCtxt<'a>,
    n_glyphs: usize,
) -> Result<ReadArray<'a, Range<SID, N>>, ParseError>
where
    N: Copy,
    usize: From<N>,
    Range<SID, N>: ReadUnchecked<HostType = Range<SID, N>>,
{
    let mut peek = ctxt.scope().ctxt();
    let mut range_count = 0;
    let mut glyphs_covered = 0;
    while glyphs_covered < n_glyphs {
        let range = peek.read::<Range<SID, N>>()?;
        range_count += 1;
        glyphs_covered += range.len();
    }

    ctxt.read_array::<Range<SID, N>>(range_count)
}

impl ReadBinaryDep for FDSelect<'_> {
    type Args<'a> = usize;
    type HostType<'a> = FDSelect<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        n_glyphs: usize,
    ) -> Result<Self::HostType<'a>, ParseError> {
        match ctxt.read::<U8>()? {
            0 => {
                let glyph_font_dict_indices = ctxt.read_array::<U8>(n_glyphs)?;
                Ok(FDSelect::Format0 {
                    glyph_font_dict_indices,
                })
            }
            3 => {
                let nranges = usize::from(ctxt.read::<U16Be>()?);
                let ranges = ctxt.read_array(nranges)?;
                let sentinel = ctxt.read::<U16Be>()?;
                Ok(FDSelect::Format3 { ranges, sentinel })
            }
            format => Err(ParseError::UnsupportedFormat(u32::from(format))),
        }
    }
}

impl FDSelect<'_> {
    /// Returns the index of the Font DICT for the supplied `glyph_id`
    pub fn font_dict_index(&self, glyph_id: u16) -> Option<u8> {
        match self {
            FDSelect::Format0 {
                glyph_font_dict_indices,
            } => glyph_font_dict_indices.get_item(usize::from(glyph_id)),
            FDSelect::Format3 { ranges, sentinel } => ranges
                .iter()
                .map(|Range { first, n_left }| (first, Some(n_left)))
                .chain(iter::once((*sentinel, None)))
                .tuple_windows()
                .find(|((first, _), (last, _))| glyph_id >= *first && glyph_id < *last)
                .and_then(|((_, fd_index), _)| fd_index),
        }
    }
}

impl DictDefault for TopDictDefault {
    fn default(op: Operator) -> Option<&'static [Operand]> {
        match op {
            Operator::IsFixedPitch => Some(&OPERAND_ZERO),
            Operator::ItalicAngle => Some(&OPERAND_ZERO),
            Operator::UnderlinePosition => Some(&DEFAULT_UNDERLINE_POSITION),
            Operator::UnderlineThickness => Some(&DEFAULT_UNDERLINE_THICKNESS),
            Operator::PaintType => Some(&OPERAND_ZERO),
            Operator::CharstringType => Some(&DEFAULT_CHARSTRING_TYPE),
            Operator::FontBBox => Some(&DEFAULT_BBOX),
            Operator::StrokeWidth => Some(&OPERAND_ZERO),
            Operator::Charset => Some(&OPERAND_ZERO),
            Operator::Encoding => Some(&OPERAND_ZERO),
            Operator::CIDFontVersion => Some(&OPERAND_ZERO),
            Operator::CIDFontRevision => Some(&OPERAND_ZERO),
            Operator::CIDFontType => Some(&OPERAND_ZERO),
            Operator::CIDCount => Some(&DEFAULT_CID_COUNT),
            _ => None,
        }
    }
}

impl DictDefault for FontDictDefault {
    fn default(_op: Operator) -> Option<&'static [Operand]> {
        None
    }
}

impl DictDefault for PrivateDictDefault {
    fn default(op: Operator) -> Option<&'static [Operand]> {
        match op {
            Operator::BlueShift => Some(&DEFAULT_BLUE_SHIFT),
            Operator::BlueFuzz => Some(&DEFAULT_BLUE_FUZZ),
            Operator::ForceBold => Some(&OPERAND_ZERO),
            Operator::LanguageGroup => Some(&OPERAND_ZERO),
            Operator::InitialRandomSeed => Some(&OPERAND_ZERO),
            Operator::StrokeWidth => Some(&OPERAND_ZERO),
            Operator::DefaultWidthX => Some(&OPERAND_ZERO),
            Operator::NominalWidthX => Some(&OPERAND_ZERO),
            _ => None,
        }
    }
}

impl<T> Dict<T>
where
    T: DictDefault,
{
    pub fn get_with_default(&self, key: Operator) -> Option<&[Operand]> {
        self.get(key).or_else(|| T::default(key))
    }

    pub fn get(&self, key: Operator) -> Option<&[Operand]> {
        self.dict
            .iter()
            .find_map(|(op, args)| (*op == key).then_some(args.as_slice()))
    }

    /// Returns the i32 value of this operator if the operands hold a single Integer.
    pub fn get_i32(&self, key: Operator) -> Option<Result<i32, ParseError>> {
        self.get_with_default(key).map(|operands| match operands {
            [Operand::Integer(number)] => Ok(*number),
            _ => Err(ParseError::BadValue),
        })
    }

    /// Returns the numeric value of a single operand operator, integer or real.
    pub fn get_f64(&self, key: Operator) -> Option<Result<f64, ParseError>> {
        self.get_with_default(key).map(|operands| match operands {
            [operand] => operand.to_f64(),
            _ => Err(ParseError::BadValue),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Operator, Vec<Operand>)> {
        self.dict.iter()
    }

    /// Returns the first operator of this DICT or `None` if the DICT is empty.
    pub fn first_operator(&self) -> Option<Operator> {
        self.iter().next().map(|(operator, _)| *operator)
    }

    /// Read the Private DICT this DICT points at, returning it and its offset within `scope`.
    ///
    /// A Private DICT is required, but may have a length of 0.
    pub fn read_private_dict(
        &self,
        scope: &ReadScope<'_>,
    ) -> Result<(PrivateDict, usize), ParseError> {
        let (private_dict_offset, private_dict_length) =
            match self.get_with_default(Operator::Private) {
                Some([Operand::Integer(length), Operand::Integer(offset)]) => {
                    (usize::try_from(*offset)?, usize::try_from(*length)?)
                }
                Some(_) => return Err(ParseError::BadValue),
                None => return Err(ParseError::MissingValue),
            };
        scope
            .offset_length(private_dict_offset, private_dict_length)?
            .read::<PrivateDict>()
            .map(|dict| (dict, private_dict_offset))
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }
}

impl TopDict {
    /// The FontMatrix, defaulting to a 1000 unit em.
    pub fn font_matrix(&self) -> Result<[f64; 6], ParseError> {
        match self.get(Operator::FontMatrix) {
            Some(operands) if operands.len() == 6 => {
                let mut matrix = [0.0; 6];
                for (value, operand) in matrix.iter_mut().zip(operands) {
                    *value = operand.to_f64()?;
                }
                Ok(matrix)
            }
            Some(_) => Err(ParseError::BadValue),
            None => Ok(DEFAULT_FONT_MATRIX),
        }
    }
}

impl Operand {
    pub fn to_f64(&self) -> Result<f64, ParseError> {
        match self {
            Operand::Integer(value) => Ok(f64::from(*value)),
            Operand::Real(real) => f64::try_from(real),
        }
    }
}

impl TryFrom<u16> for Operator {
    type Error = ParseError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let operator = if (value & 0xFF00) == (12 << 8) {
            match value as u8 {
                0 => Operator::Copyright,
                1 => Operator::IsFixedPitch,
                2 => Operator::ItalicAngle,
                3 => Operator::UnderlinePosition,
                4 => Operator::UnderlineThickness,
                5 => Operator::PaintType,
                6 => Operator::CharstringType,
                7 => Operator::FontMatrix,
                8 => Operator::StrokeWidth,
                9 => Operator::BlueScale,
                10 => Operator::BlueShift,
                11 => Operator::BlueFuzz,
                12 => Operator::StemSnapH,
                13 => Operator::StemSnapV,
                14 => Operator::ForceBold,
                17 => Operator::LanguageGroup,
                18 => Operator::ExpansionFactor,
                19 => Operator::InitialRandomSeed,
                20 => Operator::SyntheticBase,
                21 => Operator::PostScript,
                22 => Operator::BaseFontName,
                23 => Operator::BaseFontBlend,
                30 => Operator::ROS,
                31 => Operator::CIDFontVersion,
                32 => Operator::CIDFontRevision,
                33 => Operator::CIDFontType,
                34 => Operator::CIDCount,
                35 => Operator::UIDBase,
                36 => Operator::FDArray,
                37 => Operator::FDSelect,
                38 => Operator::FontName,
                _ => return Err(ParseError::UnsupportedFormat(u32::from(value))),
            }
        } else {
            match value {
                0 => Operator::Version,
                1 => Operator::Notice,
                2 => Operator::FullName,
                3 => Operator::FamilyName,
                4 => Operator::Weight,
                5 => Operator::FontBBox,
                6 => Operator::BlueValues,
                7 => Operator::OtherBlues,
                8 => Operator::FamilyBlues,
                9 => Operator::FamilyOtherBlues,
                10 => Operator::StdHW,
                11 => Operator::StdVW,
                13 => Operator::UniqueID,
                14 => Operator::XUID,
                15 => Operator::Charset,
                16 => Operator::Encoding,
                17 => Operator::CharStrings,
                18 => Operator::Private,
                19 => Operator::Subrs,
                20 => Operator::DefaultWidthX,
                21 => Operator::NominalWidthX,
                _ => return Err(ParseError::UnsupportedFormat(u32::from(value))),
            }
        };
        Ok(operator)
    }
}

impl<'a> Font<'a> {
    pub fn is_cid_keyed(&self) -> bool {
        match self.data {
            CFFVariant::CID(_) => true,
            CFFVariant::Type1(_) => false,
        }
    }

    pub fn num_glyphs(&self) -> usize {
        self.char_strings_index.count
    }

    /// The Type 2 charstring of `glyph_id`.
    pub fn char_string(&self, glyph_id: u16) -> Option<&'a [u8]> {
        self.char_strings_index.read_object(usize::from(glyph_id))
    }

    /// The Private DICT in effect for `glyph_id`. CID-keyed fonts select it through FDSelect.
    pub fn private_dict(&self, glyph_id: u16) -> Option<&PrivateDict> {
        match &self.data {
            CFFVariant::Type1(type1) => Some(&type1.private_dict),
            CFFVariant::CID(cid) => {
                let fd_index = cid.fd_select.font_dict_index(glyph_id)?;
                cid.private_dicts.get(usize::from(fd_index))
            }
        }
    }

    /// The local subroutines available to `glyph_id`, if any.
    pub fn local_subr_index(&self, glyph_id: u16) -> Option<&Index<'a>> {
        match &self.data {
            CFFVariant::Type1(type1) => type1.local_subr_index.as_ref(),
            CFFVariant::CID(cid) => {
                let fd_index = cid.fd_select.font_dict_index(glyph_id)?;
                cid.local_subr_indices
                    .get(usize::from(fd_index))
                    .and_then(Option::as_ref)
            }
        }
    }
}

fn lookup_offset_index(off_size: u8, offset_array: &[u8], index: usize) -> usize {
    let start = index * usize::from(off_size);
    let buf = offset_array.get(start..).unwrap_or(&[]);
    if buf.len() < usize::from(off_size) {
        return 0;
    }
    match off_size {
        1 => usize::from(buf[0]),
        2 => usize::from(BigEndian::read_u16(buf)),
        3 => BigEndian::read_u24(buf) as usize,
        _ => BigEndian::read_u32(buf) as usize,
    }
}

fn read_cid_data<'a>(
    scope: &ReadScope<'a>,
    top_dict: &TopDict,
    n_glyphs: usize,
) -> Result<CIDData<'a>, ParseError> {
    let offset = top_dict
        .get_i32(Operator::FDArray)
        .ok_or(ParseError::MissingValue)??;
    let font_dict_index = scope.offset(usize::try_from(offset)?).read::<Index<'a>>()?;

    let offset = top_dict
        .get_i32(Operator::FDSelect)
        .ok_or(ParseError::MissingValue)??;
    let fd_select = scope
        .offset(usize::try_from(offset)?)
        .read_dep::<FDSelect<'a>>(n_glyphs)?;

    let mut font_dicts = Vec::with_capacity(font_dict_index.count);
    let mut private_dicts = Vec::with_capacity(font_dict_index.count);
    let mut local_subr_indices = Vec::with_capacity(font_dict_index.count);
    for index in 0..font_dict_index.count {
        let font_dict = font_dict_index.read::<FontDict>(index)?;
        let (private_dict, private_dict_offset) = font_dict.read_private_dict(scope)?;
        let local_subr_index = read_local_subr_index(scope, &private_dict, private_dict_offset)?;

        font_dicts.push(font_dict);
        private_dicts.push(private_dict);
        local_subr_indices.push(local_subr_index);
    }

    Ok(CIDData {
        font_dicts,
        private_dicts,
        local_subr_indices,
        fd_select,
    })
}

fn read_charset<'a>(
    scope: &ReadScope<'a>,
    top_dict: &TopDict,
    char_strings_count: usize,
) -> Result<Charset<'a>, ParseError> {
    let offset = top_dict
        .get_i32(Operator::Charset)
        .ok_or(ParseError::MissingValue)??;
    let charset = match offset {
        0 => Charset::ISOAdobe,
        1 => Charset::Expert,
        2 => Charset::ExpertSubset,
        _ => Charset::Custom(
            scope
                .offset(usize::try_from(offset)?)
                .read_dep::<CustomCharset<'_>>(char_strings_count)?,
        ),
    };

    Ok(charset)
}

fn read_local_subr_index<'a>(
    scope: &ReadScope<'a>,
    private_dict: &PrivateDict,
    private_dict_offset: usize,
) -> Result<Option<Index<'a>>, ParseError> {
    // The Subrs offset is relative to the start of the Private DICT
    private_dict
        .get_i32(Operator::Subrs)
        .transpose()?
        .map(|offset| {
            let offset = usize::try_from(offset)?;
            scope
                .offset(private_dict_offset + offset)
                .read::<Index<'_>>()
        })
        .transpose()
}

impl From<ParseError> for CFFError {
    fn from(error: ParseError) -> CFFError {
        CFFError::ParseError(error)
    }
}

impl From<crate::binary::read::ReadEof> for CFFError {
    fn from(error: crate::binary::read::ReadEof) -> CFFError {
        CFFError::ParseError(ParseError::from(error))
    }
}

impl fmt::Display for CFFError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CFFError::ParseError(parse_error) => {
                write!(f, "parse error: ")?;
                parse_error.fmt(f)
            }
            CFFError::InvalidOperator => write!(f, "an invalid operator occurred"),
            CFFError::UnsupportedOperator => write!(f, "an unsupported operator occurred"),
            CFFError::MissingEndChar => write!(f, "the 'endchar' operator is missing"),
            CFFError::NestingLimitReached => write!(f, "subroutines nesting limit reached"),
            CFFError::ArgumentsStackLimitReached => write!(f, "arguments stack limit reached"),
            CFFError::InvalidArgumentsStackLength => {
                write!(f, "an invalid amount of items are in an arguments stack")
            }
            CFFError::InvalidSubroutineIndex => write!(f, "an invalid subroutine index"),
            CFFError::NoLocalSubroutines => write!(f, "no local subroutines"),
        }
    }
}

impl std::error::Error for CFFError {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) use crate::tests::{cff_index as index, cff_int5 as int5, sample_cff};

    #[test]
    fn read_type1_font() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        assert_eq!(cff.header.major, 1);
        assert_eq!(cff.font_name(0), Some("Test"));
        assert_eq!(cff.fonts.len(), 1);

        let font = &cff.fonts[0];
        assert!(!font.is_cid_keyed());
        assert_eq!(font.num_glyphs(), 3);
        assert_eq!(font.char_string(0), Some(&[14u8][..]));
        assert_eq!(
            font.top_dict.get_i32(Operator::CharstringType).unwrap(),
            Ok(2)
        );
        assert_eq!(
            cff.dict_string(&font.top_dict, Operator::FullName).unwrap(),
            Some("Test Regular")
        );
        assert_eq!(font.top_dict.font_matrix().unwrap(), DEFAULT_FONT_MATRIX);
        assert_eq!(
            font.private_dict(1)
                .and_then(|dict| dict.get_i32(Operator::NominalWidthX)),
            Some(Ok(100))
        );
    }

    #[test]
    fn glyph_names_through_charset() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        assert_eq!(cff.glyph_name(0, 0), Some(".notdef"));
        assert_eq!(cff.glyph_name(0, 1), Some("A"));
        assert_eq!(cff.glyph_name(0, 2), Some("B"));
        assert_eq!(cff.glyph_name(0, 3), None);
        assert_eq!(cff.fonts[0].charset.sid_to_gid(35), Some(2));
    }

    #[test]
    fn string_index_strings() {
        let data = sample_cff();
        let cff = ReadScope::new(&data).read::<CFF<'_>>().unwrap();
        assert_eq!(cff.read_string(0), Ok(".notdef"));
        assert_eq!(cff.read_string(390), Ok("Semibold"));
        assert_eq!(cff.read_string(391), Ok("Test Regular"));
        assert_eq!(cff.read_string(392), Err(ParseError::BadIndex));
    }

    #[test]
    fn iter_index() {
        let data = index(&[&[4][..], &[5, 6][..]]);
        let index = ReadScope::new(&data).read::<Index<'_>>().unwrap();
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![&[4][..], &[5, 6][..]]);
        assert_eq!(index.data_len(), 3);
        assert!(index.read_object(2).is_none());
    }

    #[test]
    fn empty_index() {
        let index = ReadScope::new(&[0, 0]).read::<Index<'_>>().unwrap();
        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn read_operators() {
        let mut ctxt = ReadScope::new(&[0, 12, 1]).ctxt();
        assert_eq!(Op::read(&mut ctxt).unwrap(), Op::Operator(Operator::Version));
        assert_eq!(
            Op::read(&mut ctxt).unwrap(),
            Op::Operator(Operator::IsFixedPitch)
        );
        assert!(Op::read(&mut ctxt).is_err());
    }

    #[test]
    fn unknown_operator_is_unsupported() {
        let mut ctxt = ReadScope::new(&[12, 99]).ctxt();
        assert_eq!(
            Op::read(&mut ctxt),
            Err(ParseError::UnsupportedFormat(op2(99).into()))
        );
        let mut ctxt = ReadScope::new(&[22]).ctxt();
        assert_eq!(Op::read(&mut ctxt), Err(ParseError::UnsupportedFormat(22)));
    }

    #[test]
    fn read_integer_operand_sizes() {
        //                 -10000            10000             100   -100  0
        let data = [
            0x1c, 0xd8, 0xf0, 0x1c, 0x27, 0x10, 0xef, 0x27, 0x8b, 0x1d, 0xff, 0xfe, 0x79, 0x60,
            0xf8, 0x00, 0xfc, 0x00,
        ];
        let mut ctxt = ReadScope::new(&data).ctxt();
        let mut values = Vec::new();
        while ctxt.bytes_available() {
            match Op::read(&mut ctxt).unwrap() {
                Op::Operand(Operand::Integer(value)) => values.push(value),
                op => panic!("unexpected {:?}", op),
            }
        }
        assert_eq!(values, vec![-10000, 10000, 100, -100, 0, -100000, 364, -364]);
    }

    #[test]
    fn read_real_operands() {
        let cases: [(&[u8], f64); 4] = [
            (&[0x1e, 0xe2, 0xa2, 0x5f], -2.25),
            (&[0x1e, 0x0a, 0x14, 0x05, 0x41, 0xc3, 0xff], 0.140541e-3),
            (&[0x1e, 0x1f], 1.0),
            (&[0x1e, 0x2b, 0x3f], 2e3),
        ];
        for (bytes, expected) in cases {
            let mut ctxt = ReadScope::new(bytes).ctxt();
            match Op::read(&mut ctxt).unwrap() {
                Op::Operand(operand) => {
                    let value = operand.to_f64().unwrap();
                    assert!((value - expected).abs() < 1e-9, "{} != {}", value, expected);
                }
                op => panic!("unexpected {:?}", op),
            }
        }
    }

    #[test]
    fn dict_operand_limit() {
        let data = vec![139; MAX_OPERANDS + 1];
        assert_eq!(
            ReadScope::new(&data).read::<TopDict>(),
            Err(ParseError::LimitExceeded)
        );
    }

    #[test]
    fn charset_formats_1_and_2() {
        // Format 1: SIDs 100..=102, then 200
        let data = [1, 0, 100, 2, 0, 200, 0];
        let charset = ReadScope::new(&data)
            .read_dep::<CustomCharset<'_>>(5)
            .unwrap();
        assert_eq!(charset.iter().collect::<Vec<_>>(), vec![0, 100, 101, 102, 200]);
        assert_eq!(charset.id_for_glyph(3), Some(102));
        assert_eq!(charset.id_for_glyph(4), Some(200));
        assert_eq!(charset.id_for_glyph(5), None);
        assert_eq!(charset.sid_to_gid(200), Some(4));

        let data = [2, 0, 10, 1, 42];
        let charset = ReadScope::new(&data)
            .read_dep::<CustomCharset<'_>>(300)
            .unwrap();
        assert_eq!(charset.id_for_glyph(299), Some(10 + 298));
    }

    #[test]
    fn predefined_charsets() {
        assert_eq!(Charset::ISOAdobe.id_for_glyph(228), Some(228));
        assert_eq!(Charset::ISOAdobe.id_for_glyph(229), None);
        assert_eq!(Charset::Expert.id_for_glyph(2), Some(229));
        assert_eq!(Charset::ExpertSubset.id_for_glyph(86), Some(346));
        assert_eq!(Charset::Expert.sid_to_gid(229), Some(2));
    }

    #[test]
    fn fd_select_formats() {
        let data = [0, 0, 1, 1];
        let fd_select = ReadScope::new(&data).read_dep::<FDSelect<'_>>(3).unwrap();
        assert_eq!(fd_select.font_dict_index(1), Some(1));
        assert_eq!(fd_select.font_dict_index(3), None);

        // Glyphs 0-9 use FD 0, 10-19 use FD 2
        let data = [3, 0, 2, 0, 0, 0, 0, 10, 2, 0, 20];
        let fd_select = ReadScope::new(&data).read_dep::<FDSelect<'_>>(20).unwrap();
        assert_eq!(fd_select.font_dict_index(9), Some(0));
        assert_eq!(fd_select.font_dict_index(10), Some(2));
        assert_eq!(fd_select.font_dict_index(20), None);

        let data = [2, 0];
        assert_eq!(
            ReadScope::new(&data).read_dep::<FDSelect<'_>>(1).err(),
            Some(ParseError::UnsupportedFormat(2))
        );
    }

    #[test]
    fn bad_header_version() {
        let data = [2, 0, 4, 1];
        assert_eq!(
            ReadScope::new(&data).read::<Header>(),
            Err(ParseError::BadVersion)
        );
    }
}
