//! Parsing of the `post` table.
//!
//! <https://learn.microsoft.com/en-us/typography/opentype/spec/post>

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt};
use crate::binary::{U16Be, I8};
use crate::error::ParseError;
use crate::tables::Fixed;

/// `post` table
#[derive(Debug)]
pub struct PostTable<'a> {
    pub header: Header,
    pub names: GlyphNames<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: u32,
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type_42: u32,
    pub max_mem_type_42: u32,
    pub min_mem_type_1: u32,
    pub max_mem_type_1: u32,
}

/// Glyph naming data, which depends on the table version.
#[derive(Debug)]
pub enum GlyphNames<'a> {
    /// Version 1.0: glyphs use the standard Macintosh names in order.
    Standard,
    /// Version 2.0: an index per glyph into the standard names, or into `names` for indices of
    /// 258 and above.
    Indexed {
        glyph_name_index: ReadArray<'a, U16Be>,
        names: Vec<&'a [u8]>,
    },
    /// Version 2.5: a signed offset per glyph into the standard names.
    Offsets { offsets: ReadArray<'a, I8> },
    /// Version 3.0: no names.
    None,
}

impl ReadBinary for Header {
    type HostType<'a> = Self;

    fn read(ctxt: &mut ReadCtxt<'_>) -> Result<Self, ParseError> {
        Ok(Header {
            version: ctxt.read_u32be()?,
            italic_angle: ctxt.read::<Fixed>()?,
            underline_position: ctxt.read_i16be()?,
            underline_thickness: ctxt.read_i16be()?,
            is_fixed_pitch: ctxt.read_u32be()?,
            min_mem_type_42: ctxt.read_u32be()?,
            max_mem_type_42: ctxt.read_u32be()?,
            min_mem_type_1: ctxt.read_u32be()?,
            max_mem_type_1: ctxt.read_u32be()?,
        })
    }
}

impl ReadBinary for PostTable<'_> {
    type HostType<'a> = PostTable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let header = ctxt.read::<Header>()?;
        let names = match header.version {
            0x00010000 => GlyphNames::Standard,
            0x00020000 => {
                let num_glyphs = usize::from(ctxt.read_u16be()?);
                let glyph_name_index = ctxt.read_array::<U16Be>(num_glyphs)?;
                let mut names = Vec::new();
                // Pascal strings run to the end of the table
                while ctxt.bytes_available() {
                    let length = ctxt.read_u8()?;
                    names.push(ctxt.read_slice(usize::from(length))?);
                }
                GlyphNames::Indexed {
                    glyph_name_index,
                    names,
                }
            }
            0x00025000 => {
                let num_glyphs = usize::from(ctxt.read_u16be()?);
                GlyphNames::Offsets {
                    offsets: ctxt.read_array::<I8>(num_glyphs)?,
                }
            }
            0x00030000 => GlyphNames::None,
            _ => return Err(ParseError::BadVersion),
        };

        Ok(PostTable { header, names })
    }
}

impl<'a> PostTable<'a> {
    /// The PostScript name of `glyph_index`, if the table has one.
    pub fn glyph_name(&self, glyph_index: u16) -> Result<Option<&'a str>, ParseError> {
        let glyph_index = usize::from(glyph_index);
        match &self.names {
            GlyphNames::Standard => Ok(STANDARD_NAMES.get(glyph_index).copied()),
            GlyphNames::Indexed {
                glyph_name_index,
                names,
            } => {
                let Some(name_index) = glyph_name_index.get_item(glyph_index) else {
                    return Ok(None);
                };
                let name_index = usize::from(name_index);
                match name_index.checked_sub(STANDARD_NAMES.len()) {
                    None => Ok(STANDARD_NAMES.get(name_index).copied()),
                    Some(index) => {
                        let bytes: &'a [u8] =
                            names.get(index).copied().ok_or(ParseError::BadIndex)?;
                        std::str::from_utf8(bytes)
                            .map(Some)
                            .map_err(|_| ParseError::BadValue)
                    }
                }
            }
            GlyphNames::Offsets { offsets } => {
                let Some(offset) = offsets.get_item(glyph_index) else {
                    return Ok(None);
                };
                let index = glyph_index
                    .checked_add_signed(isize::from(offset))
                    .ok_or(ParseError::BadIndex)?;
                STANDARD_NAMES
                    .get(index)
                    .copied()
                    .map(Some)
                    .ok_or(ParseError::BadIndex)
            }
            GlyphNames::None => Ok(None),
        }
    }

    pub fn is_fixed_pitch(&self) -> bool {
        self.header.is_fixed_pitch != 0
    }
}

/// The 258 standard Macintosh glyph names.
static STANDARD_NAMES: [&str; 258] = [
    ".notdef", ".null", "nonmarkingreturn", "space", "exclam", "quotedbl", "numbersign", "dollar",
    "percent", "ampersand", "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma",
    "hyphen", "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at", "A", "B",
    "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U",
    "V", "W", "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum",
    "underscore", "grave", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
    "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "braceleft", "bar", "braceright",
    "asciitilde", "Adieresis", "Aring", "Ccedilla", "Eacute", "Ntilde", "Odieresis", "Udieresis",
    "aacute", "agrave", "acircumflex", "adieresis", "atilde", "aring", "ccedilla", "eacute",
    "egrave", "ecircumflex", "edieresis", "iacute", "igrave", "icircumflex", "idieresis", "ntilde",
    "oacute", "ograve", "ocircumflex", "odieresis", "otilde", "uacute", "ugrave", "ucircumflex",
    "udieresis", "dagger", "degree", "cent", "sterling", "section", "bullet", "paragraph",
    "germandbls", "registered", "copyright", "trademark", "acute", "dieresis", "notequal", "AE",
    "Oslash", "infinity", "plusminus", "lessequal", "greaterequal", "yen", "mu", "partialdiff",
    "summation", "product", "pi", "integral", "ordfeminine", "ordmasculine", "Omega", "ae",
    "oslash", "questiondown", "exclamdown", "logicalnot", "radical", "florin", "approxequal",
    "Delta", "guillemotleft", "guillemotright", "ellipsis", "nonbreakingspace", "Agrave", "Atilde",
    "Otilde", "OE", "oe", "endash", "emdash", "quotedblleft", "quotedblright", "quoteleft",
    "quoteright", "divide", "lozenge", "ydieresis", "Ydieresis", "fraction", "currency",
    "guilsinglleft", "guilsinglright", "fi", "fl", "daggerdbl", "periodcentered", "quotesinglbase",
    "quotedblbase", "perthousand", "Acircumflex", "Ecircumflex", "Aacute", "Edieresis", "Egrave",
    "Iacute", "Icircumflex", "Idieresis", "Igrave", "Oacute", "Ocircumflex", "apple", "Ograve",
    "Uacute", "Ucircumflex", "Ugrave", "dotlessi", "circumflex", "tilde", "macron", "breve",
    "dotaccent", "ring", "cedilla", "hungarumlaut", "ogonek", "caron", "Lslash", "lslash",
    "Scaron", "scaron", "Zcaron", "zcaron", "brokenbar", "Eth", "eth", "Yacute", "yacute", "Thorn",
    "thorn", "minus", "multiply", "onesuperior", "twosuperior", "threesuperior", "onehalf",
    "onequarter", "threequarters", "franc", "Gbreve", "gbreve", "Idotaccent", "Scedilla",
    "scedilla", "Cacute", "cacute", "Ccaron", "ccaron", "dcroat",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::writer::{self, TtfType, TtfType::*};

    fn header(version: u32) -> Vec<TtfType<'static>> {
        vec![
            UInt32(version),
            Int32(-12 << 16),
            Int16(-100),
            Int16(50),
            UInt32(0),
            UInt32(0),
            UInt32(0),
            UInt32(0),
            UInt32(0),
        ]
    }

    #[test]
    fn version1_names() {
        let data = writer::convert(&header(0x00010000));
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(f32::from(post.header.italic_angle), -12.0);
        assert_eq!(post.glyph_name(3).unwrap(), Some("space"));
        assert_eq!(post.glyph_name(257).unwrap(), Some("dcroat"));
        assert_eq!(post.glyph_name(258).unwrap(), None);
    }

    #[test]
    fn version2_names() {
        let mut fields = header(0x00020000);
        fields.extend([
            UInt16(3),
            UInt16(0),
            UInt16(259),
            UInt16(258),
            UInt8(3),
            Raw(b"foo"),
            UInt8(5),
            Raw(b"a.alt"),
        ]);
        let data = writer::convert(&fields);
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(post.glyph_name(0).unwrap(), Some(".notdef"));
        assert_eq!(post.glyph_name(1).unwrap(), Some("a.alt"));
        assert_eq!(post.glyph_name(2).unwrap(), Some("foo"));
        assert_eq!(post.glyph_name(3).unwrap(), None);
    }

    #[test]
    fn version25_offsets() {
        let mut fields = header(0x00025000);
        fields.extend([UInt16(2), Int8(3), Int8(35)]);
        let data = writer::convert(&fields);
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(post.glyph_name(0).unwrap(), Some("space"));
        assert_eq!(post.glyph_name(1).unwrap(), Some("A"));
    }

    #[test]
    fn version3_has_no_names() {
        let data = writer::convert(&header(0x00030000));
        let post = ReadScope::new(&data).read::<PostTable<'_>>().unwrap();
        assert_eq!(post.glyph_name(0).unwrap(), None);
        let bad = writer::convert(&header(0x00040000));
        assert!(ReadScope::new(&bad).read::<PostTable<'_>>().is_err());
    }
}
