//! OpenType tags: table, axis, feature and format identifiers.

use crate::error::ParseError;
use std::fmt;

/// Generate a 4-byte tag from a byte string
///
/// Example:
///
/// ```
/// use fontparse::tag;
///
/// assert_eq!(tag!(b"glyf"), 0x676C7966);
/// ```
#[macro_export]
macro_rules! tag {
    ($w:expr) => {
        $crate::tag::tag(*$w)
    };
}

/// Wrapper that displays a tag as its four characters.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

/// Build a tag from four bytes.
pub const fn tag(chars: [u8; 4]) -> u32 {
    u32::from_be_bytes(chars)
}

/// Parse a tag from a string of up to four ASCII characters, padding with spaces.
pub fn from_string(s: &str) -> Result<u32, ParseError> {
    if s.len() > 4 || s.chars().any(|c| !c.is_ascii() || c.is_ascii_control()) {
        return Err(ParseError::BadValue);
    }

    let mut bytes = [b' '; 4];
    bytes[..s.len()].copy_from_slice(s.as_bytes());
    Ok(tag(bytes))
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
            bytes.iter().map(|&b| char::from(b)).collect::<String>().fmt(f)
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

pub const AVAR: u32 = tag!(b"avar");
pub const CBDT: u32 = tag!(b"CBDT");
pub const CBLC: u32 = tag!(b"CBLC");
pub const CFF: u32 = tag!(b"CFF ");
pub const CMAP: u32 = tag!(b"cmap");
pub const COLR: u32 = tag!(b"COLR");
pub const CPAL: u32 = tag!(b"CPAL");
pub const DUPE: u32 = tag!(b"dupe");
pub const FVAR: u32 = tag!(b"fvar");
pub const GLYF: u32 = tag!(b"glyf");
pub const GSUB: u32 = tag!(b"GSUB");
pub const GVAR: u32 = tag!(b"gvar");
pub const HEAD: u32 = tag!(b"head");
pub const HHEA: u32 = tag!(b"hhea");
pub const HMTX: u32 = tag!(b"hmtx");
pub const HVAR: u32 = tag!(b"HVAR");
pub const ITAL: u32 = tag!(b"ital");
pub const KERN: u32 = tag!(b"kern");
pub const LIGA: u32 = tag!(b"liga");
pub const LOCA: u32 = tag!(b"loca");
pub const MAXP: u32 = tag!(b"maxp");
pub const NAME: u32 = tag!(b"name");
pub const OPSZ: u32 = tag!(b"opsz");
pub const OS_2: u32 = tag!(b"OS/2");
pub const OTTO: u32 = tag!(b"OTTO");
pub const PNG: u32 = tag!(b"png ");
pub const POST: u32 = tag!(b"post");
pub const SBIX: u32 = tag!(b"sbix");
pub const SLNT: u32 = tag!(b"slnt");
pub const STAT: u32 = tag!(b"STAT");
pub const SVG: u32 = tag!(b"SVG ");
pub const TRUE: u32 = tag!(b"true");
pub const TTCF: u32 = tag!(b"ttcf");
pub const WDTH: u32 = tag!(b"wdth");
pub const WGHT: u32 = tag!(b"wght");
pub const WOF2: u32 = tag!(b"wOF2");
pub const WOFF: u32 = tag!(b"wOFF");
