//! Error types

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;
use std::fmt;

/// Errors that originate when parsing binary data
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    LimitExceeded,
    MissingValue,
    MissingTable(u32),
    CompressionError,
    /// A format number, index format, or graphic type tag that is not supported.
    UnsupportedFormat(u32),
    NotImplemented,
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::LimitExceeded => write!(f, "limit exceeded"),
            ParseError::MissingValue => write!(f, "an expected data value was missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::CompressionError => write!(f, "compression error"),
            ParseError::UnsupportedFormat(format) if *format > 0xFFFF => {
                write!(f, "unsupported format '{}'", DisplayTag(*format))
            }
            ParseError::UnsupportedFormat(format) => write!(f, "unsupported format {}", format),
            ParseError::NotImplemented => write!(f, "feature not implemented"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that originate when writing binary data
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
        }
    }
}

impl std::error::Error for WriteError {}

/// A failure to decode one table of a font.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct TableError {
    /// Tag of the table being decoded.
    pub tag: u32,
    /// Offset of the table within the font buffer.
    pub offset: usize,
    /// The underlying error.
    pub error: ParseError,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' table at offset {}: {}",
            DisplayTag(self.tag),
            self.offset,
            self.error
        )
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors that prevent any font from being produced from a buffer.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FontError {
    /// The table directory or collection header is corrupt.
    Directory {
        /// Offset into the buffer where the structure starts.
        offset: usize,
        /// The structure that was being read.
        expected: &'static str,
        /// What was found instead.
        actual: String,
    },
    /// A table required for a usable font could not be decoded.
    Table(TableError),
    /// Any other parse failure, such as a WOFF table that fails to inflate.
    Parse(ParseError),
    /// Writing the synthesised `sfnt` for a WOFF file failed.
    Write(WriteError),
}

impl From<TableError> for FontError {
    fn from(error: TableError) -> Self {
        FontError::Table(error)
    }
}

impl From<ParseError> for FontError {
    fn from(error: ParseError) -> Self {
        FontError::Parse(error)
    }
}

impl From<WriteError> for FontError {
    fn from(error: WriteError) -> Self {
        FontError::Write(error)
    }
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::Directory {
                offset,
                expected,
                actual,
            } => write!(
                f,
                "corrupt font directory at offset {}: expected {}, found {}",
                offset, expected, actual
            ),
            FontError::Table(err) => write!(f, "required table: {}", err),
            FontError::Parse(err) => write!(f, "read error: {}", err),
            FontError::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for FontError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag;

    #[test]
    fn display_messages() {
        let err = TableError {
            tag: tag::GLYF,
            offset: 300,
            error: ParseError::BadEof,
        };
        assert_eq!(
            err.to_string(),
            "'glyf' table at offset 300: end of data reached unexpectedly"
        );
        assert_eq!(
            ParseError::UnsupportedFormat(tag!(b"jpg ")).to_string(),
            "unsupported format 'jpg '"
        );
        assert_eq!(
            ParseError::UnsupportedFormat(5).to_string(),
            "unsupported format 5"
        );
    }
}
