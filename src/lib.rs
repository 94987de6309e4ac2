#![warn(rust_2018_idioms)]

//! # Font decoding
//!
//! `fontparse` decodes OpenType, TrueType, CFF, TrueType collection and WOFF font files into
//! structured, queryable tables: glyph outlines, metrics, names, colour and bitmap glyph data,
//! layout feature flags, and the variable font tables `fvar`, `avar`, `gvar`, `STAT` and `HVAR`.
//!
//! Start with [font::FontFile::parse] and call [font::FontFile::fonts] to get one
//! [font::FontObject] per collection member and named instance. Tables are decoded on first
//! access and memoized per table offset, so members of a collection that share a table decode
//! it once. [parser::Parser] wraps a font with memoized derived views.

#[macro_use]
pub mod tag;

/// Reading and writing of binary data.
pub mod binary;
pub mod cff;
pub mod error;
pub mod font;
pub mod font_data;
pub mod font_tables;
pub mod get_name;
pub mod instance;
pub mod parser;
pub mod size;
pub mod tables;
/// Shared test code.
#[cfg(test)]
pub mod tests;
/// Reading of the WOFF format.
pub mod woff;

/// Lossless conversion of a value that always fits in the target type on supported platforms.
pub trait SafeFrom<T>: Sized {
    fn safe_from(value: T) -> Self;
}

impl SafeFrom<u32> for usize {
    #[inline]
    fn safe_from(value: u32) -> Self {
        // usize is at least 32 bits on every target this crate builds for
        value as usize
    }
}

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("fontparse requires a 32 or 64-bit target");
