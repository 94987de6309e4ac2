//! Sizes of binary types and fixed-size font structures.

use std::mem;

pub const U8: usize = mem::size_of::<u8>();
pub const I8: usize = mem::size_of::<i8>();
pub const U16: usize = mem::size_of::<u16>();
pub const I16: usize = mem::size_of::<i16>();
pub const U24: usize = 3;
pub const U32: usize = mem::size_of::<u32>();
pub const I32: usize = mem::size_of::<i32>();

/// `sfnt` header: version, numTables, searchRange, entrySelector, rangeShift.
pub const SFNT_HEADER: usize = U32 + 4 * U16;
/// `sfnt` table record: tag, checksum, offset, length.
pub const TABLE_RECORD: usize = 4 * U32;
/// WOFF table directory entry: tag, offset, compLength, origLength, origChecksum.
pub const WOFF_TABLE_ENTRY: usize = 5 * U32;
/// The fixed portion of the `head` table.
pub const HEAD_TABLE: usize = 54;
