#![allow(missing_docs)]

//! Parse binary data
//!
//! Decoding is built around two types. A [ReadScope] is an immutable view of a range of bytes
//! that remembers its position relative to the buffer it was created from. A [ReadCtxt] is a
//! cursor into a scope. Types that can be decoded implement one of [ReadBinary],
//! [ReadBinaryDep] or [ReadFrom], and fixed-size records can be read lazily through a
//! [ReadArray].

use crate::binary::{I16Be, I32Be, U16Be, U24Be, U32Be, I8, U8};
use crate::error::ParseError;
use crate::size;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Copy, Clone)]
pub struct ReadEof {}

/// A buffer that may be borrowed from the caller or owned, such as a decompressed table.
pub struct ReadBuf<'a> {
    data: Cow<'a, [u8]>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReadScope<'a> {
    base: usize,
    data: &'a [u8],
}

#[derive(Clone)]
pub struct ReadCtxt<'a> {
    scope: ReadScope<'a>,
    offset: usize,
}

pub trait ReadBinary {
    type HostType<'a>: Sized;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError>;
}

pub trait ReadBinaryDep {
    type Args<'a>: Copy;
    type HostType<'a>: Sized;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        args: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError>;
}

pub trait ReadFixedSizeDep: ReadBinaryDep {
    /// The number of bytes consumed by `ReadBinaryDep::read_dep`.
    fn size(args: Self::Args<'_>) -> usize;
}

/// Read will always succeed if sufficient bytes are available.
pub trait ReadUnchecked {
    type HostType: Sized;

    /// The number of bytes consumed by `read_unchecked`.
    const SIZE: usize;

    /// Must read exactly `SIZE` bytes.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `SIZE` bytes are available in `ctxt`.
    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType;
}

/// Build a value from a fixed-size tuple of primitives.
pub trait ReadFrom {
    type ReadType: ReadUnchecked;

    fn read_from(value: <Self::ReadType as ReadUnchecked>::HostType) -> Self;
}

impl<T> ReadUnchecked for T
where
    T: ReadFrom,
{
    type HostType = T;

    const SIZE: usize = T::ReadType::SIZE;

    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType {
        T::read_from(T::ReadType::read_unchecked(ctxt))
    }
}

impl<T> ReadBinary for T
where
    T: ReadUnchecked,
{
    type HostType<'a> = T::HostType;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        ctxt.check_avail(T::SIZE)?;
        // SAFETY: `SIZE` bytes were just checked to be available.
        Ok(unsafe { T::read_unchecked(ctxt) })
    }
}

impl<T> ReadBinaryDep for T
where
    T: ReadBinary,
{
    type Args<'a> = ();
    type HostType<'a> = T::HostType<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (): Self::Args<'_>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        T::read(ctxt)
    }
}

impl<T> ReadFixedSizeDep for T
where
    T: ReadUnchecked,
{
    fn size((): ()) -> usize {
        T::SIZE
    }
}

pub trait CheckIndex {
    fn check_index(&self, index: usize) -> Result<(), ParseError>;
}

/// A lazily decoded array of fixed-size records.
pub struct ReadArray<'a, T: ReadFixedSizeDep> {
    scope: ReadScope<'a>,
    length: usize,
    stride: usize,
    args: T::Args<'a>,
}

pub struct ReadArrayIter<'a, T: ReadUnchecked> {
    scope: ReadScope<'a>,
    index: usize,
    length: usize,
    stride: usize,
    phantom: PhantomData<T>,
}

pub struct ReadArrayDepIter<'a, 'b, T: ReadFixedSizeDep> {
    array: &'b ReadArray<'a, T>,
    index: usize,
}

impl<'a> ReadScope<'a> {
    pub fn new(data: &'a [u8]) -> ReadScope<'a> {
        ReadScope { base: 0, data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The position of this scope relative to the start of the buffer it was created from.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn offset(&self, offset: usize) -> ReadScope<'a> {
        let base = self.base + offset;
        let data = self.data.get(offset..).unwrap_or(&[]);
        ReadScope { base, data }
    }

    pub fn offset_length(&self, offset: usize, length: usize) -> Result<ReadScope<'a>, ParseError> {
        if offset >= self.data.len() && length != 0 {
            return Err(ParseError::BadOffset);
        }
        let end = offset.checked_add(length).ok_or(ParseError::BadEof)?;
        match self.data.get(offset..end) {
            Some(data) => Ok(ReadScope {
                base: self.base + offset,
                data,
            }),
            None if length == 0 => Ok(ReadScope {
                base: self.base + offset,
                data: &[],
            }),
            None => Err(ParseError::BadEof),
        }
    }

    pub fn ctxt(&self) -> ReadCtxt<'a> {
        ReadCtxt::new(*self)
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&self) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read::<T>()
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read_dep::<T>(args)
    }
}

impl<'a> ReadCtxt<'a> {
    /// ReadCtxt is constructed by calling `ReadScope::ctxt`.
    fn new(scope: ReadScope<'a>) -> ReadCtxt<'a> {
        ReadCtxt { scope, offset: 0 }
    }

    /// Check a condition, returning `ParseError::BadValue` if `false`.
    pub fn check(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadValue),
        }
    }

    /// Check a condition, returning `ParseError::BadIndex` if `false`.
    pub fn check_index(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadIndex),
        }
    }

    /// Check a condition, returning `ParseError::BadVersion` if `false`.
    ///
    /// ```
    /// use fontparse::binary::read::ReadScope;
    /// use fontparse::error::ParseError;
    ///
    /// let scope = ReadScope::new(&[0, 2]);
    /// let mut ctxt = scope.ctxt();
    /// let major_version = ctxt.read_u16be().expect("unable to read version");
    ///
    /// assert!(ctxt.check_version(major_version == 2).is_ok());
    /// assert_eq!(ctxt.check_version(major_version == 1), Err(ParseError::BadVersion));
    /// ```
    pub fn check_version(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadVersion),
        }
    }

    /// A scope starting at the current position.
    pub fn scope(&self) -> ReadScope<'a> {
        self.scope.offset(self.offset)
    }

    /// The current position relative to the start of the scope this context was created from.
    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&mut self) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, ())
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &mut self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, args)
    }

    pub fn bytes_available(&self) -> bool {
        self.offset < self.scope.data.len()
    }

    fn check_avail(&self, length: usize) -> Result<(), ReadEof> {
        match self.offset.checked_add(length) {
            Some(end) if end <= self.scope.data.len() => Ok(()),
            _ => Err(ReadEof {}),
        }
    }

    /// Read `N` bytes without bounds checking.
    unsafe fn read_unchecked_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0; N];
        bytes.copy_from_slice(
            self.scope
                .data
                .get_unchecked(self.offset..self.offset + N),
        );
        self.offset += N;
        bytes
    }

    unsafe fn read_unchecked_u24be(&mut self) -> u32 {
        let [b0, b1, b2] = self.read_unchecked_bytes::<3>();
        u32::from_be_bytes([0, b0, b1, b2])
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ReadEof> {
        self.check_avail(N)?;
        // SAFETY: `N` bytes were just checked to be available.
        Ok(unsafe { self.read_unchecked_bytes::<N>() })
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadEof> {
        self.read_bytes::<1>().map(u8::from_be_bytes)
    }

    pub fn read_i8(&mut self) -> Result<i8, ReadEof> {
        self.read_bytes::<1>().map(i8::from_be_bytes)
    }

    pub fn read_u16be(&mut self) -> Result<u16, ReadEof> {
        self.read_bytes::<2>().map(u16::from_be_bytes)
    }

    pub fn read_i16be(&mut self) -> Result<i16, ReadEof> {
        self.read_bytes::<2>().map(i16::from_be_bytes)
    }

    pub fn read_u24be(&mut self) -> Result<u32, ReadEof> {
        self.read_bytes::<3>()
            .map(|[b0, b1, b2]| u32::from_be_bytes([0, b0, b1, b2]))
    }

    pub fn read_u32be(&mut self) -> Result<u32, ReadEof> {
        self.read_bytes::<4>().map(u32::from_be_bytes)
    }

    pub fn read_i32be(&mut self) -> Result<i32, ReadEof> {
        self.read_bytes::<4>().map(i32::from_be_bytes)
    }

    pub fn read_u64be(&mut self) -> Result<u64, ReadEof> {
        self.read_bytes::<8>().map(u64::from_be_bytes)
    }

    pub fn read_i64be(&mut self) -> Result<i64, ReadEof> {
        self.read_bytes::<8>().map(i64::from_be_bytes)
    }

    /// Read `length` bytes of 7-bit ASCII.
    ///
    /// Bytes outside the ASCII range are replaced with U+FFFD.
    pub fn read_ascii(&mut self, length: usize) -> Result<String, ReadEof> {
        let bytes = self.read_slice(length)?;
        Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { '\u{FFFD}' })
            .collect())
    }

    /// Read `length` bytes of UTF-16BE text.
    ///
    /// An odd trailing byte is ignored and unpaired surrogates are replaced with U+FFFD.
    pub fn read_utf16be(&mut self, length: usize) -> Result<String, ReadEof> {
        let bytes = self.read_slice(length)?;
        let units = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        Ok(char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }

    /// Read `length` bytes of UTF-8 text, replacing invalid sequences with U+FFFD.
    pub fn read_utf8(&mut self, length: usize) -> Result<String, ReadEof> {
        let bytes = self.read_slice(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn read_array<T: ReadUnchecked>(
        &mut self,
        length: usize,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        self.read_array_stride(length, T::SIZE)
    }

    pub fn read_array_stride<T: ReadUnchecked>(
        &mut self,
        length: usize,
        stride: usize,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        if T::SIZE > stride {
            return Err(ParseError::BadValue);
        }
        let byte_length = length.checked_mul(stride).ok_or(ParseError::BadEof)?;
        let scope = self.read_scope(byte_length)?;
        Ok(ReadArray {
            scope,
            length,
            stride,
            args: (),
        })
    }

    pub fn read_array_dep<T: ReadFixedSizeDep>(
        &mut self,
        length: usize,
        args: T::Args<'a>,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        let stride = T::size(args);
        let byte_length = length.checked_mul(stride).ok_or(ParseError::BadEof)?;
        let scope = self.read_scope(byte_length)?;
        Ok(ReadArray {
            scope,
            length,
            stride,
            args,
        })
    }

    /// Read up to and including the first byte containing the supplied nibble.
    pub fn read_until_nibble(&mut self, nibble: u8) -> Result<&'a [u8], ReadEof> {
        let remaining = self.scope.data.get(self.offset..).unwrap_or(&[]);
        let end = remaining
            .iter()
            .position(|&b| (b >> 4) == nibble || (b & 0xF) == nibble)
            .ok_or(ReadEof {})?;
        self.read_slice(end + 1)
    }

    pub fn read_scope(&mut self, length: usize) -> Result<ReadScope<'a>, ReadEof> {
        let scope = self
            .scope
            .offset_length(self.offset, length)
            .map_err(|_| ReadEof {})?;
        self.offset += length;
        Ok(scope)
    }

    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], ReadEof> {
        self.read_scope(length).map(|scope| scope.data)
    }
}

impl<'a> ReadBuf<'a> {
    pub fn scope(&'a self) -> ReadScope<'a> {
        ReadScope::new(&self.data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.data, Cow::Owned(_))
    }

    pub fn into_data(self) -> Cow<'a, [u8]> {
        self.data
    }
}

impl<'a> From<&'a [u8]> for ReadBuf<'a> {
    fn from(data: &'a [u8]) -> ReadBuf<'a> {
        ReadBuf {
            data: Cow::Borrowed(data),
        }
    }
}

impl From<Vec<u8>> for ReadBuf<'_> {
    fn from(data: Vec<u8>) -> Self {
        ReadBuf {
            data: Cow::Owned(data),
        }
    }
}

impl<'a, T: ReadFixedSizeDep> ReadArray<'a, T> {
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn read_item(&self, index: usize) -> Result<T::HostType<'a>, ParseError> {
        if index >= self.length {
            return Err(ParseError::BadIndex);
        }
        let size = T::size(self.args);
        let scope = self.scope.offset_length(index * self.stride, size)?;
        T::read_dep(&mut scope.ctxt(), self.args)
    }

    pub fn get_item(&self, index: usize) -> Option<<T as ReadUnchecked>::HostType>
    where
        T: ReadUnchecked,
    {
        if index >= self.length {
            return None;
        }
        let scope = self.scope.offset_length(index * self.stride, T::SIZE).ok()?;
        // SAFETY: `offset_length` guarantees `SIZE` bytes are available.
        Some(unsafe { T::read_unchecked(&mut scope.ctxt()) })
    }

    pub fn last(&self) -> Option<<T as ReadUnchecked>::HostType>
    where
        T: ReadUnchecked,
    {
        self.get_item(self.length.checked_sub(1)?)
    }

    pub fn to_vec(&self) -> Vec<<T as ReadUnchecked>::HostType>
    where
        T: ReadUnchecked,
    {
        self.iter().collect()
    }

    pub fn read_to_vec(&self) -> Result<Vec<T::HostType<'a>>, ParseError> {
        self.iter_res().collect()
    }

    pub fn iter(&self) -> ReadArrayIter<'a, T>
    where
        T: ReadUnchecked,
    {
        ReadArrayIter {
            scope: self.scope,
            index: 0,
            length: self.length,
            stride: self.stride,
            phantom: PhantomData,
        }
    }

    pub fn iter_res<'b>(&'b self) -> ReadArrayDepIter<'a, 'b, T> {
        ReadArrayDepIter {
            array: self,
            index: 0,
        }
    }

    /// Binary search over an array sorted by `f`, like `slice::binary_search_by`.
    pub fn binary_search_by<F>(&self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(<T as ReadUnchecked>::HostType) -> Ordering,
        T: ReadUnchecked,
    {
        let mut left = 0;
        let mut right = self.length;
        while left < right {
            let mid = left + (right - left) / 2;
            let Some(item) = self.get_item(mid) else {
                return Err(left);
            };
            match f(item) {
                Ordering::Less => left = mid + 1,
                Ordering::Greater => right = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(left)
    }
}

impl<T: ReadFixedSizeDep> Clone for ReadArray<'_, T> {
    fn clone(&self) -> Self {
        ReadArray {
            scope: self.scope,
            length: self.length,
            stride: self.stride,
            args: self.args,
        }
    }
}

impl<'a, T: ReadUnchecked> ReadArray<'a, T> {
    pub fn empty() -> ReadArray<'a, T> {
        ReadArray {
            scope: ReadScope::new(&[]),
            length: 0,
            stride: T::SIZE,
            args: (),
        }
    }
}

impl<T: ReadFixedSizeDep> CheckIndex for ReadArray<'_, T> {
    fn check_index(&self, index: usize) -> Result<(), ParseError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(ParseError::BadIndex)
        }
    }
}

impl<T> CheckIndex for Vec<T> {
    fn check_index(&self, index: usize) -> Result<(), ParseError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(ParseError::BadIndex)
        }
    }
}

impl<'a, T: ReadUnchecked> IntoIterator for &ReadArray<'a, T> {
    type Item = T::HostType;
    type IntoIter = ReadArrayIter<'a, T>;

    fn into_iter(self) -> ReadArrayIter<'a, T> {
        self.iter()
    }
}

impl<T: ReadUnchecked> Iterator for ReadArrayIter<'_, T> {
    type Item = T::HostType;

    fn next(&mut self) -> Option<T::HostType> {
        if self.index >= self.length {
            return None;
        }
        let scope = self
            .scope
            .offset_length(self.index * self.stride, T::SIZE)
            .ok()?;
        self.index += 1;
        // SAFETY: `offset_length` guarantees `SIZE` bytes are available.
        Some(unsafe { T::read_unchecked(&mut scope.ctxt()) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.length - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: ReadUnchecked> ExactSizeIterator for ReadArrayIter<'_, T> {}

impl<'a, T: ReadFixedSizeDep> Iterator for ReadArrayDepIter<'a, '_, T> {
    type Item = Result<T::HostType<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.array.len() {
            let result = self.array.read_item(self.index);
            self.index += 1;
            Some(result)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

macro_rules! read_unchecked_primitive {
    ($marker:ty, $host:ty, $size:expr) => {
        impl ReadUnchecked for $marker {
            type HostType = $host;

            const SIZE: usize = $size;

            unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> $host {
                <$host>::from_be_bytes(ctxt.read_unchecked_bytes::<{ $size }>())
            }
        }
    };
}

read_unchecked_primitive!(U8, u8, size::U8);
read_unchecked_primitive!(I8, i8, size::I8);
read_unchecked_primitive!(U16Be, u16, size::U16);
read_unchecked_primitive!(I16Be, i16, size::I16);
read_unchecked_primitive!(U32Be, u32, size::U32);
read_unchecked_primitive!(I32Be, i32, size::I32);

impl ReadUnchecked for U24Be {
    type HostType = u32;

    const SIZE: usize = size::U24;

    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> u32 {
        ctxt.read_unchecked_u24be()
    }
}

impl<T1, T2> ReadUnchecked for (T1, T2)
where
    T1: ReadUnchecked,
    T2: ReadUnchecked,
{
    type HostType = (T1::HostType, T2::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE;

    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType {
        let t1 = T1::read_unchecked(ctxt);
        let t2 = T2::read_unchecked(ctxt);
        (t1, t2)
    }
}

impl<T1, T2, T3> ReadUnchecked for (T1, T2, T3)
where
    T1: ReadUnchecked,
    T2: ReadUnchecked,
    T3: ReadUnchecked,
{
    type HostType = (T1::HostType, T2::HostType, T3::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE + T3::SIZE;

    unsafe fn read_unchecked(ctxt: &mut ReadCtxt<'_>) -> Self::HostType {
        let t1 = T1::read_unchecked(ctxt);
        let t2 = T2::read_unchecked(ctxt);
        let t3 = T3::read_unchecked(ctxt);
        (t1, t2, t3)
    }
}

impl<'a, T> fmt::Debug for ReadArray<'a, T>
where
    T: ReadFixedSizeDep,
    T::HostType<'a>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for item in self.iter_res() {
            list.entry(&item.map_err(|_| fmt::Error)?);
        }
        list.finish()
    }
}
