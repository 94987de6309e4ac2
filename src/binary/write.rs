#![deny(missing_docs)]

//! Write binary data
//!
//! Only what is needed to assemble an `sfnt` from unpacked WOFF tables.

use std::marker::PhantomData;

use crate::binary::read::ReadUnchecked;
use crate::binary::{U16Be, U32Be, U8};
use crate::error::WriteError;

/// An in-memory buffer that implements `WriteContext`.
pub struct WriteBuffer {
    data: Vec<u8>,
}

/// A placeholder for a value that will be filled in later using
/// [WriteContext::write_placeholder].
pub struct Placeholder<T> {
    offset: usize,
    marker: PhantomData<T>,
}

/// Trait that describes a type that can be written to a `WriteContext` in binary form.
pub trait WriteBinary<HostType = Self> {
    /// Write the binary representation of `val` to `ctxt`.
    fn write<C: WriteContext>(ctxt: &mut C, val: HostType) -> Result<(), WriteError>;
}

/// Trait for types that can have binary data written to them.
pub trait WriteContext {
    /// Write a slice of bytes to a `WriteContext`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Write the specified number of zero bytes to the `WriteContext`.
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError>;

    /// The total number of bytes written so far.
    fn bytes_written(&self) -> usize;

    /// Reserve space for a `T` to be filled in later.
    fn placeholder<T>(&mut self) -> Result<Placeholder<T>, WriteError>
    where
        Self: Sized,
        T: WriteBinary<u32> + ReadUnchecked,
    {
        let offset = self.bytes_written();
        self.write_zeros(T::SIZE)?;
        Ok(Placeholder {
            offset,
            marker: PhantomData,
        })
    }

    /// Consume the placeholder, writing `val` into the space it reserved.
    fn write_placeholder<T>(&mut self, placeholder: Placeholder<T>, val: u32) -> Result<(), WriteError>
    where
        T: WriteBinary<u32> + ReadUnchecked;
}

impl WriteBuffer {
    /// Create a new, empty `WriteBuffer`.
    pub fn new() -> Self {
        WriteBuffer { data: Vec::new() }
    }

    /// Create a `WriteBuffer` able to hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        WriteBuffer {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Pad with zeros to the next multiple of four bytes.
    pub fn pad_to_long(&mut self) -> Result<(), WriteError> {
        let padding = crate::binary::long_align(self.data.len()) - self.data.len();
        self.write_zeros(padding)
    }

    /// Return the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        WriteBuffer::new()
    }
}

impl WriteContext for WriteBuffer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.data.resize(self.data.len() + count, 0);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
    }

    fn write_placeholder<T>(&mut self, placeholder: Placeholder<T>, val: u32) -> Result<(), WriteError>
    where
        T: WriteBinary<u32> + ReadUnchecked,
    {
        let mut scratch = WriteBuffer::with_capacity(T::SIZE);
        T::write(&mut scratch, val)?;
        let end = placeholder.offset + T::SIZE;
        let slot = self
            .data
            .get_mut(placeholder.offset..end)
            .ok_or(WriteError::BadValue)?;
        slot.copy_from_slice(&scratch.data);
        Ok(())
    }
}

impl WriteBinary<u8> for U8 {
    fn write<C: WriteContext>(ctxt: &mut C, val: u8) -> Result<(), WriteError> {
        ctxt.write_bytes(&[val])
    }
}

impl WriteBinary<u16> for U16Be {
    fn write<C: WriteContext>(ctxt: &mut C, val: u16) -> Result<(), WriteError> {
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl WriteBinary<u32> for U16Be {
    fn write<C: WriteContext>(ctxt: &mut C, val: u32) -> Result<(), WriteError> {
        let val = u16::try_from(val).map_err(|_| WriteError::BadValue)?;
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl WriteBinary<u32> for U32Be {
    fn write<C: WriteContext>(ctxt: &mut C, val: u32) -> Result<(), WriteError> {
        ctxt.write_bytes(&val.to_be_bytes())
    }
}
