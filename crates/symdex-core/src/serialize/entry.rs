//! Entry encoding.
//!
//! Entries are opaque to the maps. Writing one into a buffer goes through
//! [`SerializeEntry`]; reading one back out of a buffer, without copying where
//! the type allows it, goes through [`EntryView`].
//!
//! An entry's bytes run from its offset to the start of the next value (or the
//! end of its region), so variable-length entries such as strings need no length
//! prefix of their own.

use std::sync::Arc;

use super::bytes::ByteWriter;
use crate::error::IndexResult;
use crate::types::{Address, MapKey};

/// An entry that can be copied by value into a serialized index.
///
/// `serialized_size` must equal the number of bytes `write_entry` produces;
/// the serializers size the buffer from it before writing.
pub trait SerializeEntry
{
    /// Exact encoded length in bytes.
    fn serialized_size(&self) -> usize;

    /// Append the encoded entry to `writer`.
    ///
    /// ## Errors
    ///
    /// Returns [`crate::IndexError::BufferTooSmall`] if the destination runs out of space.
    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>;
}

/// A value decoded from (or borrowed out of) an entry's bytes.
///
/// Returns `None` when the bytes cannot represent `Self`: too short for a
/// fixed-width integer, or not UTF-8 for a string.
pub trait EntryView<'a>: Sized
{
    /// Decode a view over `bytes`.
    fn from_entry_bytes(bytes: &'a [u8]) -> Option<Self>;
}

macro_rules! impl_integer_entry {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SerializeEntry for $ty
            {
                fn serialized_size(&self) -> usize
                {
                    std::mem::size_of::<$ty>()
                }

                fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
                {
                    writer.put_bytes(&self.to_le_bytes())
                }
            }

            impl<'a> EntryView<'a> for $ty
            {
                fn from_entry_bytes(bytes: &'a [u8]) -> Option<Self>
                {
                    let raw: [u8; std::mem::size_of::<$ty>()] =
                        bytes.get(..std::mem::size_of::<$ty>())?.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_integer_entry!(u32, u64, i32, i64);

impl SerializeEntry for Address
{
    fn serialized_size(&self) -> usize
    {
        Address::WIDTH
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        writer.put_key(*self)
    }
}

impl<'a> EntryView<'a> for Address
{
    fn from_entry_bytes(bytes: &'a [u8]) -> Option<Self>
    {
        Address::read_le(bytes)
    }
}

impl SerializeEntry for [u8]
{
    fn serialized_size(&self) -> usize
    {
        self.len()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        writer.put_bytes(self)
    }
}

impl SerializeEntry for Vec<u8>
{
    fn serialized_size(&self) -> usize
    {
        self.len()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        writer.put_bytes(self)
    }
}

impl SerializeEntry for str
{
    fn serialized_size(&self) -> usize
    {
        self.len()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        writer.put_bytes(self.as_bytes())
    }
}

impl SerializeEntry for String
{
    fn serialized_size(&self) -> usize
    {
        self.len()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        writer.put_bytes(self.as_bytes())
    }
}

impl<T: SerializeEntry + ?Sized> SerializeEntry for Arc<T>
{
    fn serialized_size(&self) -> usize
    {
        (**self).serialized_size()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        (**self).write_entry(writer)
    }
}

impl<T: SerializeEntry + ?Sized> SerializeEntry for &T
{
    fn serialized_size(&self) -> usize
    {
        (**self).serialized_size()
    }

    fn write_entry(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        (**self).write_entry(writer)
    }
}

impl<'a> EntryView<'a> for &'a [u8]
{
    fn from_entry_bytes(bytes: &'a [u8]) -> Option<Self>
    {
        Some(bytes)
    }
}

impl<'a> EntryView<'a> for &'a str
{
    fn from_entry_bytes(bytes: &'a [u8]) -> Option<Self>
    {
        std::str::from_utf8(bytes).ok()
    }
}
