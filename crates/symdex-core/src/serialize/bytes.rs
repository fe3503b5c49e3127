//! Bounds-checked byte access for the serialized layout.
//!
//! Writers never index past the destination slice and readers never decode past
//! the end of the buffer they were handed: an out-of-range access becomes an
//! error or `None` instead of undefined behaviour or a panic.

use crate::error::{IndexError, IndexResult};
use crate::types::MapKey;

/// Size in bytes of every header integer (node count, offsets, entry sizes)
pub const U32_SIZE: usize = 4;

/// Sequential writer over a caller-supplied byte slice.
///
/// All integers are written little-endian.
#[derive(Debug)]
pub struct ByteWriter<'a>
{
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a>
{
    /// Start writing at the beginning of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self
    {
        Self { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn position(&self) -> usize
    {
        self.pos
    }

    /// Number of bytes still available.
    #[must_use]
    pub fn remaining(&self) -> usize
    {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, len: usize) -> IndexResult<&mut [u8]>
    {
        let available = self.buf.len();
        let end = match self.pos.checked_add(len) {
            Some(end) if end <= available => end,
            _ => {
                return Err(IndexError::BufferTooSmall {
                    needed: self.pos.saturating_add(len),
                    available,
                })
            }
        };
        let start = self.pos;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }

    /// Write a 4-byte header integer.
    pub fn put_u32(&mut self, value: u32) -> IndexResult<()>
    {
        self.reserve(U32_SIZE)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Write a length or offset as a 4-byte header integer.
    ///
    /// `what` names the field in the overflow error.
    pub fn put_len(&mut self, value: usize, what: &str) -> IndexResult<()>
    {
        let value = u32::try_from(value)
            .map_err(|_| IndexError::LayoutOverflow(format!("{what} {value} does not fit in 32 bits")))?;
        self.put_u32(value)
    }

    /// Write a fixed-width key or address.
    pub fn put_key<K: MapKey>(&mut self, key: K) -> IndexResult<()>
    {
        key.write_le(self.reserve(K::WIDTH)?);
        Ok(())
    }

    /// Copy raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> IndexResult<()>
    {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }
}

/// Decode the header integer at `offset`, if it lies inside `data`.
pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32>
{
    let end = offset.checked_add(U32_SIZE)?;
    let raw: [u8; U32_SIZE] = data.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

/// Decode the header integer at `offset` as a byte count or offset.
pub(crate) fn read_len(data: &[u8], offset: usize) -> Option<usize>
{
    read_u32(data, offset).and_then(|value| usize::try_from(value).ok())
}
