//! # Serialization
//!
//! Flattens a populated index into one contiguous byte buffer that the
//! [`crate::static_map`] views can query in place.
//!
//! Serialization runs in two passes: [`IndexSerializer::size_of`] computes the
//! exact length without writing anything, then [`IndexSerializer::write`] emits
//! the bytes. The two must always agree; [`IndexSerializer::serialize`] checks it.
//!
//! ## Layouts
//!
//! All integers are little-endian, whatever the host. Header fields are `u32`;
//! keys and addresses use the map's address width.
//!
//! | structure | layout |
//! |-----------|--------|
//! | `BTreeMap<K, V>` / [`crate::maps::AddressMap`] | `[count][offsets][keys][values]` |
//! | [`crate::maps::RangeMap`] | same, keys are upper bounds, each value is `[base][entry]` |
//! | [`crate::maps::ContainedRangeMap`] | per node `[base][u32 entry_size][entry][children as plain map of nodes]` |
//!
//! Entries are copied by value, so the buffer and the mutable index have
//! independent lifetimes once serialization returns.

pub mod bytes;
pub mod entry;
pub(crate) mod layout;
mod serializers;

pub use bytes::ByteWriter;
pub use entry::{EntryView, SerializeEntry};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// A structure with a fixed serialized layout.
pub trait IndexSerializer
{
    /// Exact number of bytes [`Self::write`] will produce.
    fn size_of(&self) -> usize;

    /// Append the serialized form at the writer's current position.
    ///
    /// ## Errors
    ///
    /// See [`Self::write`].
    fn write_to(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>;

    /// Write the serialized form to the start of `dest`.
    ///
    /// Returns the number of bytes written, i.e. the offset just past the end
    /// of the serialized data.
    ///
    /// ## Errors
    ///
    /// - [`IndexError::BufferTooSmall`] if `dest` is shorter than [`Self::size_of`];
    ///   whatever was written before the failure must not be used
    /// - [`IndexError::LayoutOverflow`] if a count, offset or entry size needs more than 32 bits
    fn write(&self, dest: &mut [u8]) -> IndexResult<usize>
    {
        let mut writer = ByteWriter::new(dest);
        self.write_to(&mut writer)?;
        Ok(writer.position())
    }

    /// Allocate a buffer of exactly [`Self::size_of`] bytes and write into it.
    ///
    /// ## Errors
    ///
    /// - [`IndexError::AllocationFailure`] if the buffer cannot be allocated;
    ///   no partial buffer is returned
    /// - [`IndexError::SizeMismatch`] if the written length disagrees with the
    ///   precomputed size
    /// - anything [`Self::write`] reports
    fn serialize(&self) -> IndexResult<Vec<u8>>
    {
        let size = self.size_of();
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| IndexError::AllocationFailure { size })?;
        buffer.resize(size, 0);

        let written = self.write(&mut buffer)?;
        if written != size {
            return Err(IndexError::SizeMismatch {
                expected: size,
                written,
            });
        }
        debug!(bytes = size, "serialized index");
        Ok(buffer)
    }
}
