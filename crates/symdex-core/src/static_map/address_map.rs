//! Serialized counterpart of [`crate::maps::AddressMap`].

use super::StaticMap;
use crate::error::IndexResult;
use crate::serialize::EntryView;
use crate::types::MapKey;

/// Predecessor lookups against a serialized address map.
#[derive(Debug)]
pub struct StaticAddressMap<'a, A, E>
{
    map: StaticMap<'a, A, E>,
}

impl<A, E> Clone for StaticAddressMap<'_, A, E>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<A, E> Copy for StaticAddressMap<'_, A, E> {}

impl<'a, A: MapKey, E: EntryView<'a>> StaticAddressMap<'a, A, E>
{
    /// View a buffer produced by serializing an [`crate::maps::AddressMap`].
    ///
    /// ## Errors
    ///
    /// Returns [`crate::IndexError::MalformedBuffer`] if the header does not fit in `data`.
    pub fn new(data: &'a [u8]) -> IndexResult<Self>
    {
        Ok(Self {
            map: StaticMap::new(data)?,
        })
    }

    /// Find the entry with the greatest address less than or equal to `address`.
    ///
    /// Returns the entry together with the address it was stored at.
    #[must_use]
    pub fn retrieve(&self, address: A) -> Option<(E, A)>
    {
        let mut cursor = self.map.upper_bound(address);
        if cursor.index() == 0 {
            return None;
        }
        cursor.retreat();
        Some((cursor.value()?, cursor.key()?))
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.map.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.map.is_empty()
    }

    /// The underlying plain map.
    #[must_use]
    pub fn as_map(&self) -> &StaticMap<'a, A, E>
    {
        &self.map
    }

    /// Check the buffer's header; see [`StaticMap::validate_in_memory_structure`].
    ///
    /// ## Errors
    ///
    /// Returns [`crate::IndexError::MalformedBuffer`] describing the first problem found.
    pub fn validate_in_memory_structure(&self) -> IndexResult<()>
    {
        self.map.validate_in_memory_structure()
    }
}
