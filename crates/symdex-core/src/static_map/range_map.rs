//! Serialized counterpart of [`crate::maps::RangeMap`].

use std::fmt;
use std::marker::PhantomData;

use tracing::warn;

use super::StaticMap;
use crate::error::{IndexError, IndexResult};
use crate::maps::RangeMatch;
use crate::serialize::EntryView;
use crate::types::RangeAddress;

/// Range lookups against a serialized range map.
///
/// Keys are range upper bounds; each value is `[base][entry]`.
pub struct StaticRangeMap<'a, A, E>
{
    map: StaticMap<'a, A, &'a [u8]>,
    _marker: PhantomData<fn() -> E>,
}

impl<A, E> Clone for StaticRangeMap<'_, A, E>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<A, E> Copy for StaticRangeMap<'_, A, E> {}

impl<A, E> fmt::Debug for StaticRangeMap<'_, A, E>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("StaticRangeMap").field("map", &self.map).finish()
    }
}

impl<'a, A: RangeAddress, E: EntryView<'a>> StaticRangeMap<'a, A, E>
{
    /// View a buffer produced by serializing a [`crate::maps::RangeMap`].
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::MalformedBuffer`] if the header does not fit in `data`.
    pub fn new(data: &'a [u8]) -> IndexResult<Self>
    {
        Ok(Self {
            map: StaticMap::new(data)?,
            _marker: PhantomData,
        })
    }

    fn range_at(&self, index: usize) -> Option<RangeMatch<A, E>>
    {
        let high = self.map.key_at(index)?;
        let value = self.map.value_bytes_at(index)?;
        let base = A::read_le(value)?;
        if base > high {
            return None;
        }
        let entry = E::from_entry_bytes(value.get(A::WIDTH..)?)?;
        Some(RangeMatch {
            entry,
            base,
            size: A::range_size(base, high),
        })
    }

    /// Find the range containing `address`.
    #[must_use]
    pub fn retrieve_range(&self, address: A) -> Option<RangeMatch<A, E>>
    {
        let cursor = self.map.lower_bound(address);
        if cursor.is_end() {
            return None;
        }
        let found = self.range_at(cursor.index())?;
        // The first range ending at or above the address may still start above it.
        if address < found.base {
            return None;
        }
        Some(found)
    }

    /// Find the range containing `address`, or failing that the closest range
    /// lying entirely below it.
    #[must_use]
    pub fn retrieve_nearest_range(&self, address: A) -> Option<RangeMatch<A, E>>
    {
        self.retrieve_range(address).or_else(|| {
            let below = self.map.upper_bound(address).index().checked_sub(1)?;
            self.range_at(below)
        })
    }

    /// The `index`-th range in ascending address order.
    ///
    /// ## Errors
    ///
    /// - [`IndexError::IndexOutOfRange`] if `index >= self.len()`
    /// - [`IndexError::MalformedBuffer`] if the node cannot be decoded
    pub fn retrieve_range_at_index(&self, index: usize) -> IndexResult<RangeMatch<A, E>>
    {
        if index >= self.map.len() {
            return Err(IndexError::IndexOutOfRange {
                index,
                count: self.map.len(),
            });
        }
        self.range_at(index)
            .ok_or_else(|| IndexError::MalformedBuffer(format!("range {index} cannot be decoded")))
    }

    /// Number of stored ranges.
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

    /// Ranges in ascending address order, stopping at the first undecodable one.
    pub fn iter(&self) -> impl Iterator<Item = RangeMatch<A, E>> + 'a
    where
        A: 'a,
        E: 'a,
    {
        let view = *self;
        (0..view.len()).map_while(move |index| view.range_at(index))
    }

    /// Check the header, then that every range has a readable base no greater
    /// than its upper bound and that ranges do not overlap.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::MalformedBuffer`] describing the first problem found.
    pub fn validate_in_memory_structure(&self) -> IndexResult<()>
    {
        self.map.validate_in_memory_structure()?;
        let mut previous_high: Option<A> = None;
        for index in 0..self.map.len() {
            let base = self.map.value_bytes_at(index).and_then(A::read_le);
            let high = self.map.key_at(index);
            let (Some(base), Some(high)) = (base, high) else {
                return Err(malformed(format!("range {index} has no readable base")));
            };
            if base > high {
                return Err(malformed(format!("range {index} base {base:?} is above its high {high:?}")));
            }
            if previous_high.is_some_and(|previous| previous >= base) {
                return Err(malformed(format!("range {index} overlaps its predecessor")));
            }
            previous_high = Some(high);
        }
        Ok(())
    }
}

fn malformed(message: String) -> IndexError
{
    warn!(%message, "static range map failed validation");
    IndexError::MalformedBuffer(message)
}
