//! Serialized counterpart of [`crate::maps::ContainedRangeMap`].
//!
//! Each node is `[base][u32 entry_size][entry][children]`, where `children` is
//! a plain map keyed by upper bound whose values are nodes of the same shape.

use std::fmt;
use std::marker::PhantomData;

use smallvec::SmallVec;
use tracing::warn;

use super::StaticMap;
use crate::error::{IndexError, IndexResult};
use crate::serialize::bytes::{read_len, U32_SIZE};
use crate::serialize::EntryView;
use crate::types::RangeAddress;

/// Innermost-range lookups against a serialized nested range map.
///
/// A view is one node of the tree; the view built from a whole buffer is the
/// root, whose own entry is a placeholder and never returned by lookups.
pub struct StaticContainedRangeMap<'a, A, E>
{
    base: A,
    entry: &'a [u8],
    children: StaticMap<'a, A, &'a [u8]>,
    _marker: PhantomData<fn() -> E>,
}

impl<A: Copy, E> Clone for StaticContainedRangeMap<'_, A, E>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<A: Copy, E> Copy for StaticContainedRangeMap<'_, A, E> {}

impl<A: fmt::Debug, E> fmt::Debug for StaticContainedRangeMap<'_, A, E>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("StaticContainedRangeMap")
            .field("base", &self.base)
            .field("entry_bytes", &self.entry.len())
            .field("children", &self.children)
            .finish()
    }
}

impl<'a, A: RangeAddress, E: EntryView<'a>> StaticContainedRangeMap<'a, A, E>
{
    /// View the node at the start of `data`.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::MalformedBuffer`] if the node header, its entry or
    /// its child map header does not fit in `data`.
    pub fn new(data: &'a [u8]) -> IndexResult<Self>
    {
        let truncated = || IndexError::MalformedBuffer(format!("{} bytes is too short for a range node", data.len()));

        let base = A::read_le(data).ok_or_else(truncated)?;
        let entry_size = read_len(data, A::WIDTH).ok_or_else(truncated)?;
        let entry_start = A::WIDTH + U32_SIZE;
        let entry_end = entry_start.checked_add(entry_size).ok_or_else(truncated)?;
        let entry = data.get(entry_start..entry_end).ok_or_else(truncated)?;
        let children = StaticMap::new(data.get(entry_end..).ok_or_else(truncated)?)?;

        Ok(Self {
            base,
            entry,
            children,
            _marker: PhantomData,
        })
    }

    /// Lowest address of this node's range.
    #[must_use]
    pub fn base(&self) -> A
    {
        self.base
    }

    /// Raw entry bytes of this node.
    #[must_use]
    pub fn entry_bytes(&self) -> &'a [u8]
    {
        self.entry
    }

    /// Decoded entry of this node.
    #[must_use]
    pub fn entry(&self) -> Option<E>
    {
        E::from_entry_bytes(self.entry)
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize
    {
        self.children.len()
    }

    /// True when the node has no children (for the root: nothing is stored).
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.children.is_empty()
    }

    fn child_containing(&self, address: A) -> Option<Self>
    {
        let cursor = self.children.lower_bound(address);
        let child = Self::new(cursor.value_bytes()?).ok()?;
        (child.base <= address).then_some(child)
    }

    /// The entry of the innermost range containing `address`.
    #[must_use]
    pub fn retrieve_range(&self, address: A) -> Option<E>
    {
        let mut level = *self;
        let mut found = None;
        while let Some(child) = level.child_containing(address) {
            found = Some(child.entry);
            level = child;
        }
        found.and_then(E::from_entry_bytes)
    }

    /// Entries of every range containing `address`, innermost first.
    #[must_use]
    pub fn retrieve_ranges(&self, address: A) -> SmallVec<[E; 4]>
    {
        let mut chain: SmallVec<[&'a [u8]; 4]> = SmallVec::new();
        let mut level = *self;
        while let Some(child) = level.child_containing(address) {
            chain.push(child.entry);
            level = child;
        }
        chain.into_iter().rev().filter_map(E::from_entry_bytes).collect()
    }

    /// Walk the whole tree checking every child map header, that each child
    /// range lies inside its parent, and that siblings are disjoint and sorted.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::MalformedBuffer`] describing the first problem found.
    pub fn validate_in_memory_structure(&self) -> IndexResult<()>
    {
        let mut pending: Vec<(Self, Option<(A, A)>)> = vec![(*self, None)];
        while let Some((node, bounds)) = pending.pop() {
            node.children.validate_in_memory_structure()?;
            let mut previous_high: Option<A> = None;
            for index in 0..node.children.len() {
                let (Some(high), Some(bytes)) = (node.children.key_at(index), node.children.value_bytes_at(index))
                else {
                    return Err(malformed(format!("child {index} is unreadable")));
                };
                let child = Self::new(bytes)?;
                if child.base > high {
                    return Err(malformed(format!(
                        "child base {:?} is above its high {high:?}",
                        child.base
                    )));
                }
                if previous_high.is_some_and(|previous| previous >= child.base) {
                    return Err(malformed(format!("child {index} overlaps its predecessor")));
                }
                if let Some((parent_base, parent_high)) = bounds {
                    if child.base < parent_base || high > parent_high {
                        return Err(malformed(format!(
                            "child [{:?}, {high:?}] escapes parent [{parent_base:?}, {parent_high:?}]",
                            child.base
                        )));
                    }
                }
                previous_high = Some(high);
                pending.push((child, Some((child.base, high))));
            }
        }
        Ok(())
    }
}

fn malformed(message: String) -> IndexError
{
    warn!(%message, "static contained range map failed validation");
    IndexError::MalformedBuffer(message)
}
