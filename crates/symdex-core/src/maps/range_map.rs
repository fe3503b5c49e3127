//! Map of disjoint address ranges.
//!
//! Ranges are stored keyed by their inclusive upper bound, so a lookup is a
//! single ordered search for the first range ending at or above the address
//! followed by a check that the range actually starts at or below it.

use std::collections::{btree_map, BTreeMap};
use std::sync::Arc;

use tracing::{debug, trace};

use super::RangeMatch;
use crate::error::{IndexError, IndexResult};
use crate::types::RangeAddress;

/// How [`RangeMap::store_range`] treats a range that overlaps stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy
{
    /// Reject any overlap: partial, full containment either way, or identical bounds.
    #[default]
    Exclusive,
    /// Keep the range that starts higher intact and cut the one that starts
    /// lower so it ends just below the other's base.
    ///
    /// Two ranges with the same base cannot be separated this way and are rejected.
    TruncateLower,
    /// Keep the range that starts lower intact and cut the one that starts
    /// higher so it begins just above the other's upper bound.
    ///
    /// Rejected when nothing of the new range would remain, or when the new
    /// range would swallow an existing one whole.
    TruncateUpper,
}

#[derive(Debug, Clone)]
pub(crate) struct Range<A, E>
{
    pub(crate) base: A,
    pub(crate) entry: Arc<E>,
}

/// Map of non-overlapping `[base, base + size - 1]` ranges to shared entries.
///
/// ## Example
///
/// ```rust
/// use symdex_core::maps::RangeMap;
///
/// let mut functions = RangeMap::<u64, String>::new();
/// functions.store_range(0x1000, 0x80, "main".to_string()).unwrap();
/// functions.store_range(0x1080, 0x20, "helper".to_string()).unwrap();
///
/// // Overlaps are rejected and leave the map untouched
/// assert!(functions.store_range(0x1040, 0x100, "bogus".to_string()).is_err());
///
/// let found = functions.retrieve_range(0x1090).unwrap();
/// assert_eq!(found.entry.as_str(), "helper");
/// assert_eq!((found.base, found.size), (0x1080, 0x20));
/// ```
#[derive(Debug, Clone)]
pub struct RangeMap<A, E>
{
    map: BTreeMap<A, Range<A, E>>,
    merge_strategy: MergeStrategy,
}

impl<A, E> Default for RangeMap<A, E>
{
    fn default() -> Self
    {
        Self {
            map: BTreeMap::new(),
            merge_strategy: MergeStrategy::Exclusive,
        }
    }
}

impl<A: RangeAddress, E> RangeMap<A, E>
{
    /// Create an empty map that rejects every overlap.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Create an empty map that resolves overlaps with `strategy`.
    #[must_use]
    pub fn with_merge_strategy(strategy: MergeStrategy) -> Self
    {
        Self {
            map: BTreeMap::new(),
            merge_strategy: strategy,
        }
    }

    /// The overlap policy used by [`Self::store_range`].
    #[must_use]
    pub fn merge_strategy(&self) -> MergeStrategy
    {
        self.merge_strategy
    }

    /// Change the overlap policy for subsequent stores.
    pub fn set_merge_strategy(&mut self, strategy: MergeStrategy)
    {
        self.merge_strategy = strategy;
    }

    /// Store `entry` for the range `[base, base + size - 1]`.
    ///
    /// ## Errors
    ///
    /// - [`IndexError::InvalidRange`] if `size` is zero or the upper bound overflows
    /// - [`IndexError::OverlapViolation`] if the range intersects a stored range
    ///   and the merge strategy cannot resolve it
    ///
    /// A failed store leaves the map unchanged.
    pub fn store_range(&mut self, base: A, size: A, entry: impl Into<Arc<E>>) -> IndexResult<()>
    {
        let Some(high) = A::range_high(base, size) else {
            debug!(
                base = base.to_u64(),
                size = size.to_u64(),
                "range map store rejected: empty or overflowing range"
            );
            return Err(IndexError::InvalidRange {
                base: base.to_u64(),
                size: size.to_u64(),
            });
        };

        let (base, high) = match self.merge_strategy {
            MergeStrategy::Exclusive => match self.first_overlap(base, high) {
                Some((existing_base, existing_high)) => {
                    return Err(Self::overlap(base, high, existing_base, existing_high));
                }
                None => (base, high),
            },
            MergeStrategy::TruncateLower => (base, self.truncate_lower(base, high)?),
            MergeStrategy::TruncateUpper => (self.truncate_upper(base, high)?, high),
        };

        self.map.insert(
            high,
            Range {
                base,
                entry: entry.into(),
            },
        );
        trace!(base = base.to_u64(), high = high.to_u64(), "range map store");
        Ok(())
    }

    /// Find the range containing `address`.
    pub fn retrieve_range(&self, address: A) -> Option<RangeMatch<A, &Arc<E>>>
    {
        let (high, range) = self.map.range(address..).next()?;
        // The first range ending at or above the address may still start above it.
        if address < range.base {
            return None;
        }
        Some(Self::to_match(*high, range))
    }

    /// Find the range containing `address`, or failing that the closest range
    /// lying entirely below it.
    pub fn retrieve_nearest_range(&self, address: A) -> Option<RangeMatch<A, &Arc<E>>>
    {
        self.retrieve_range(address).or_else(|| {
            self.map
                .range(..=address)
                .next_back()
                .map(|(high, range)| Self::to_match(*high, range))
        })
    }

    /// The `index`-th range in ascending address order.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::IndexOutOfRange`] if `index >= self.len()`.
    pub fn retrieve_range_at_index(&self, index: usize) -> IndexResult<RangeMatch<A, &Arc<E>>>
    {
        self.map
            .iter()
            .nth(index)
            .map(|(high, range)| Self::to_match(*high, range))
            .ok_or(IndexError::IndexOutOfRange {
                index,
                count: self.map.len(),
            })
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

    /// Remove every range, releasing this map's references to their entries.
    pub fn clear(&mut self)
    {
        self.map.clear();
    }

    /// Ranges in ascending address order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = RangeMatch<A, &Arc<E>>> + ExactSizeIterator + '_
    {
        self.map.iter().map(|(high, range)| Self::to_match(*high, range))
    }

    pub(crate) fn stored(&self) -> btree_map::Iter<'_, A, Range<A, E>>
    {
        self.map.iter()
    }

    fn to_match(high: A, range: &Range<A, E>) -> RangeMatch<A, &Arc<E>>
    {
        RangeMatch {
            entry: &range.entry,
            base: range.base,
            size: A::range_size(range.base, high),
        }
    }

    /// Bounds of the lowest stored range intersecting `[base, high]`.
    fn first_overlap(&self, base: A, high: A) -> Option<(A, A)>
    {
        self.map
            .range(base..)
            .next()
            .filter(|(_, range)| range.base <= high)
            .map(|(existing_high, range)| (range.base, *existing_high))
    }

    fn overlap(base: A, high: A, existing_base: A, existing_high: A) -> IndexError
    {
        debug!(
            base = base.to_u64(),
            high = high.to_u64(),
            existing_base = existing_base.to_u64(),
            existing_high = existing_high.to_u64(),
            "range map store rejected: overlapping range"
        );
        IndexError::OverlapViolation {
            base: base.to_u64(),
            high: high.to_u64(),
            existing_base: existing_base.to_u64(),
            existing_high: existing_high.to_u64(),
        }
    }

    /// Resolve overlaps by shortening whichever range starts lower.
    ///
    /// Returns the (possibly reduced) upper bound of the new range. Every
    /// rejection happens before any stored range is touched.
    fn truncate_lower(&mut self, base: A, mut high: A) -> IndexResult<A>
    {
        while let Some((existing_base, existing_high)) = self.first_overlap(base, high) {
            if existing_base == base {
                return Err(Self::overlap(base, high, existing_base, existing_high));
            }
            if base < existing_base {
                let Some(new_high) = existing_base.predecessor() else {
                    return Err(Self::overlap(base, high, existing_base, existing_high));
                };
                debug!(
                    base = base.to_u64(),
                    from = high.to_u64(),
                    to = new_high.to_u64(),
                    "truncating new range below existing range"
                );
                high = new_high;
            } else {
                let Some(new_existing_high) = base.predecessor() else {
                    return Err(Self::overlap(base, high, existing_base, existing_high));
                };
                if let Some(range) = self.map.remove(&existing_high) {
                    debug!(
                        existing_base = existing_base.to_u64(),
                        from = existing_high.to_u64(),
                        to = new_existing_high.to_u64(),
                        "truncating existing range below new range"
                    );
                    self.map.insert(new_existing_high, range);
                }
            }
        }
        Ok(high)
    }

    /// Resolve overlaps by shortening whichever range starts higher.
    ///
    /// Returns the (possibly raised) base of the new range. Every rejection
    /// happens before any stored range is touched.
    fn truncate_upper(&mut self, mut base: A, high: A) -> IndexResult<A>
    {
        while let Some((existing_base, existing_high)) = self.first_overlap(base, high) {
            if existing_base <= base {
                let new_base = match existing_high.successor() {
                    Some(new_base) if existing_high < high => new_base,
                    _ => return Err(Self::overlap(base, high, existing_base, existing_high)),
                };
                debug!(
                    high = high.to_u64(),
                    from = base.to_u64(),
                    to = new_base.to_u64(),
                    "truncating new range above existing range"
                );
                base = new_base;
            } else {
                let new_existing_base = match high.successor() {
                    Some(new_existing_base) if existing_high > high => new_existing_base,
                    _ => return Err(Self::overlap(base, high, existing_base, existing_high)),
                };
                if let Some(range) = self.map.get_mut(&existing_high) {
                    debug!(
                        existing_high = existing_high.to_u64(),
                        from = existing_base.to_u64(),
                        to = new_existing_base.to_u64(),
                        "truncating existing range above new range"
                    );
                    range.base = new_existing_base;
                }
            }
        }
        Ok(base)
    }
}
