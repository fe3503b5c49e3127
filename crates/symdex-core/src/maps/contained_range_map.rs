//! Tree of properly nested address ranges.
//!
//! Ranges may sit entirely inside one another (a function inside a module,
//! an inlined call inside a function) but may never cross each other's
//! boundaries. Each level keeps its children keyed by upper bound, exactly like
//! [`super::RangeMap`], and a lookup walks down to the innermost range that
//! contains the address.

use std::collections::BTreeMap;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{IndexError, IndexResult};
use crate::types::RangeAddress;

/// One range in the tree.
///
/// The root is a sentinel with no entry; it only anchors the top-level ranges.
#[derive(Debug)]
pub(crate) struct Node<A, E>
{
    pub(crate) base: A,
    pub(crate) entry: Option<Arc<E>>,
    /// Child ranges keyed by their upper bound, pairwise disjoint
    pub(crate) children: BTreeMap<A, Node<A, E>>,
}

impl<A: RangeAddress, E> Node<A, E>
{
    fn new(base: A, entry: Option<Arc<E>>) -> Self
    {
        Self {
            base,
            entry,
            children: BTreeMap::new(),
        }
    }

    /// The child whose range contains `address`, if any.
    fn child_containing(&self, address: A) -> Option<&Node<A, E>>
    {
        self.children
            .range(address..)
            .next()
            .map(|(_, child)| child)
            .filter(|child| child.base <= address)
    }

    fn store(&mut self, base: A, high: A, entry: Arc<E>, allow_equal_ranges: bool) -> IndexResult<()>
    {
        // Only the first child ending at or above `base` can contain `base`.
        if let Some((&child_high, child)) = self.children.range_mut(base..).next() {
            if child.base <= base && high <= child_high {
                if child.base == base && child_high == high && !allow_equal_ranges {
                    debug!(
                        base = base.to_u64(),
                        high = high.to_u64(),
                        "contained range map store rejected: duplicate range"
                    );
                    return Err(IndexError::DuplicateRange {
                        base: base.to_u64(),
                        high: high.to_u64(),
                    });
                }
                return child.store(base, high, entry, allow_equal_ranges);
            }
            if child.base < base {
                return Err(partial_overlap(base, high, child.base, child_high));
            }
        }

        // The new range starts in a gap. Every sibling that begins inside it must
        // also end inside it; those siblings become the new range's children.
        let mut swallowed = Vec::new();
        for (&child_high, child) in self.children.range(base..) {
            if child.base > high {
                break;
            }
            if child_high > high {
                return Err(partial_overlap(base, high, child.base, child_high));
            }
            swallowed.push(child_high);
        }

        let mut node = Node::new(base, Some(entry));
        for key in swallowed {
            if let Some(child) = self.children.remove(&key) {
                node.children.insert(key, child);
            }
        }
        trace!(
            base = base.to_u64(),
            high = high.to_u64(),
            reparented = node.children.len(),
            "contained range map store"
        );
        self.children.insert(high, node);
        Ok(())
    }
}

fn partial_overlap<A: RangeAddress>(base: A, high: A, existing_base: A, existing_high: A) -> IndexError
{
    debug!(
        base = base.to_u64(),
        high = high.to_u64(),
        existing_base = existing_base.to_u64(),
        existing_high = existing_high.to_u64(),
        "contained range map store rejected: partial overlap"
    );
    IndexError::PartialContainmentViolation {
        base: base.to_u64(),
        high: high.to_u64(),
        existing_base: existing_base.to_u64(),
        existing_high: existing_high.to_u64(),
    }
}

/// Map of nested ranges to shared entries; lookups return the innermost match.
///
/// ## Example
///
/// ```rust
/// use symdex_core::maps::ContainedRangeMap;
///
/// let mut frames = ContainedRangeMap::<u32, &'static str>::new();
/// frames.store_range(0x100, 0x100, "outer").unwrap();
/// frames.store_range(0x140, 0x10, "inner").unwrap();
///
/// assert_eq!(frames.retrieve_range(0x145).map(|e| **e), Some("inner"));
/// assert_eq!(frames.retrieve_range(0x1ff).map(|e| **e), Some("outer"));
/// assert!(frames.retrieve_range(0x200).is_none());
///
/// // Crossing a boundary is rejected
/// assert!(frames.store_range(0x148, 0x10, "bogus").is_err());
/// ```
#[derive(Debug)]
pub struct ContainedRangeMap<A, E>
{
    root: Node<A, E>,
    allow_equal_ranges: bool,
}

impl<A: RangeAddress, E> Default for ContainedRangeMap<A, E>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<A: RangeAddress, E> ContainedRangeMap<A, E>
{
    /// Create an empty map that rejects ranges identical to stored ones.
    #[must_use]
    pub fn new() -> Self
    {
        Self::with_equal_ranges(false)
    }

    /// Create an empty map.
    ///
    /// With `allow_equal_ranges`, a range identical to a stored one is nested
    /// inside it instead of being rejected, so the most recent store wins at
    /// lookup.
    #[must_use]
    pub fn with_equal_ranges(allow_equal_ranges: bool) -> Self
    {
        Self {
            root: Node::new(A::ZERO, None),
            allow_equal_ranges,
        }
    }

    /// Whether identical ranges are nested rather than rejected.
    #[must_use]
    pub fn allows_equal_ranges(&self) -> bool
    {
        self.allow_equal_ranges
    }

    /// Store `entry` for the range `[base, base + size - 1]`.
    ///
    /// The range is placed inside the one stored range that fully contains it,
    /// or adopts as children every stored range it fully contains.
    ///
    /// ## Errors
    ///
    /// - [`IndexError::InvalidRange`] if `size` is zero or the upper bound overflows
    /// - [`IndexError::DuplicateRange`] if an identical range exists and equal
    ///   ranges are not allowed
    /// - [`IndexError::PartialContainmentViolation`] if the range crosses the
    ///   boundary of a stored range
    ///
    /// A failed store leaves the map unchanged.
    pub fn store_range(&mut self, base: A, size: A, entry: impl Into<Arc<E>>) -> IndexResult<()>
    {
        let Some(high) = A::range_high(base, size) else {
            debug!(
                base = base.to_u64(),
                size = size.to_u64(),
                "contained range map store rejected: empty or overflowing range"
            );
            return Err(IndexError::InvalidRange {
                base: base.to_u64(),
                size: size.to_u64(),
            });
        };
        self.root.store(base, high, entry.into(), self.allow_equal_ranges)
    }

    /// The entry of the innermost range containing `address`.
    pub fn retrieve_range(&self, address: A) -> Option<&Arc<E>>
    {
        let mut level = &self.root;
        let mut found = None;
        while let Some(child) = level.child_containing(address) {
            found = child.entry.as_ref();
            level = child;
        }
        found
    }

    /// Entries of every range containing `address`, innermost first.
    pub fn retrieve_ranges(&self, address: A) -> SmallVec<[&Arc<E>; 4]>
    {
        let mut found = SmallVec::new();
        let mut level = &self.root;
        while let Some(child) = level.child_containing(address) {
            found.extend(child.entry.as_ref());
            level = child;
        }
        found.reverse();
        found
    }

    /// Total number of stored ranges at every depth.
    #[must_use]
    pub fn len(&self) -> usize
    {
        let mut count = 0;
        let mut pending = vec![&self.root];
        while let Some(node) = pending.pop() {
            count += node.children.len();
            pending.extend(node.children.values());
        }
        count
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.root.children.is_empty()
    }

    /// Remove every range, releasing this map's references to their entries.
    pub fn clear(&mut self)
    {
        teardown(&mut self.root);
    }

    pub(crate) fn root(&self) -> &Node<A, E>
    {
        &self.root
    }
}

/// Drop a subtree without recursing once per level.
fn teardown<A, E>(root: &mut Node<A, E>)
{
    let mut pending: Vec<Node<A, E>> = std::mem::take(&mut root.children).into_values().collect();
    while let Some(mut node) = pending.pop() {
        pending.extend(std::mem::take(&mut node.children).into_values());
    }
}

impl<A, E> Drop for ContainedRangeMap<A, E>
{
    fn drop(&mut self)
    {
        teardown(&mut self.root);
    }
}
