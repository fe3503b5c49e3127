//! # Mutable Indexes
//!
//! Write-once, read-many structures populated during a single-threaded load
//! pass (typically one symbol file per module):
//!
//! - [`AddressMap`]: point map, lookup returns the greatest key at or below the query
//! - [`RangeMap`]: disjoint intervals, lookup returns the interval containing the query
//! - [`ContainedRangeMap`]: properly nested intervals, lookup returns the innermost match
//!
//! Entries are held as `Arc<E>` so the same record can be indexed from several
//! structures at once; clearing one index never invalidates another.
//!
//! None of these types synchronize internally. Build them on one thread, then
//! either share them behind `&` or serialize them and query the
//! [`crate::static_map`] views.

pub mod address_map;
pub mod contained_range_map;
pub mod range_map;

pub use address_map::AddressMap;
pub use contained_range_map::ContainedRangeMap;
pub use range_map::{MergeStrategy, RangeMap};

/// Result of a range lookup.
///
/// Mutable maps hand out `&Arc<E>` entries; the static views hand out whatever
/// [`crate::serialize::EntryView`] decodes from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMatch<A, T>
{
    /// The entry stored for the range
    pub entry: T,
    /// Lowest address of the range
    pub base: A,
    /// Number of addresses covered
    pub size: A,
}
