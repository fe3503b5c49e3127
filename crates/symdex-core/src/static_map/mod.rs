//! # Static Maps
//!
//! Read-only views that answer lookups directly against a serialized buffer
//! with binary searches, never deserializing it into objects.
//!
//! A view borrows the buffer, so the borrow checker guarantees the buffer
//! outlives every view built on it. Views are `Copy`, allocate nothing and
//! carry no interior mutability: one buffer can be queried from any number of
//! threads at once without locking.
//!
//! ## Example
//!
//! ```rust
//! use symdex_core::maps::RangeMap;
//! use symdex_core::serialize::IndexSerializer;
//! use symdex_core::static_map::StaticRangeMap;
//!
//! let mut lines = RangeMap::<u32, u32>::new();
//! lines.store_range(0x100, 0x10, 42u32).unwrap();
//! let bytes = lines.serialize().unwrap();
//! drop(lines);
//!
//! let view = StaticRangeMap::<u32, u32>::new(&bytes).unwrap();
//! let found = view.retrieve_range(0x10f).unwrap();
//! assert_eq!((found.entry, found.base, found.size), (42, 0x100, 0x10));
//! ```

pub mod address_map;
pub mod contained_range_map;
pub mod map;
pub mod range_map;

pub use address_map::StaticAddressMap;
pub use contained_range_map::StaticContainedRangeMap;
pub use map::{StaticMap, StaticMapCursor, StaticMapIter};
pub use range_map::StaticRangeMap;
