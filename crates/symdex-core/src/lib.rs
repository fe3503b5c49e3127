//! # symdex-core
//!
//! Address-keyed indexes for symbolication, in two forms.
//!
//! This crate provides:
//! - [`maps::AddressMap`]: nearest-at-or-below lookup over single addresses
//! - [`maps::RangeMap`]: disjoint `(base, size)` ranges with optional merge strategies
//! - [`maps::ContainedRangeMap`]: properly nested ranges answering innermost-range queries
//! - [`serialize`]: a flat little-endian byte layout for each of the maps above
//! - [`static_map`]: zero-copy views that run the same lookups directly on that layout
//!
//! ## Lifecycle
//!
//! A producer builds a mutable map, serializes it once into a byte buffer and
//! drops it. Consumers load the buffer (from a file, a cache, shared memory)
//! and answer lookups against it without rebuilding any objects. Views borrow
//! the buffer, so it cannot be freed while a view still reads from it.
//!
//! ## Example
//!
//! ```rust
//! use symdex_core::prelude::*;
//!
//! let mut functions = ContainedRangeMap::<u64, String>::new();
//! functions.store_range(0x1000, 0x100, "outer".to_string()).unwrap();
//! functions.store_range(0x1040, 0x10, "inlined".to_string()).unwrap();
//!
//! let bytes = functions.serialize().unwrap();
//! let view = StaticContainedRangeMap::<u64, &str>::new(&bytes).unwrap();
//! assert_eq!(view.retrieve_range(0x1044), Some("inlined"));
//! assert_eq!(view.retrieve_range(0x1080), Some("outer"));
//! assert_eq!(view.retrieve_range(0x2000), None);
//! ```

pub mod error;
pub mod maps;
pub mod prelude;
pub mod serialize;
pub mod static_map;
pub mod types;

pub use error::{IndexError, IndexResult};
pub use types::{Address, MapKey, RangeAddress};
