//! Common module for library exports

pub use crate::error::{IndexError, IndexResult};
pub use crate::maps::{AddressMap, ContainedRangeMap, MergeStrategy, RangeMap, RangeMatch};
pub use crate::serialize::{EntryView, IndexSerializer, SerializeEntry};
pub use crate::static_map::{StaticAddressMap, StaticContainedRangeMap, StaticMap, StaticRangeMap};
pub use crate::types::{Address, MapKey, RangeAddress};
