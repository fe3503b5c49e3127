//! # Types
//!
//! Key and address types shared by every index.
//!
//! The maps are generic over their address width. `u32` and `u64` work out of
//! the box; [`Address`] is a `u64` newtype for callers who want the type system
//! to keep addresses and sizes apart.

pub mod address;
pub mod key;

// Re-export all public types
pub use address::Address;
pub use key::{MapKey, RangeAddress};
