//! Point map keyed by address.
//!
//! Used for symbols that carry a start address but no size, such as public
//! symbols: an address belongs to the closest symbol at or below it.

use std::collections::btree_map::{self, Entry as MapEntry};
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{IndexError, IndexResult};
use crate::types::MapKey;

/// Map from addresses to shared entries with predecessor lookup.
///
/// ## Example
///
/// ```rust
/// use symdex_core::maps::AddressMap;
///
/// let mut symbols = AddressMap::<u64, String>::new();
/// symbols.store(0x1000, "main".to_string()).unwrap();
/// symbols.store(0x1400, "helper".to_string()).unwrap();
///
/// let (entry, address) = symbols.retrieve(0x13ff).unwrap();
/// assert_eq!(entry.as_str(), "main");
/// assert_eq!(address, 0x1000);
/// assert!(symbols.retrieve(0xfff).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AddressMap<A, E>
{
    map: BTreeMap<A, Arc<E>>,
}

impl<A, E> Default for AddressMap<A, E>
{
    fn default() -> Self
    {
        Self { map: BTreeMap::new() }
    }
}

impl<A: MapKey, E> AddressMap<A, E>
{
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Store `entry` at `address`.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::DuplicateKey`] if `address` is already present; the
    /// map is left unchanged.
    pub fn store(&mut self, address: A, entry: impl Into<Arc<E>>) -> IndexResult<()>
    {
        match self.map.entry(address) {
            MapEntry::Occupied(_) => {
                debug!(address = address.to_u64(), "address map store rejected: duplicate address");
                Err(IndexError::DuplicateKey {
                    address: address.to_u64(),
                })
            }
            MapEntry::Vacant(slot) => {
                slot.insert(entry.into());
                trace!(address = address.to_u64(), "address map store");
                Ok(())
            }
        }
    }

    /// Find the entry with the greatest address less than or equal to `address`.
    ///
    /// Returns the entry together with the address it was stored at, or `None`
    /// when `address` is below every stored address.
    pub fn retrieve(&self, address: A) -> Option<(&Arc<E>, A)>
    {
        self.map.range(..=address).next_back().map(|(stored, entry)| (entry, *stored))
    }

    /// Remove every entry, releasing this map's references to them.
    pub fn clear(&mut self)
    {
        self.map.clear();
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

    /// Entries in ascending address order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (A, &Arc<E>)> + ExactSizeIterator + Clone + '_
    {
        self.map.iter().map(|(address, entry)| (*address, entry))
    }

    pub(crate) fn stored(&self) -> btree_map::Iter<'_, A, Arc<E>>
    {
        self.map.iter()
    }
}
