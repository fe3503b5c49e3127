//! Read-only view over one serialized plain map.

use std::fmt;
use std::marker::PhantomData;

use tracing::warn;

use crate::error::{IndexError, IndexResult};
use crate::serialize::bytes::{read_len, U32_SIZE};
use crate::serialize::layout::header_size;
use crate::serialize::EntryView;
use crate::types::MapKey;

/// Sorted map queried in place from `[count][offsets][keys][values]` bytes.
///
/// Construction checks only that the header fits in the buffer; it does not
/// walk the offsets or keys. The producer is trusted to have written keys in
/// strictly ascending order. [`Self::validate_in_memory_structure`] checks that
/// for tooling and tests.
///
/// Every read is bounds-checked against the slice: a corrupt offset makes the
/// affected value unreadable (`None`), it never reads outside the buffer.
///
/// ## Example
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use symdex_core::serialize::IndexSerializer;
/// use symdex_core::static_map::StaticMap;
///
/// let source = BTreeMap::from([(1u32, 2u32), (3u32, 6u32)]);
/// let bytes = source.serialize().unwrap();
///
/// let map = StaticMap::<u32, u32>::new(&bytes).unwrap();
/// assert_eq!(map.get(3), Some(6));
/// assert_eq!(map.get(2), None);
/// assert_eq!(map.upper_bound(1).key(), Some(3));
/// ```
pub struct StaticMap<'a, K, V>
{
    data: &'a [u8],
    count: usize,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for StaticMap<'_, K, V>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<K, V> Copy for StaticMap<'_, K, V> {}

impl<K, V> fmt::Debug for StaticMap<'_, K, V>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("StaticMap")
            .field("count", &self.count)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl<'a, K: MapKey, V: EntryView<'a>> StaticMap<'a, K, V>
{
    /// View the plain map at the start of `data`.
    ///
    /// `data` should end where the map ends: the last value extends to the end
    /// of the slice.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::MalformedBuffer`] if `data` is too short for the
    /// count, offset table and key array.
    pub fn new(data: &'a [u8]) -> IndexResult<Self>
    {
        let count = read_len(data, 0)
            .ok_or_else(|| IndexError::MalformedBuffer(format!("{} bytes is too short for a map header", data.len())))?;
        match header_size::<K>(count) {
            Some(header) if header <= data.len() => Ok(Self {
                data,
                count,
                _marker: PhantomData,
            }),
            _ => Err(IndexError::MalformedBuffer(format!(
                "{count} nodes do not fit in {} bytes",
                data.len()
            ))),
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.count
    }

    /// True when the map has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.count == 0
    }

    /// The bytes this view reads from.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8]
    {
        self.data
    }

    fn offset_at(&self, index: usize) -> Option<usize>
    {
        read_len(self.data, U32_SIZE + index * U32_SIZE)
    }

    /// Key of the `index`-th node.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<K>
    {
        if index >= self.count {
            return None;
        }
        let start = U32_SIZE + self.count * U32_SIZE + index * K::WIDTH;
        K::read_le(self.data.get(start..)?)
    }

    /// Raw value bytes of the `index`-th node.
    ///
    /// A value runs from its offset to the next node's offset; the last value
    /// runs to the end of the buffer.
    #[must_use]
    pub fn value_bytes_at(&self, index: usize) -> Option<&'a [u8]>
    {
        if index >= self.count {
            return None;
        }
        let start = self.offset_at(index)?;
        let end = if index + 1 < self.count {
            self.offset_at(index + 1)?
        } else {
            self.data.len()
        };
        self.data.get(start..end)
    }

    /// Decoded value of the `index`-th node.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<V>
    {
        V::from_entry_bytes(self.value_bytes_at(index)?)
    }

    /// Cursor at the first node.
    #[must_use]
    pub fn begin(&self) -> StaticMapCursor<'a, K, V>
    {
        self.cursor(0)
    }

    /// Cursor one past the last node.
    #[must_use]
    pub fn end(&self) -> StaticMapCursor<'a, K, V>
    {
        self.cursor(self.count)
    }

    fn cursor(&self, index: usize) -> StaticMapCursor<'a, K, V>
    {
        StaticMapCursor { map: *self, index }
    }

    /// Index of the first node whose key fails `before`.
    fn partition_point(&self, before: impl Fn(K) -> bool) -> usize
    {
        let (mut low, mut high) = (0, self.count);
        while low < high {
            let mid = low + (high - low) / 2;
            match self.key_at(mid) {
                Some(key) if before(key) => low = mid + 1,
                _ => high = mid,
            }
        }
        low
    }

    /// Cursor at the first node with key `>= key`, or [`Self::end`].
    #[must_use]
    pub fn lower_bound(&self, key: K) -> StaticMapCursor<'a, K, V>
    {
        self.cursor(self.partition_point(|candidate| candidate < key))
    }

    /// Cursor at the first node with key `> key`, or [`Self::end`].
    #[must_use]
    pub fn upper_bound(&self, key: K) -> StaticMapCursor<'a, K, V>
    {
        self.cursor(self.partition_point(|candidate| candidate <= key))
    }

    /// Cursor at the node with exactly `key`, or [`Self::end`].
    #[must_use]
    pub fn find(&self, key: K) -> StaticMapCursor<'a, K, V>
    {
        let cursor = self.lower_bound(key);
        if cursor.key() == Some(key) {
            cursor
        } else {
            self.end()
        }
    }

    /// Decoded value stored at exactly `key`.
    #[must_use]
    pub fn get(&self, key: K) -> Option<V>
    {
        self.find(key).value()
    }

    /// Nodes in ascending key order.
    ///
    /// Iteration stops early at the first node whose key or value cannot be read.
    #[must_use]
    pub fn iter(&self) -> StaticMapIter<'a, K, V>
    {
        StaticMapIter {
            map: *self,
            index: 0,
        }
    }

    /// Check the header against the buffer: offsets must point inside the
    /// value area in non-decreasing order and keys must be strictly ascending.
    ///
    /// Zero-length values (an empty string entry, say) legitimately share their
    /// offset with the next node, so equal neighbouring offsets are accepted.
    ///
    /// ## Errors
    ///
    /// Returns [`IndexError::MalformedBuffer`] describing the first problem found.
    pub fn validate_in_memory_structure(&self) -> IndexResult<()>
    {
        let result = self.check_structure();
        if let Err(err) = &result {
            warn!(error = %err, "static map failed validation");
        }
        result
    }

    fn check_structure(&self) -> IndexResult<()>
    {
        let malformed = |message: String| Err(IndexError::MalformedBuffer(message));
        let Some(header) = header_size::<K>(self.count) else {
            return malformed(format!("header for {} nodes overflows", self.count));
        };

        let mut previous_offset = header;
        for index in 0..self.count {
            let Some(offset) = self.offset_at(index) else {
                return malformed(format!("offset {index} is unreadable"));
            };
            if offset < previous_offset || offset > self.data.len() {
                return malformed(format!(
                    "offset {index} ({offset}) out of order or outside [{previous_offset}, {}]",
                    self.data.len()
                ));
            }
            previous_offset = offset;
        }

        let mut previous_key = None;
        for index in 0..self.count {
            let Some(key) = self.key_at(index) else {
                return malformed(format!("key {index} is unreadable"));
            };
            if previous_key.is_some_and(|previous| previous >= key) {
                return malformed(format!("key {index} ({key:?}) is not greater than its predecessor"));
            }
            previous_key = Some(key);
        }
        Ok(())
    }
}

/// Position in a [`StaticMap`]: a node index in `[0, len]`, where `len` is the end.
pub struct StaticMapCursor<'a, K, V>
{
    map: StaticMap<'a, K, V>,
    index: usize,
}

impl<K, V> Clone for StaticMapCursor<'_, K, V>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<K, V> Copy for StaticMapCursor<'_, K, V> {}

impl<K, V> PartialEq for StaticMapCursor<'_, K, V>
{
    fn eq(&self, other: &Self) -> bool
    {
        std::ptr::eq(self.map.data, other.map.data) && self.index == other.index
    }
}

impl<K, V> Eq for StaticMapCursor<'_, K, V> {}

impl<K, V> fmt::Debug for StaticMapCursor<'_, K, V>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("StaticMapCursor")
            .field("index", &self.index)
            .field("count", &self.map.count)
            .finish()
    }
}

impl<'a, K: MapKey, V: EntryView<'a>> StaticMapCursor<'a, K, V>
{
    /// Node index; equals the map's length at the end.
    #[must_use]
    pub fn index(&self) -> usize
    {
        self.index
    }

    /// True when past the last node.
    #[must_use]
    pub fn is_end(&self) -> bool
    {
        self.index >= self.map.count
    }

    /// Key under the cursor.
    #[must_use]
    pub fn key(&self) -> Option<K>
    {
        self.map.key_at(self.index)
    }

    /// Raw value bytes under the cursor.
    #[must_use]
    pub fn value_bytes(&self) -> Option<&'a [u8]>
    {
        self.map.value_bytes_at(self.index)
    }

    /// Decoded value under the cursor.
    #[must_use]
    pub fn value(&self) -> Option<V>
    {
        self.map.value_at(self.index)
    }

    /// Step forward, stopping at the end.
    pub fn advance(&mut self)
    {
        self.index = (self.index + 1).min(self.map.count);
    }

    /// Step back, stopping at the first node.
    pub fn retreat(&mut self)
    {
        self.index = self.index.saturating_sub(1);
    }
}

/// Iterator over `(key, value)` pairs of a [`StaticMap`].
pub struct StaticMapIter<'a, K, V>
{
    map: StaticMap<'a, K, V>,
    index: usize,
}

impl<'a, K: MapKey, V: EntryView<'a>> Iterator for StaticMapIter<'a, K, V>
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item>
    {
        let key = self.map.key_at(self.index)?;
        let value = self.map.value_at(self.index)?;
        self.index += 1;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        (0, Some(self.map.count.saturating_sub(self.index)))
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::BTreeMap;

    use super::*;
    use crate::serialize::IndexSerializer;

    fn sample() -> Vec<u8>
    {
        BTreeMap::from([(10u32, 100u32), (20, 200), (30, 300)]).serialize().unwrap()
    }

    #[test]
    fn test_bounds()
    {
        let bytes = sample();
        let map = StaticMap::<u32, u32>::new(&bytes).unwrap();

        assert_eq!(map.lower_bound(5).index(), 0);
        assert_eq!(map.lower_bound(10).index(), 0);
        assert_eq!(map.lower_bound(11).index(), 1);
        assert_eq!(map.upper_bound(10).index(), 1);
        assert_eq!(map.upper_bound(30).index(), 3);
        assert!(map.upper_bound(30).is_end());
        assert_eq!(map.find(20).value(), Some(200));
        assert_eq!(map.find(25), map.end());
    }

    #[test]
    fn test_cursor_clamps()
    {
        let bytes = sample();
        let map = StaticMap::<u32, u32>::new(&bytes).unwrap();

        let mut cursor = map.begin();
        cursor.retreat();
        assert_eq!(cursor.index(), 0);
        for _ in 0..10 {
            cursor.advance();
        }
        assert_eq!(cursor, map.end());
        assert_eq!(cursor.key(), None);
        cursor.retreat();
        assert_eq!(cursor.key(), Some(30));
    }

    #[test]
    fn test_iter_in_key_order()
    {
        let bytes = sample();
        let map = StaticMap::<u32, u32>::new(&bytes).unwrap();
        let pairs: Vec<(u32, u32)> = map.iter().collect();
        assert_eq!(pairs, vec![(10, 100), (20, 200), (30, 300)]);
    }

    #[test]
    fn test_new_rejects_truncated_header()
    {
        let bytes = sample();
        assert!(StaticMap::<u32, u32>::new(&bytes[..3]).is_err());
        // Count says three nodes but the key array is cut short
        assert!(StaticMap::<u32, u32>::new(&bytes[..20]).is_err());
    }
}
