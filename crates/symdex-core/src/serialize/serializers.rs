//! [`IndexSerializer`] implementations for every mutable structure.

use std::collections::BTreeMap;
use std::ops::Range;

use super::bytes::{ByteWriter, U32_SIZE};
use super::entry::SerializeEntry;
use super::layout::{map_size, write_map, write_map_header};
use super::IndexSerializer;
use crate::error::{IndexError, IndexResult};
use crate::maps::contained_range_map::Node;
use crate::maps::{AddressMap, ContainedRangeMap, RangeMap};
use crate::types::{MapKey, RangeAddress};

impl<K: MapKey, V: SerializeEntry> IndexSerializer for BTreeMap<K, V>
{
    fn size_of(&self) -> usize
    {
        map_size::<K>(self.values().map(SerializeEntry::serialized_size))
    }

    fn write_to(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        write_map(
            writer,
            self.iter().map(|(key, value)| (*key, value)),
            |value| value.serialized_size(),
            |value, writer| value.write_entry(writer),
        )
    }
}

impl<A: MapKey, E: SerializeEntry> IndexSerializer for AddressMap<A, E>
{
    fn size_of(&self) -> usize
    {
        map_size::<A>(self.stored().map(|(_, entry)| entry.serialized_size()))
    }

    fn write_to(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        write_map(
            writer,
            self.stored().map(|(address, entry)| (*address, entry)),
            |entry| entry.serialized_size(),
            |entry, writer| entry.write_entry(writer),
        )
    }
}

impl<A: RangeAddress, E: SerializeEntry> IndexSerializer for RangeMap<A, E>
{
    fn size_of(&self) -> usize
    {
        map_size::<A>(self.stored().map(|(_, range)| A::WIDTH + range.entry.serialized_size()))
    }

    fn write_to(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        write_map(
            writer,
            self.stored().map(|(high, range)| (*high, range)),
            |range| A::WIDTH + range.entry.serialized_size(),
            |range, writer| {
                writer.put_key(range.base)?;
                range.entry.write_entry(writer)
            },
        )
    }
}

/// The root carries no entry; it is written as `E::default()` so every node
/// has the same shape.
impl<A: RangeAddress, E: SerializeEntry + Default> IndexSerializer for ContainedRangeMap<A, E>
{
    fn size_of(&self) -> usize
    {
        TreeLayout::new(self.root()).total_size()
    }

    fn write_to(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        TreeLayout::new(self.root()).write(writer)
    }
}

/// Every node of a contained range map in breadth-first order, with the
/// serialized size of each node's subtree.
///
/// Breadth-first order keeps each node's children at consecutive indices
/// after it, so sizes are filled in one reverse pass and both walks use
/// explicit stacks however deep the tree is.
struct TreeLayout<'n, A, E>
{
    nodes: Vec<&'n Node<A, E>>,
    first_child: Vec<usize>,
    sizes: Vec<usize>,
}

impl<'n, A: RangeAddress, E: SerializeEntry + Default> TreeLayout<'n, A, E>
{
    fn new(root: &'n Node<A, E>) -> Self
    {
        let mut nodes = vec![root];
        let mut first_child = Vec::new();
        let mut index = 0;
        while let Some(&node) = nodes.get(index) {
            first_child.push(nodes.len());
            nodes.extend(node.children.values());
            index += 1;
        }

        let mut sizes = vec![0; nodes.len()];
        for index in (0..nodes.len()).rev() {
            let node = nodes[index];
            let children = first_child[index]..first_child[index] + node.children.len();
            let children_size = map_size::<A>(sizes[children].iter().copied());
            sizes[index] = (A::WIDTH + U32_SIZE + entry_size(node)).saturating_add(children_size);
        }

        Self {
            nodes,
            first_child,
            sizes,
        }
    }

    fn total_size(&self) -> usize
    {
        self.sizes[0]
    }

    fn children(&self, index: usize) -> Range<usize>
    {
        let first = self.first_child[index];
        first..first + self.nodes[index].children.len()
    }

    /// Emit nodes depth first: each node's header and child map header, then
    /// its children one after another.
    fn write(&self, writer: &mut ByteWriter<'_>) -> IndexResult<()>
    {
        let start = writer.position();
        let mut pending = vec![0];
        while let Some(index) = pending.pop() {
            let node = self.nodes[index];
            writer.put_key(node.base)?;
            match node.entry.as_deref() {
                Some(entry) => write_sized_entry(entry, writer)?,
                None => write_sized_entry(&E::default(), writer)?,
            }

            let children = self.children(index);
            let keyed_sizes = node
                .children
                .keys()
                .copied()
                .zip(self.sizes[children.clone()].iter().copied());
            write_map_header(writer, keyed_sizes)?;
            pending.extend(children.rev());
        }

        let written = writer.position() - start;
        if written != self.total_size() {
            return Err(IndexError::SizeMismatch {
                expected: self.total_size(),
                written,
            });
        }
        Ok(())
    }
}

fn entry_size<A, E: SerializeEntry + Default>(node: &Node<A, E>) -> usize
{
    match node.entry.as_deref() {
        Some(entry) => entry.serialized_size(),
        None => E::default().serialized_size(),
    }
}

fn write_sized_entry<E: SerializeEntry>(entry: &E, writer: &mut ByteWriter<'_>) -> IndexResult<()>
{
    writer.put_len(entry.serialized_size(), "entry size")?;
    entry.write_entry(writer)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_plain_map_layout_bytes()
    {
        let map = BTreeMap::from([(1u32, 2u32), (3u32, 6u32)]);
        let bytes = map.serialize().unwrap();
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        // count, offsets, keys, values
        assert_eq!(words, vec![2, 20, 24, 1, 3, 2, 6]);
    }

    #[test]
    fn test_range_map_layout_bytes()
    {
        let mut map = RangeMap::<u32, u32>::new();
        map.store_range(0x10, 0x10, 7u32).unwrap();
        let bytes = map.serialize().unwrap();
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        // count, offset, high key, then [base][entry]
        assert_eq!(words, vec![1, 12, 0x1f, 0x10, 7]);
    }

    #[test]
    fn test_empty_contained_root_is_sixteen_bytes()
    {
        let map = ContainedRangeMap::<u32, u32>::new();
        assert_eq!(map.size_of(), 16);
        let bytes = map.serialize().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_contained_child_layout_bytes()
    {
        let mut map = ContainedRangeMap::<u32, u32>::new();
        map.store_range(2, 7, 9u32).unwrap();
        let bytes = map.serialize().unwrap();
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(
            words,
            vec![
                0, 4, 0, // root base, entry size, placeholder entry
                1, 12, 8, // one child: offset 12, key = high 8
                2, 4, 9, 0, // child base, entry size, entry, no grandchildren
            ]
        );
    }

    #[test]
    fn test_tree_layout_sizes_match_nested_bytes()
    {
        let mut map = ContainedRangeMap::<u32, u32>::new();
        map.store_range(0, 100, 1u32).unwrap();
        map.store_range(10, 10, 2u32).unwrap();
        map.store_range(12, 2, 3u32).unwrap();
        map.store_range(50, 5, 4u32).unwrap();

        let layout = TreeLayout::new(map.root());
        assert_eq!(layout.nodes.len(), 5);
        // Leaves take base, entry size, entry and an empty child map
        assert_eq!(layout.sizes[4], 16);
        assert_eq!(layout.total_size(), map.serialize().unwrap().len());
    }

    #[test]
    fn test_write_into_short_buffer_fails()
    {
        let mut map = AddressMap::<u32, u32>::new();
        map.store(1, 2u32).unwrap();
        let size = map.size_of();
        let mut exact = vec![0u8; size];
        assert_eq!(map.write(&mut exact), Ok(size));

        let mut short = vec![0u8; size - 1];
        assert!(matches!(map.write(&mut short), Err(IndexError::BufferTooSmall { .. })));
    }
}
