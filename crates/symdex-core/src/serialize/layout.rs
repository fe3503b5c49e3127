//! The plain map layout shared by every serialized structure.
//!
//! ```text
//! [u32 count][count x u32 value_offset][count x Key][values...]
//! ```
//!
//! Each offset is the distance in bytes from the start of this layout (the
//! `count` field) to the node's value. Nested layouts measure from their own
//! start, so a child map can be read with no knowledge of where it sits in the
//! enclosing buffer.

use super::bytes::{ByteWriter, U32_SIZE};
use crate::error::{IndexError, IndexResult};
use crate::types::MapKey;

/// Bytes taken by the count, offset table and key array for `count` nodes.
///
/// Returns `None` if the header size does not fit in `usize`.
pub(crate) fn header_size<K: MapKey>(count: usize) -> Option<usize>
{
    count.checked_mul(U32_SIZE + K::WIDTH)?.checked_add(U32_SIZE)
}

/// Total size of a layout whose values have the given sizes.
pub(crate) fn map_size<K: MapKey>(value_sizes: impl Iterator<Item = usize>) -> usize
{
    let (count, values) = value_sizes.fold((0usize, 0usize), |(count, total), size| (count + 1, total + size));
    header_size::<K>(count).unwrap_or(usize::MAX).saturating_add(values)
}

/// Write the count, offset table and key array of one plain layout.
///
/// `nodes` yields each key with the size of its value, in strictly ascending
/// key order. Returns the total size of the layout, values included, measured
/// from the writer's position on entry; the caller writes the values next.
pub(crate) fn write_map_header<K, I>(writer: &mut ByteWriter<'_>, nodes: I) -> IndexResult<usize>
where
    K: MapKey,
    I: ExactSizeIterator<Item = (K, usize)> + Clone,
{
    let count = nodes.len();
    let header = header_size::<K>(count)
        .ok_or_else(|| IndexError::LayoutOverflow(format!("header for {count} nodes overflows")))?;

    writer.put_len(count, "node count")?;
    let mut offset = header;
    for (_, size) in nodes.clone() {
        writer.put_len(offset, "value offset")?;
        offset = offset
            .checked_add(size)
            .ok_or_else(|| IndexError::LayoutOverflow("value area overflows".to_string()))?;
    }
    for (key, _) in nodes {
        writer.put_key(key)?;
    }
    Ok(offset)
}

/// Write one plain layout at the writer's current position.
///
/// `nodes` is walked twice (header, values) and must yield keys in strictly
/// ascending order. `value_size` must agree with what `write_value` produces
/// for the same node.
pub(crate) fn write_map<K, T, I>(
    writer: &mut ByteWriter<'_>,
    nodes: I,
    value_size: impl Fn(&T) -> usize,
    write_value: impl Fn(&T, &mut ByteWriter<'_>) -> IndexResult<()>,
) -> IndexResult<()>
where
    K: MapKey,
    I: ExactSizeIterator<Item = (K, T)> + Clone,
{
    let start = writer.position();
    let expected = write_map_header(writer, nodes.clone().map(|(key, value)| (key, value_size(&value))))?;
    for (_, value) in nodes {
        write_value(&value, writer)?;
    }

    let written = writer.position() - start;
    if written != expected {
        return Err(IndexError::SizeMismatch { expected, written });
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_header_size()
    {
        assert_eq!(header_size::<u32>(0), Some(4));
        assert_eq!(header_size::<u32>(2), Some(20));
        assert_eq!(header_size::<u64>(2), Some(28));
        assert_eq!(header_size::<u64>(usize::MAX), None);
    }

    #[test]
    fn test_map_size_counts_values()
    {
        assert_eq!(map_size::<u32>([4usize, 4].into_iter()), 28);
        assert_eq!(map_size::<u32>(std::iter::empty()), 4);
    }

    #[test]
    fn test_write_map_rejects_lying_value_size()
    {
        let mut buf = [0u8; 64];
        let mut writer = ByteWriter::new(&mut buf);
        let nodes = [(1u32, 2u32)].into_iter();
        let result = write_map(&mut writer, nodes, |_| 8, |v, w| w.put_u32(*v));
        assert_eq!(
            result,
            Err(IndexError::SizeMismatch {
                expected: 20,
                written: 16
            })
        );
    }
}
