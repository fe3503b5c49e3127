//! Tests for the zero-copy views over serialized buffers

use std::collections::BTreeMap;
use std::thread;

use symdex_core::error::IndexError;
use symdex_core::maps::{ContainedRangeMap, RangeMap};
use symdex_core::serialize::IndexSerializer;
use symdex_core::static_map::{StaticContainedRangeMap, StaticMap, StaticRangeMap};

fn plain_map() -> Vec<u8>
{
    let map: BTreeMap<u32, u32> = [(10, 100), (20, 200), (30, 300)].into_iter().collect();
    map.serialize().unwrap()
}

#[test]
fn test_find_and_bounds()
{
    let bytes = plain_map();
    let map = StaticMap::<u32, u32>::new(&bytes).unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(map.get(20), Some(200));
    assert_eq!(map.get(25), None);
    assert!(map.find(25).is_end());
    assert_eq!(map.find(25), map.end());

    assert_eq!(map.lower_bound(20).key(), Some(20));
    assert_eq!(map.lower_bound(21).key(), Some(30));
    assert_eq!(map.upper_bound(20).key(), Some(30));
    assert_eq!(map.upper_bound(5).index(), 0);
    assert!(map.lower_bound(31).is_end());
    assert!(map.upper_bound(30).is_end());
}

#[test]
fn test_cursor_clamps_at_both_ends()
{
    let bytes = plain_map();
    let map = StaticMap::<u32, u32>::new(&bytes).unwrap();

    let mut cursor = map.begin();
    cursor.retreat();
    assert_eq!(cursor, map.begin());
    assert_eq!(cursor.value(), Some(100));

    cursor.advance();
    cursor.advance();
    assert_eq!(cursor.key(), Some(30));
    cursor.advance();
    assert!(cursor.is_end());
    assert_eq!(cursor.value(), None);
    cursor.advance();
    assert_eq!(cursor.index(), 3);

    cursor.retreat();
    assert_eq!(cursor.value(), Some(300));
}

#[test]
fn test_iteration_is_ascending()
{
    let bytes = plain_map();
    let map = StaticMap::<u32, u32>::new(&bytes).unwrap();
    let pairs: Vec<(u32, u32)> = map.iter().collect();
    assert_eq!(pairs, vec![(10, 100), (20, 200), (30, 300)]);
}

#[test]
fn test_short_buffers_are_rejected_at_construction()
{
    assert!(matches!(
        StaticMap::<u32, u32>::new(&[]),
        Err(IndexError::MalformedBuffer(_))
    ));
    assert!(StaticMap::<u32, u32>::new(&[1, 0]).is_err());

    // Claims a million nodes
    let lying = 1_000_000u32.to_le_bytes();
    assert!(StaticMap::<u32, u32>::new(&lying).is_err());
    assert!(StaticContainedRangeMap::<u32, u32>::new(&[0, 0, 0, 0, 4, 0, 0, 0]).is_err());
}

#[test]
fn test_corrupt_offsets_fail_validation_without_panicking()
{
    let mut bytes = plain_map();
    // Point the second offset past the end of the buffer
    bytes[8..12].copy_from_slice(&1000u32.to_le_bytes());

    let map = StaticMap::<u32, u32>::new(&bytes).unwrap();
    assert!(matches!(
        map.validate_in_memory_structure(),
        Err(IndexError::MalformedBuffer(_))
    ));
    assert_eq!(map.get(20), None);
    assert_eq!(map.get(10), None);
    assert_eq!(map.get(30), Some(300));
}

#[test]
fn test_unsorted_keys_fail_validation()
{
    let mut bytes = plain_map();
    // Swap the first two keys
    bytes[16..20].copy_from_slice(&20u32.to_le_bytes());
    bytes[20..24].copy_from_slice(&10u32.to_le_bytes());

    let map = StaticMap::<u32, u32>::new(&bytes).unwrap();
    assert!(map.validate_in_memory_structure().is_err());
}

#[test]
fn test_overlapping_serialized_ranges_fail_validation()
{
    let mut ranges = RangeMap::<u32, u32>::new();
    ranges.store_range(0x10, 0x10, 1u32).unwrap();
    ranges.store_range(0x20, 0x10, 2u32).unwrap();
    let mut bytes = ranges.serialize().unwrap();
    StaticRangeMap::<u32, u32>::new(&bytes)
        .unwrap()
        .validate_in_memory_structure()
        .unwrap();

    // Lower the second range's base into the first: header 4 + 2 * 4 + 2 * 4, then [base][entry]
    let second_base = 20 + 8;
    bytes[second_base..second_base + 4].copy_from_slice(&0x18u32.to_le_bytes());
    let view = StaticRangeMap::<u32, u32>::new(&bytes).unwrap();
    assert!(view.validate_in_memory_structure().is_err());
}

#[test]
fn test_static_range_at_index_and_nearest()
{
    let mut ranges = RangeMap::<u64, u64>::new();
    ranges.store_range(0x3000, 0x100, 3u64).unwrap();
    ranges.store_range(0x1000, 0x100, 1u64).unwrap();
    ranges.store_range(0x2000, 0x100, 2u64).unwrap();
    let bytes = ranges.serialize().unwrap();
    let view = StaticRangeMap::<u64, u64>::new(&bytes).unwrap();

    let bases: Vec<u64> = view.iter().map(|found| found.base).collect();
    assert_eq!(bases, vec![0x1000, 0x2000, 0x3000]);
    assert_eq!(view.retrieve_range_at_index(1).unwrap().entry, 2);
    assert_eq!(
        view.retrieve_range_at_index(3).map(|found| found.base),
        Err(IndexError::IndexOutOfRange { index: 3, count: 3 })
    );

    assert!(view.retrieve_range(0x2100).is_none());
    assert_eq!(view.retrieve_nearest_range(0x2100).map(|found| found.entry), Some(2));
    assert_eq!(view.retrieve_nearest_range(0xfff).map(|found| found.entry), None);
}

#[test]
fn test_string_entries_borrow_from_buffer()
{
    let mut ranges = RangeMap::<u32, String>::new();
    ranges.store_range(0x100, 0x10, "alpha".to_string()).unwrap();
    ranges.store_range(0x200, 0x10, String::new()).unwrap();
    ranges.store_range(0x300, 0x10, "gamma".to_string()).unwrap();
    let bytes = ranges.serialize().unwrap();
    drop(ranges);

    let view = StaticRangeMap::<u32, &str>::new(&bytes).unwrap();
    view.validate_in_memory_structure().unwrap();
    assert_eq!(view.retrieve_range(0x105).map(|found| found.entry), Some("alpha"));
    assert_eq!(view.retrieve_range(0x205).map(|found| found.entry), Some(""));
    assert_eq!(view.retrieve_range(0x30f).map(|found| found.entry), Some("gamma"));
}

#[test]
fn test_views_are_shared_across_threads()
{
    let mut tree = ContainedRangeMap::<u32, u32>::new();
    for function in 0..64u32 {
        let base = function * 0x100;
        tree.store_range(base, 0x100, function).unwrap();
        tree.store_range(base + 0x40, 0x10, 1000 + function).unwrap();
    }
    let bytes = tree.serialize().unwrap();
    let view = StaticContainedRangeMap::<u32, u32>::new(&bytes).unwrap();

    thread::scope(|scope| {
        for worker in 0..4u32 {
            scope.spawn(move || {
                for function in (worker..64).step_by(4) {
                    let base = function * 0x100;
                    assert_eq!(view.retrieve_range(base), Some(function));
                    assert_eq!(view.retrieve_range(base + 0x45), Some(1000 + function));
                    assert_eq!(view.retrieve_ranges(base + 0x45).to_vec(), vec![1000 + function, function]);
                }
            });
        }
    });
}
