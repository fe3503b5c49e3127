//! Randomized checks that serialized views answer exactly like the maps they came from

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use symdex_core::error::IndexError;
use symdex_core::maps::{AddressMap, ContainedRangeMap, RangeMap};
use symdex_core::serialize::IndexSerializer;
use symdex_core::static_map::{StaticAddressMap, StaticContainedRangeMap, StaticRangeMap};

const SEEDS: [u64; 4] = [1, 7, 0xdead_beef, 20_240_601];

/// Every seed once with no stores and once with `stores` attempts.
fn runs(stores: u32) -> impl Iterator<Item = (u64, u32)>
{
    SEEDS.into_iter().flat_map(move |seed| [(seed, 0), (seed, stores)])
}

/// Query addresses: random ones plus every stored boundary and its neighbours.
fn query_addresses(rng: &mut StdRng, limit: u32, boundaries: &[u32]) -> Vec<u32>
{
    let mut query_addresses: Vec<u32> = (0..500).map(|_| rng.gen_range(0..limit)).collect();
    for &boundary in boundaries {
        query_addresses.extend([boundary.saturating_sub(1), boundary, boundary.saturating_add(1)]);
    }
    query_addresses.extend([0, u32::MAX]);
    query_addresses
}

#[test]
fn test_address_map_round_trip()
{
    for (seed, stores) in runs(200) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut map = AddressMap::<u32, u64>::new();
        let mut stored = Vec::new();
        for _ in 0..stores {
            let address = rng.gen_range(0..100_000);
            if map.store(address, rng.gen::<u64>()).is_ok() {
                stored.push(address);
            }
        }

        let bytes = map.serialize().unwrap();
        assert_eq!(bytes.len(), map.size_of());
        let view = StaticAddressMap::<u32, u64>::new(&bytes).unwrap();
        view.validate_in_memory_structure().unwrap();
        assert_eq!(view.len(), map.len());

        for address in query_addresses(&mut rng, 110_000, &stored) {
            let expected = map.retrieve(address).map(|(entry, found)| (**entry, found));
            assert_eq!(view.retrieve(address), expected, "seed {seed} stores {stores} address {address}");
        }
    }
}

#[test]
fn test_range_map_round_trip()
{
    for (seed, stores) in runs(300) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut map = RangeMap::<u32, u32>::new();
        let mut boundaries = Vec::new();
        for entry in 0..stores {
            let base = rng.gen_range(0..1_000_000);
            let size = rng.gen_range(1..2_000);
            if map.store_range(base, size, entry).is_ok() {
                boundaries.extend([base, base + size - 1]);
            }
        }

        let bytes = map.serialize().unwrap();
        assert_eq!(bytes.len(), map.size_of());
        let view = StaticRangeMap::<u32, u32>::new(&bytes).unwrap();
        view.validate_in_memory_structure().unwrap();

        for address in query_addresses(&mut rng, 1_010_000, &boundaries) {
            let expected = map
                .retrieve_range(address)
                .map(|found| (**found.entry, found.base, found.size));
            let actual = view
                .retrieve_range(address)
                .map(|found| (found.entry, found.base, found.size));
            assert_eq!(actual, expected, "seed {seed} stores {stores} address {address}");

            let expected = map.retrieve_nearest_range(address).map(|found| found.base);
            let actual = view.retrieve_nearest_range(address).map(|found| found.base);
            assert_eq!(actual, expected, "seed {seed} nearest {address}");
        }

        for index in 0..=map.len() {
            let expected = map.retrieve_range_at_index(index).map(|found| (**found.entry, found.base));
            let actual = view.retrieve_range_at_index(index).map(|found| (found.entry, found.base));
            assert_eq!(actual, expected, "seed {seed} index {index}");
        }
    }
}

#[test]
fn test_contained_range_map_round_trip()
{
    for (seed, stores) in runs(400) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut map = ContainedRangeMap::<u32, u32>::new();
        let mut boundaries = Vec::new();
        for entry in 0..stores {
            // Mostly small ranges so many of them nest inside the larger ones
            let size = if rng.gen_bool(0.2) {
                rng.gen_range(1_000..50_000)
            } else {
                rng.gen_range(1..500)
            };
            let base = rng.gen_range(0..500_000);
            if map.store_range(base, size, entry).is_ok() {
                boundaries.extend([base, base + size - 1]);
            }
        }

        let bytes = map.serialize().unwrap();
        assert_eq!(bytes.len(), map.size_of());
        let view = StaticContainedRangeMap::<u32, u32>::new(&bytes).unwrap();
        view.validate_in_memory_structure().unwrap();

        for address in query_addresses(&mut rng, 560_000, &boundaries) {
            let expected: Vec<u32> = map.retrieve_ranges(address).into_iter().map(|entry| **entry).collect();
            let context = format!("seed {seed} stores {stores} address {address}");
            assert_eq!(view.retrieve_range(address), expected.first().copied(), "{context}");
            assert_eq!(view.retrieve_ranges(address).to_vec(), expected, "{context}");
        }
    }
}

#[test]
fn test_write_into_oversized_buffer_reports_end()
{
    let mut map = RangeMap::<u64, u32>::new();
    map.store_range(0x1000, 0x10, 1u32).unwrap();
    map.store_range(0x2000, 0x10, 2u32).unwrap();

    let size = map.size_of();
    let mut buffer = vec![0xaa; size + 16];
    assert_eq!(map.write(&mut buffer).unwrap(), size);
    assert!(buffer[size..].iter().all(|&byte| byte == 0xaa));

    let view = StaticRangeMap::<u64, u32>::new(&buffer[..size]).unwrap();
    assert_eq!(view.retrieve_range(0x2008).map(|found| found.entry), Some(2));
}

#[test]
fn test_empty_maps_serialize_to_bare_header()
{
    let addresses = AddressMap::<u32, u32>::new();
    let ranges = RangeMap::<u64, u32>::new();

    for (size, bytes) in [
        (addresses.size_of(), addresses.serialize().unwrap()),
        (ranges.size_of(), ranges.serialize().unwrap()),
    ] {
        assert_eq!(size, 4);
        assert_eq!(bytes, vec![0, 0, 0, 0]);
    }

    let mut buffer = [0xffu8; 8];
    assert_eq!(addresses.write(&mut buffer).unwrap(), 4);
    assert_eq!(ranges.write(&mut buffer).unwrap(), 4);
    assert_eq!(buffer[..4], [0, 0, 0, 0]);
}

#[test]
fn test_static_views_of_cleared_maps_find_nothing()
{
    let mut addresses = AddressMap::<u32, u32>::new();
    addresses.store(0x100, 1u32).unwrap();
    addresses.clear();
    let mut ranges = RangeMap::<u32, u32>::new();
    ranges.store_range(0x100, 0x10, 1u32).unwrap();
    ranges.clear();

    let address_bytes = addresses.serialize().unwrap();
    let range_bytes = ranges.serialize().unwrap();
    let address_view = StaticAddressMap::<u32, u32>::new(&address_bytes).unwrap();
    let range_view = StaticRangeMap::<u32, u32>::new(&range_bytes).unwrap();
    address_view.validate_in_memory_structure().unwrap();
    range_view.validate_in_memory_structure().unwrap();

    assert!(address_view.is_empty());
    assert!(range_view.is_empty());
    for address in [0, 0xff, 0x100, 0x108, u32::MAX] {
        assert_eq!(address_view.retrieve(address), None);
        assert!(range_view.retrieve_range(address).is_none());
        assert!(range_view.retrieve_nearest_range(address).is_none());
    }
    assert!(matches!(
        range_view.retrieve_range_at_index(0),
        Err(IndexError::IndexOutOfRange { index: 0, count: 0 })
    ));
}
