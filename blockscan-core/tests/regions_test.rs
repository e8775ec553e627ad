// Integration tests for the read-only region store
mod utils;

use blockscan_core::engine::ir::Endianness;
use blockscan_core::runtime::context::AnalysisContext;
use blockscan_core::runtime::regions::RegionStore;
use utils::*;

fn is_sorted(store: &RegionStore) -> bool {
    store.regions().windows(2).all(|pair| pair[0].start < pair[1].start)
}

#[test]
fn test_order_holds_for_any_registration_sequence() {
    let starts: [u64; 12] = [
        0x5000, 0x1000, 0x9000, 0x1000, 0x3000, 0x7000, 0x2000, 0x9000, 0x8000, 0x0, 0x4000, 0x5000,
    ];
    let mut store = RegionStore::new();
    let mut distinct: Vec<u64> = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let before = store.len();
        assert!(store.register(*start, 4, vec![i as u8; 4]));
        if distinct.contains(start) {
            assert_eq!(store.len(), before, "re-registering 0x{:x} added a region", start);
        } else {
            distinct.push(*start);
        }
        assert!(is_sorted(&store), "unsorted after registering 0x{:x}", start);
    }
    assert_eq!(store.len(), distinct.len());
    // Latest registration wins.
    assert_eq!(store.load_value(0x5000, 1, Endianness::Little), Some(11));
    assert_eq!(store.load_value(0x9000, 1, Endianness::Little), Some(7));
}

#[test]
fn test_endian_correct_loads() {
    let ctx = context_with_region(0x1000, &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(ctx.load_value(0x1000, 4, Endianness::Little), Some(0x04030201));
    assert_eq!(ctx.load_value(0x1000, 4, Endianness::Big), Some(0x01020304));
    assert_eq!(ctx.load_value(0x1000, 2, Endianness::Little), Some(0x0201));
    assert_eq!(ctx.load_value(0x1000, 1, Endianness::Big), Some(0x01));
}

#[test]
fn test_odd_sized_loads() {
    let ctx = context_with_region(0x1000, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    assert_eq!(ctx.load_value(0x1000, 3, Endianness::Little), Some(0x030201));
    assert_eq!(ctx.load_value(0x1000, 3, Endianness::Big), Some(0x010203));
    assert_eq!(ctx.load_value(0x1001, 7, Endianness::Big), Some(0x02030405060708));
}

#[test]
fn test_wide_byte_loads() {
    let bytes: Vec<u8> = (0u8..16).collect();
    let ctx = context_with_region(0x2000, &bytes);
    let host = ctx.regions().load_bytes(0x2000, 16, Endianness::host()).unwrap();
    assert_eq!(host.as_slice(), bytes.as_slice());

    let swapped_order = if Endianness::host() == Endianness::Little {
        Endianness::Big
    } else {
        Endianness::Little
    };
    let swapped = ctx.regions().load_bytes(0x2000, 16, swapped_order).unwrap();
    let reversed: Vec<u8> = bytes.iter().rev().copied().collect();
    assert_eq!(swapped.as_slice(), reversed.as_slice());
}

#[test]
fn test_loads_between_regions() {
    let mut ctx = AnalysisContext::new();
    ctx.register_readonly_region(0x1000, 4, vec![1u8, 2, 3, 4]);
    ctx.register_readonly_region(0x3000, 4, vec![5u8, 6, 7, 8]);
    assert_eq!(ctx.load_value(0x1002, 2, Endianness::Big), Some(0x0304));
    assert_eq!(ctx.load_value(0x3000, 4, Endianness::Big), Some(0x05060708));
    assert_eq!(ctx.load_value(0x2000, 4, Endianness::Big), None);
    assert_eq!(ctx.load_value(0x1003, 2, Endianness::Big), None);
}

#[test]
fn test_region_capacity() {
    let mut store = RegionStore::with_capacity(3);
    for i in 0..3u64 {
        assert!(store.register(0x1000 * (i + 1), 1, vec![0u8]));
    }
    assert!(!store.register(0x8000, 1, vec![0u8]));
    // Full even for a start that already exists.
    assert!(!store.register(0x1000, 1, vec![1u8]));
    store.clear();
    assert!(store.is_empty());
    assert!(store.register(0x8000, 1, vec![0u8]));
}
