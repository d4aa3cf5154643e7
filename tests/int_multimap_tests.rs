//! Unit tests for IntMultiMap and MutableIntMultiMap.

use refgraph::collections::{IntMultiMap, IntMultiMapRead, MutableIntMultiMap};
use rstest::rstest;

#[rstest]
fn test_add_all_appends_then_remove_clears() {
    let mut map = MutableIntMultiMap::new();
    map.add_all(1, [2]);
    map.add_all(1, [3]);
    assert_eq!(map.get(1), &[2, 3]);

    assert_eq!(map.remove(1), vec![2, 3]);
    assert!(map.get(1).is_empty());
    assert!(map.is_empty());
}

#[rstest]
fn test_unknown_key_reads_empty() {
    let map = MutableIntMultiMap::new();
    assert!(map.get(42).is_empty());
    assert_eq!(map.get_key(42), None);
    assert!(IntMultiMap::new().get(42).is_empty());
}

#[rstest]
fn test_value_moves_between_keys() {
    let mut map = MutableIntMultiMap::new();
    map.add_all(1, [10, 11]);
    map.add_all(2, [11, 12]);

    assert_eq!(map.get(1), &[10]);
    assert_eq!(map.get(2), &[11, 12]);
    assert_eq!(map.get_key(11), Some(2));
    assert!(map.check_consistency().is_ok());
}

#[rstest]
fn test_remove_single_value_keeps_order() {
    let mut map = MutableIntMultiMap::new();
    map.add_all(1, [5, 6, 7]);

    assert!(map.remove_value(1, 6));
    assert_eq!(map.get(1), &[5, 7]);
    assert!(!map.remove_value(1, 6));
    assert!(map.remove_value(1, 5));
    assert!(map.remove_value(1, 7));
    assert!(map.get(1).is_empty());
    assert_eq!(map.len(), 0);
}

#[rstest]
fn test_empty_add_all_does_not_create_key() {
    let mut map = MutableIntMultiMap::new();
    map.add_all(1, std::iter::empty());
    assert!(map.is_empty());
    assert_eq!(map.keys().count(), 0);
}

// =============================================================================
// Compaction
// =============================================================================

#[rstest]
fn test_to_immutable_equals_source_at_call_time() {
    let mut map = MutableIntMultiMap::new();
    map.add_all(3, [30, 31]);
    map.add_all(1, [10]);
    let snapshot = map.to_immutable();
    map.add_all(1, [30]);

    assert_eq!(snapshot.get(3), &[30, 31]);
    assert_eq!(snapshot.get(1), &[10]);
    assert_eq!(snapshot.get_key(30), Some(3));
    assert_eq!(snapshot.value_count(), 3);
    assert_eq!(map.get(1), &[10, 30]);
    assert!(snapshot.check_consistency().is_ok());
}

#[rstest]
fn test_to_mutable_edits_do_not_leak_back() {
    let mut source = MutableIntMultiMap::new();
    source.add_all(1, [1, 2, 3]);
    let snapshot = source.to_immutable();

    let mut edited = snapshot.to_mutable();
    assert_eq!(edited.get(1), &[1, 2, 3]);
    edited.remove(1);

    assert!(edited.get(1).is_empty());
    assert_eq!(snapshot.get(1), &[1, 2, 3]);
    assert_eq!(snapshot.len(), 1);
}
