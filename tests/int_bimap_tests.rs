//! Unit tests for IntBiMap and MutableIntBiMap.

use refgraph::collections::{IntBiMap, MutableIntBiMap};
use refgraph::error::{BindingConflict, DuplicateBindingError};
use rstest::rstest;

// =============================================================================
// Basic put / get
// =============================================================================

#[rstest]
fn test_put_then_lookup_both_directions() {
    let mut map = MutableIntBiMap::new();
    map.put(1, 2).unwrap();

    assert_eq!(map.get(1), Some(2));
    assert_eq!(map.get_key(2), Some(1));
    assert_eq!(map.get(2), None);
    assert_eq!(map.get_key(1), None);
}

#[rstest]
fn test_rebinding_key_is_rejected() {
    let mut map = MutableIntBiMap::new();
    map.put(1, 2).unwrap();

    let error = map.put(1, 3).unwrap_err();
    assert_eq!(
        error,
        DuplicateBindingError {
            key: 1,
            value: 3,
            conflict: BindingConflict::KeyBound(2),
        }
    );
    assert_eq!(map.get(1), Some(2));
    assert_eq!(map.get_key(3), None);
}

#[rstest]
fn test_rebinding_value_is_rejected() {
    let mut map = MutableIntBiMap::new();
    map.put(1, 2).unwrap();

    let error = map.put(5, 2).unwrap_err();
    assert_eq!(error.conflict, BindingConflict::ValueBound(1));
    assert_eq!(map.len(), 1);
}

#[rstest]
#[case(0, 0)]
#[case(7, 7)]
#[case(u32::MAX, 0)]
fn test_key_may_equal_value(#[case] key: u32, #[case] value: u32) {
    let mut map = MutableIntBiMap::new();
    map.put(key, value).unwrap();

    assert_eq!(map.get(key), Some(value));
    assert_eq!(map.get_key(value), Some(key));
}

// =============================================================================
// Removal
// =============================================================================

#[rstest]
fn test_removed_pair_can_be_rebound() {
    let mut map = MutableIntBiMap::new();
    map.put(1, 2).unwrap();
    assert_eq!(map.remove(1), Some(2));

    map.put(1, 3).unwrap();
    map.put(4, 2).unwrap();
    assert_eq!(map.get(1), Some(3));
    assert_eq!(map.get_key(2), Some(4));
}

#[rstest]
fn test_remove_unknown_is_noop() {
    let mut map = MutableIntBiMap::new();
    map.put(1, 2).unwrap();

    assert_eq!(map.remove(9), None);
    assert_eq!(map.remove_by_value(9), None);
    assert_eq!(map.len(), 1);
}

// =============================================================================
// Snapshots
// =============================================================================

#[rstest]
fn test_round_trip_preserves_contents() {
    let mut map = MutableIntBiMap::new();
    for key in 0..100 {
        map.put(key, key + 1000).unwrap();
    }
    let snapshot = map.to_immutable();
    let mut again = snapshot.to_mutable();
    again.remove(0);

    assert_eq!(snapshot.len(), 100);
    assert_eq!(again.len(), 99);
    assert_eq!(snapshot.get(0), Some(1000));
    assert_eq!(again.to_immutable().get(0), None);
    assert!(snapshot.check_consistency().is_ok());
}

#[rstest]
fn test_snapshots_compare_by_contents() {
    let mut left = MutableIntBiMap::new();
    let mut right = MutableIntBiMap::new();
    left.put(1, 2).unwrap();
    left.put(3, 4).unwrap();
    right.put(3, 4).unwrap();
    right.put(1, 2).unwrap();

    assert_eq!(left.to_immutable(), right.to_immutable());
    assert_ne!(left.to_immutable(), IntBiMap::new());
}
