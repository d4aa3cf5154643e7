//! Integration tests for sharing snapshots across threads.
//!
//! With the `arc` feature every snapshot is `Send + Sync`; readers on other
//! threads keep seeing their generation while a builder prepares the next.

#![cfg(feature = "arc")]

use std::sync::Arc;
use std::thread;

use refgraph::persistent::PersistentBidirectionalMap;
use refgraph::refs::{EntityTypeId, Relation};
use refgraph::storage::MutableEntityStorage;
use rstest::rstest;

const MODULE: EntityTypeId = EntityTypeId(1);
const CONTENT_ROOT: EntityTypeId = EntityTypeId(2);

#[rstest]
fn test_storage_snapshot_read_from_many_threads() {
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let roots: Vec<_> = (0..16).map(|_| builder.add_entity(CONTENT_ROOT)).collect();
    Relation::one_to_many(MODULE, CONTENT_ROOT)
        .children()
        .set(&mut builder, module, &roots)
        .unwrap();
    let snapshot = Arc::new(builder.to_snapshot());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let snapshot = Arc::clone(&snapshot);
            thread::spawn(move || {
                let relation = Relation::one_to_many(MODULE, CONTENT_ROOT);
                relation.children().get(&*snapshot, module).unwrap().count()
            })
        })
        .collect();

    builder.remove_entity(module).unwrap();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 16);
    }
}

#[rstest]
fn test_bidirectional_map_shared_across_threads() {
    let original: Arc<PersistentBidirectionalMap<u32, u32>> =
        Arc::new((0..100).map(|key| (key, key % 10)).collect());

    let handles: Vec<_> = (0..4u32)
        .map(|index| {
            let map = Arc::clone(&original);
            thread::spawn(move || {
                let mut builder = map.builder();
                builder.remove_value(&index);
                let next = builder.build();
                assert_eq!(next.len(), 90);
                assert_eq!(map.len(), 100);
                next
            })
        })
        .collect();

    for handle in handles {
        let next = handle.join().unwrap();
        assert!(!next.shares_storage_with(&original));
    }
    assert_eq!(original.keys_by_value(&0).len(), 10);
}
