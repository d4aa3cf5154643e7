//! Property-based tests for PrefixTreeMap.
//!
//! The tree is compared with a `BTreeMap<Vec<u8>, i32>`. Pre-order traversal
//! with ascending siblings visits paths in lexicographic order, so entries
//! of both must line up exactly.

use std::collections::BTreeMap;

use proptest::prelude::*;
use refgraph::collections::PrefixTreeMap;

// =============================================================================
// Strategy for generating test data
// =============================================================================

fn arbitrary_path() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 0..5)
}

#[derive(Debug, Clone)]
enum Operation {
    Insert(Vec<u8>, i32),
    Remove(Vec<u8>),
}

fn arbitrary_operations() -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(
        prop_oneof![
            2 => (arbitrary_path(), any::<i32>())
                .prop_map(|(path, value)| Operation::Insert(path, value)),
            1 => arbitrary_path().prop_map(Operation::Remove),
        ],
        0..60,
    )
}

fn build(operations: &[Operation]) -> (PrefixTreeMap<u8, i32>, BTreeMap<Vec<u8>, i32>) {
    let mut tree = PrefixTreeMap::new();
    let mut model = BTreeMap::new();
    for operation in operations {
        match operation {
            Operation::Insert(path, value) => {
                assert_eq!(tree.insert(path, *value), model.insert(path.clone(), *value));
            }
            Operation::Remove(path) => {
                assert_eq!(tree.remove(path), model.remove(path));
            }
        }
    }
    (tree, model)
}

// =============================================================================
// Insert-Get Law: tree.insert(p, v); tree.get(p) == Some(&v)
// =============================================================================

proptest! {
    #[test]
    fn prop_insert_get_law(
        operations in arbitrary_operations(),
        path in arbitrary_path(),
        value in any::<i32>()
    ) {
        let (mut tree, _) = build(&operations);
        tree.insert(&path, value);

        prop_assert_eq!(tree.get(&path), Some(&value));
        prop_assert!(tree.contains_key(&path));
    }
}

// =============================================================================
// Remove-Get Law: tree.remove(p); tree.get(p) == None
// =============================================================================

proptest! {
    #[test]
    fn prop_remove_get_law(operations in arbitrary_operations(), path in arbitrary_path()) {
        let (mut tree, model) = build(&operations);

        prop_assert_eq!(tree.remove(&path), model.get(&path).copied());
        prop_assert_eq!(tree.get(&path), None);
        prop_assert_eq!(tree.len(), model.len() - usize::from(model.contains_key(&path)));
    }
}

// =============================================================================
// Size Law: len() == number of entries reached by traversal
// =============================================================================

proptest! {
    #[test]
    fn prop_size_matches_traversal(operations in arbitrary_operations()) {
        let (tree, model) = build(&operations);

        prop_assert_eq!(tree.len(), model.len());
        prop_assert_eq!(tree.entries().len(), tree.len());
        prop_assert_eq!(tree.is_empty(), model.is_empty());
    }
}

proptest! {
    #[test]
    fn prop_entries_are_lexicographic(operations in arbitrary_operations()) {
        let (tree, model) = build(&operations);

        let entries: Vec<(Vec<u8>, i32)> = tree
            .entries()
            .into_iter()
            .map(|(path, value)| (path, *value))
            .collect();
        let expected: Vec<(Vec<u8>, i32)> = model.into_iter().collect();
        prop_assert_eq!(entries, expected);
    }
}

// =============================================================================
// Prefix queries
// =============================================================================

proptest! {
    #[test]
    fn prop_descendants_share_prefix(
        operations in arbitrary_operations(),
        prefix in arbitrary_path(),
    ) {
        let (tree, model) = build(&operations);

        let found: Vec<Vec<u8>> =
            tree.descendants(&prefix).into_iter().map(|(path, _)| path).collect();
        let expected: Vec<Vec<u8>> =
            model.keys().filter(|path| path.starts_with(&prefix)).cloned().collect();
        prop_assert_eq!(found, expected);
    }
}

proptest! {
    #[test]
    fn prop_ancestors_are_prefixes_farthest_first(
        operations in arbitrary_operations(),
        path in arbitrary_path()
    ) {
        let (tree, model) = build(&operations);

        let found: Vec<Vec<u8>> =
            tree.ancestors(&path).into_iter().map(|(prefix, _)| prefix).collect();
        let expected: Vec<Vec<u8>> = (0..=path.len())
            .map(|depth| path[..depth].to_vec())
            .filter(|prefix| model.contains_key(prefix))
            .collect();
        prop_assert_eq!(found, expected);
    }
}
