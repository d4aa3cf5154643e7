//! Integration tests for the typed relation accessors.

use refgraph::error::{
    MissingRequiredReferenceError, NotModifiableError, ReferenceError, ReferenceSide,
};
use refgraph::refs::{ConnectionRegistry, ConnectionType, EntityTypeId, Relation};
use refgraph::storage::{EntityStorage, MutableEntityStorage};
use rstest::rstest;

const MODULE: EntityTypeId = EntityTypeId(1);
const SDK: EntityTypeId = EntityTypeId(2);
const CONTENT_ROOT: EntityTypeId = EntityTypeId(3);
const FACET: EntityTypeId = EntityTypeId(4);
const JAVA_FACET: EntityTypeId = EntityTypeId(5);

// =============================================================================
// Connection resolution
// =============================================================================

#[rstest]
fn test_connection_resolves_on_first_navigation() {
    let sdk = Relation::one_to_one(MODULE, SDK);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    assert!(!sdk.is_resolved());

    assert!(sdk.child().get(&builder, module).is_ok());
    assert!(sdk.is_resolved());

    let connection = sdk.connection();
    assert_eq!(connection.connection_type(), ConnectionType::OneToOne);
    assert_eq!(connection.parent_type(), MODULE);
    assert_eq!(connection.child_type(), SDK);
}

#[rstest]
fn test_registry_collects_relations_once() {
    let sdk = Relation::one_to_one(MODULE, SDK);
    let roots = Relation::one_to_many(MODULE, CONTENT_ROOT);
    let mut registry = ConnectionRegistry::new();

    sdk.register(&mut registry);
    roots.register(&mut registry);
    sdk.register(&mut registry);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.by_parent(MODULE).count(), 2);
    assert!(registry.contains(&roots.connection()));
}

// =============================================================================
// Reads and writes
// =============================================================================

#[rstest]
fn test_one_child_round_trip() {
    let sdk = Relation::one_to_one(MODULE, SDK);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let first = builder.add_entity(SDK);
    let second = builder.add_entity(SDK);

    assert_eq!(sdk.child().set(&mut builder, module, Some(first)).unwrap(), None);
    assert_eq!(sdk.child().set(&mut builder, module, Some(second)).unwrap(), Some(first));
    assert_eq!(sdk.child().get(&builder, module).unwrap(), Some(second));
    assert_eq!(sdk.parent().get(&builder, second).unwrap(), Some(module));
    assert_eq!(sdk.parent().get(&builder, first).unwrap(), None);

    assert_eq!(sdk.child().set(&mut builder, module, None).unwrap(), Some(second));
    assert_eq!(sdk.child().get(&builder, module).unwrap(), None);
}

#[rstest]
fn test_many_children_keep_insertion_order() {
    let roots = Relation::one_to_many(MODULE, CONTENT_ROOT);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let created: Vec<_> = (0..5).map(|_| builder.add_entity(CONTENT_ROOT)).collect();
    let reversed: Vec<_> = created.iter().rev().copied().collect();

    roots.children().set(&mut builder, module, &reversed).unwrap();
    let snapshot = builder.to_snapshot();

    let children: Vec<_> = roots.children().get(&snapshot, module).unwrap().collect();
    assert_eq!(children, reversed);
}

#[rstest]
fn test_parent_accessor_moves_child() {
    let roots = Relation::one_to_many(MODULE, CONTENT_ROOT);
    let mut builder = MutableEntityStorage::new();
    let left = builder.add_entity(MODULE);
    let right = builder.add_entity(MODULE);
    let root = builder.add_entity(CONTENT_ROOT);

    roots.parent().set(&mut builder, root, Some(left)).unwrap();
    assert_eq!(roots.parent().set(&mut builder, root, Some(right)).unwrap(), Some(left));

    assert_eq!(roots.children().get(&builder, left).unwrap().len(), 0);
    assert_eq!(roots.children().get(&builder, right).unwrap().len(), 1);
}

#[rstest]
fn test_abstract_children_accept_subclasses() {
    let facets = Relation::one_to_abstract_many(MODULE, FACET);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let facet = builder.add_entity(FACET);
    let java_facet = builder.add_entity(JAVA_FACET);

    facets.children().set(&mut builder, module, &[facet, java_facet]).unwrap();

    let children: Vec<_> = facets.children().get(&builder, module).unwrap().collect();
    assert_eq!(children, vec![facet, java_facet]);
    assert_eq!(facets.parent().get(&builder, java_facet).unwrap(), Some(module));
}

#[rstest]
fn test_abstract_one_child_replaced_and_moved() {
    let facet = Relation::one_to_abstract_one(MODULE, FACET).child_nullable(false);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let other = builder.add_entity(MODULE);
    let first = builder.add_entity(FACET);
    let second = builder.add_entity(JAVA_FACET);

    let missing = |entity| {
        Err(ReferenceError::MissingRequiredReference(MissingRequiredReferenceError {
            connection: facet.connection(),
            entity,
            side: ReferenceSide::Child,
        }))
    };
    assert_eq!(facet.child().get(&builder, module), missing(module));

    assert_eq!(facet.child().set(&mut builder, module, Some(first)), Ok(None));
    assert_eq!(facet.child().set(&mut builder, module, Some(second)), Ok(Some(first)));
    assert_eq!(facet.child().require(&builder, module), Ok(second));
    assert_eq!(facet.parent().get(&builder, first), Ok(None));

    assert_eq!(facet.child().set(&mut builder, other, Some(second)), Ok(None));
    assert_eq!(facet.child().get(&builder, module), missing(module));
    assert_eq!(facet.child().get(&builder, other), Ok(Some(second)));
    assert_eq!(facet.parent().get(&builder, second), Ok(Some(other)));

    let snapshot = builder.to_snapshot();
    builder.remove_entity(second).unwrap();
    assert_eq!(facet.child().get(&snapshot, other), Ok(Some(second)));
    assert_eq!(facet.child().get(&builder, other), missing(other));
}

// =============================================================================
// Errors
// =============================================================================

#[rstest]
fn test_required_child_missing() {
    let sdk = Relation::one_to_one(MODULE, SDK).child_nullable(false);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);

    let expected = ReferenceError::MissingRequiredReference(MissingRequiredReferenceError {
        connection: sdk.connection(),
        entity: module,
        side: ReferenceSide::Child,
    });
    assert_eq!(sdk.child().get(&builder, module), Err(expected));
    assert_eq!(sdk.child().require(&builder, module), Err(expected));
}

#[rstest]
fn test_required_parent_missing() {
    let roots = Relation::one_to_many(MODULE, CONTENT_ROOT).parent_nullable(false);
    let mut builder = MutableEntityStorage::new();
    let root = builder.add_entity(CONTENT_ROOT);

    assert!(matches!(
        roots.parent().get(&builder, root),
        Err(ReferenceError::MissingRequiredReference(MissingRequiredReferenceError {
            side: ReferenceSide::Parent,
            ..
        }))
    ));
}

#[rstest]
fn test_optional_child_may_be_absent() {
    let sdk = Relation::one_to_one(MODULE, SDK);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);

    assert_eq!(sdk.child().get(&builder, module), Ok(None));
    assert!(sdk.child().require(&builder, module).is_err());
}

#[rstest]
fn test_snapshot_rejects_every_write() {
    let sdk = Relation::one_to_one(MODULE, SDK);
    let roots = Relation::one_to_many(MODULE, CONTENT_ROOT);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let child = builder.add_entity(SDK);
    let root = builder.add_entity(CONTENT_ROOT);
    let mut snapshot: EntityStorage = builder.to_snapshot();

    let not_modifiable = ReferenceError::NotModifiable(NotModifiableError::Snapshot);
    assert_eq!(sdk.child().set(&mut snapshot, module, Some(child)), Err(not_modifiable));
    assert_eq!(roots.children().set(&mut snapshot, module, &[root]), Err(not_modifiable));
    assert_eq!(roots.parent().set(&mut snapshot, root, Some(module)), Err(not_modifiable));
    assert_eq!(sdk.child().get(&snapshot, module), Ok(None));
}

#[rstest]
fn test_wrong_class_is_rejected() {
    let sdk = Relation::one_to_one(MODULE, SDK);
    let mut builder = MutableEntityStorage::new();
    let module = builder.add_entity(MODULE);
    let other = builder.add_entity(MODULE);

    assert_eq!(
        sdk.child().set(&mut builder, module, Some(other)),
        Err(ReferenceError::UnexpectedEntityType {
            connection: sdk.connection(),
            entity: other,
            expected: SDK,
        })
    );
}
