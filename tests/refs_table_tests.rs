//! Integration tests for RefsTable and MutableRefsTable.

use refgraph::error::ReferenceError;
use refgraph::refs::{
    ConnectionId, ConnectionType, EntityId, EntityTypeId, MutableRefsTable, RefsRead, RefsTable,
};
use rstest::rstest;

const MODULE: EntityTypeId = EntityTypeId(1);
const ROOT: EntityTypeId = EntityTypeId(2);
const FACET: EntityTypeId = EntityTypeId(3);

fn module(array_id: u32) -> EntityId {
    EntityId::new(MODULE, array_id)
}

fn root(array_id: u32) -> EntityId {
    EntityId::new(ROOT, array_id)
}

fn connection(connection_type: ConnectionType) -> ConnectionId {
    ConnectionId::new(MODULE, ROOT, connection_type, true, true)
}

// =============================================================================
// Single-child relations
// =============================================================================

#[rstest]
#[case(ConnectionType::OneToOne)]
#[case(ConnectionType::OneToAbstractOne)]
fn test_replace_one_child_returns_previous(#[case] connection_type: ConnectionType) {
    let one = connection(connection_type);
    let mut table = MutableRefsTable::new();

    assert_eq!(table.replace_one_child(&one, module(0), Some(root(0))).unwrap(), None);
    assert_eq!(
        table.replace_one_child(&one, module(0), Some(root(1))).unwrap(),
        Some(root(0))
    );
    assert_eq!(table.one_child(&one, module(0)).unwrap(), Some(root(1)));
    assert_eq!(table.parent(&one, root(0)).unwrap(), None);
    assert_eq!(table.parent(&one, root(1)).unwrap(), Some(module(0)));
    assert!(table.assert_consistency().is_ok());
}

#[rstest]
#[case(ConnectionType::OneToOne)]
#[case(ConnectionType::OneToAbstractOne)]
fn test_child_moves_to_new_parent(#[case] connection_type: ConnectionType) {
    let one = connection(connection_type);
    let mut table = MutableRefsTable::new();
    table.replace_one_child(&one, module(0), Some(root(0))).unwrap();
    table.replace_one_child(&one, module(1), Some(root(0))).unwrap();

    assert_eq!(table.one_child(&one, module(0)).unwrap(), None);
    assert_eq!(table.one_child(&one, module(1)).unwrap(), Some(root(0)));
    assert!(table.assert_consistency().is_ok());
}

#[rstest]
#[case(ConnectionType::OneToOne)]
#[case(ConnectionType::OneToAbstractOne)]
fn test_replace_parent_on_single_child_relation(#[case] connection_type: ConnectionType) {
    let one = connection(connection_type);
    let mut table = MutableRefsTable::new();
    table.replace_one_child(&one, module(0), Some(root(0))).unwrap();

    assert_eq!(table.replace_parent(&one, root(1), Some(module(0))).unwrap(), None);
    assert_eq!(table.one_child(&one, module(0)).unwrap(), Some(root(1)));
    assert_eq!(table.parent(&one, root(0)).unwrap(), None);

    assert_eq!(table.replace_parent(&one, root(1), None).unwrap(), Some(module(0)));
    assert_eq!(table.one_child(&one, module(0)).unwrap(), None);
    assert!(table.assert_consistency().is_ok());
}

// =============================================================================
// Many-children relations
// =============================================================================

#[rstest]
#[case(ConnectionType::OneToMany)]
#[case(ConnectionType::OneToAbstractMany)]
fn test_replace_children_reports_dropped(#[case] connection_type: ConnectionType) {
    let many = connection(connection_type);
    let mut table = MutableRefsTable::new();
    table
        .replace_children(&many, module(0), &[root(0), root(1), root(2)])
        .unwrap();

    let dropped = table
        .replace_children(&many, module(0), &[root(2), root(3)])
        .unwrap();
    let children: Vec<EntityId> = table.children(&many, module(0)).unwrap().collect();

    assert_eq!(dropped, vec![root(0), root(1)]);
    assert_eq!(children, vec![root(2), root(3)]);
    assert_eq!(table.parent(&many, root(0)).unwrap(), None);
    assert!(table.assert_consistency().is_ok());
}

#[rstest]
#[case(ConnectionType::OneToMany)]
#[case(ConnectionType::OneToAbstractMany)]
fn test_children_move_between_parents(#[case] connection_type: ConnectionType) {
    let many = connection(connection_type);
    let mut table = MutableRefsTable::new();
    table.replace_children(&many, module(0), &[root(0), root(1)]).unwrap();
    table.replace_children(&many, module(1), &[root(1)]).unwrap();
    table.replace_parent(&many, root(0), Some(module(1))).unwrap();

    assert_eq!(table.children(&many, module(0)).unwrap().len(), 0);
    let moved: Vec<EntityId> = table.children(&many, module(1)).unwrap().collect();
    assert_eq!(moved, vec![root(1), root(0)]);
    assert!(table.assert_consistency().is_ok());
}

#[rstest]
#[case(ConnectionType::OneToMany)]
#[case(ConnectionType::OneToAbstractMany)]
fn test_remove_single_link(#[case] connection_type: ConnectionType) {
    let many = connection(connection_type);
    let mut table = MutableRefsTable::new();
    table.replace_children(&many, module(0), &[root(0), root(1)]).unwrap();

    assert!(!table.remove_parent_to_child_ref(&many, module(1), root(0)).unwrap());
    assert!(table.remove_parent_to_child_ref(&many, module(0), root(0)).unwrap());
    assert!(!table.remove_parent_to_child_ref(&many, module(0), root(0)).unwrap());

    let children: Vec<EntityId> = table.children(&many, module(0)).unwrap().collect();
    assert_eq!(children, vec![root(1)]);
}

#[rstest]
#[case(ConnectionType::OneToOne)]
#[case(ConnectionType::OneToMany)]
#[case(ConnectionType::OneToAbstractOne)]
#[case(ConnectionType::OneToAbstractMany)]
fn test_remove_refs_by_parent(#[case] connection_type: ConnectionType) {
    let relation = connection(connection_type);
    let mut table = MutableRefsTable::new();
    table.replace_parent(&relation, root(0), Some(module(0))).unwrap();

    assert_eq!(table.remove_refs_by_parent(&relation, module(0)).unwrap(), vec![root(0)]);
    assert_eq!(table.parent(&relation, root(0)).unwrap(), None);
    assert!(table.remove_refs_by_parent(&relation, module(0)).unwrap().is_empty());
}

// =============================================================================
// Cross-relation queries
// =============================================================================

#[rstest]
fn test_refs_of_entity_across_relations() {
    let one = connection(ConnectionType::OneToOne);
    let many = connection(ConnectionType::OneToMany);
    let facets = ConnectionId::new(ROOT, FACET, ConnectionType::OneToAbstractMany, true, true);
    let facet = EntityId::new(FACET, 0);
    let mut table = MutableRefsTable::new();
    table.replace_one_child(&one, module(0), Some(root(0))).unwrap();
    table.replace_children(&many, module(0), &[root(1), root(2)]).unwrap();
    table.replace_children(&facets, root(1), &[facet]).unwrap();

    let snapshot = table.to_immutable();
    assert_eq!(
        snapshot.children_refs_of_parent(module(0)),
        vec![(one, vec![root(0)]), (many, vec![root(1), root(2)])]
    );
    assert_eq!(snapshot.parent_refs_of_child(root(1)), vec![(many, module(0))]);
    assert_eq!(snapshot.parent_refs_of_child(facet), vec![(facets, root(1))]);
    assert_eq!(snapshot.connections(), vec![one, many, facets]);

    let mut references = snapshot.references(&many);
    references.sort();
    assert_eq!(references, vec![(module(0), root(1)), (module(0), root(2))]);
}

// =============================================================================
// Errors
// =============================================================================

#[rstest]
fn test_cardinality_is_enforced() {
    let one = connection(ConnectionType::OneToOne);
    let many = connection(ConnectionType::OneToMany);
    let mut table = MutableRefsTable::new();

    assert!(matches!(
        table.replace_children(&one, module(0), &[root(0)]),
        Err(ReferenceError::WrongCardinality { .. })
    ));
    assert!(matches!(
        table.replace_one_child(&many, module(0), Some(root(0))),
        Err(ReferenceError::WrongCardinality { .. })
    ));
    assert!(matches!(
        table.children(&one, module(0)),
        Err(ReferenceError::WrongCardinality { .. })
    ));
}

#[rstest]
fn test_parent_class_is_checked() {
    let many = connection(ConnectionType::OneToAbstractMany);
    let table = RefsTable::new();
    assert_eq!(
        table.children(&many, root(0)).unwrap_err(),
        ReferenceError::UnexpectedEntityType {
            connection: many,
            entity: root(0),
            expected: MODULE,
        }
    );
}

#[rstest]
fn test_unknown_relation_reads_empty() {
    let many = connection(ConnectionType::OneToMany);
    let table = RefsTable::new();
    assert_eq!(table.children(&many, module(0)).unwrap().len(), 0);
    assert_eq!(table.parent(&many, root(0)).unwrap(), None);
    assert!(table.references(&many).is_empty());
    assert!(table.connections().is_empty());
}

// =============================================================================
// Snapshot / builder isolation
// =============================================================================

#[rstest]
fn test_snapshot_survives_builder_writes() {
    let many = connection(ConnectionType::OneToMany);
    let abstract_many = connection(ConnectionType::OneToAbstractMany);
    let mut builder = MutableRefsTable::new();
    builder.replace_children(&many, module(0), &[root(0)]).unwrap();
    builder.replace_children(&abstract_many, module(0), &[root(0)]).unwrap();
    let snapshot = builder.to_immutable();

    builder.replace_children(&many, module(0), &[root(1)]).unwrap();
    builder.remove_refs_by_parent(&abstract_many, module(0)).unwrap();

    let old: Vec<EntityId> = snapshot.children(&many, module(0)).unwrap().collect();
    assert_eq!(old, vec![root(0)]);
    assert_eq!(snapshot.parent(&abstract_many, root(0)).unwrap(), Some(module(0)));
    assert_eq!(builder.parent(&abstract_many, root(0)).unwrap(), None);

    let rebuilt = MutableRefsTable::from(&snapshot);
    assert_eq!(rebuilt.parent(&many, root(0)).unwrap(), Some(module(0)));
    assert!(snapshot.assert_consistency().is_ok());
}
