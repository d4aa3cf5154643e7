//! Storage-level reference invariants.

use super::ReferenceStorage;
use crate::error::ConsistencyError;
use crate::refs::{ConnectionType, RefsRead};

/// Verifies the references of a storage against its live entities.
///
/// On top of [`RefsRead::assert_consistency`] this checks that every
/// reference points at live entities, that every child of a concrete
/// relation with a non-nullable parent has one, and that every parent of a
/// one-to-one relation with a non-nullable child has one.
pub(crate) fn check_storage<S: ReferenceStorage>(storage: &S) -> Result<(), ConsistencyError> {
    let refs = storage.refs();
    refs.assert_consistency()?;

    for connection in refs.connections() {
        for (parent, child) in refs.references(&connection) {
            if let Some(dead) = [parent, child]
                .into_iter()
                .find(|entity| !storage.contains_entity(*entity))
            {
                return Err(ConsistencyError::new(format!(
                    "reference {parent} -> {child} points at removed entity {dead}"
                ))
                .in_connection(connection));
            }
        }

        if !connection.is_parent_nullable() && !connection.connection_type().is_abstract() {
            let orphan = storage
                .entities()
                .filter(|entity| entity.entity_type() == connection.child_type())
                .find(|&entity| matches!(refs.parent(&connection, entity), Ok(None)));
            if let Some(orphan) = orphan {
                return Err(
                    ConsistencyError::new(format!("{orphan} has no parent"))
                        .in_connection(connection),
                );
            }
        }

        if !connection.is_child_nullable()
            && connection.connection_type() == ConnectionType::OneToOne
        {
            let childless = storage
                .entities()
                .filter(|entity| entity.entity_type() == connection.parent_type())
                .find(|&entity| matches!(refs.one_child(&connection, entity), Ok(None)));
            if let Some(childless) = childless {
                return Err(
                    ConsistencyError::new(format!("{childless} has no child"))
                        .in_connection(connection),
                );
            }
        }
    }
    Ok(())
}
