//! Minimal entity storage scoping reference reads and writes.
//!
//! [`EntityStorage`] is an immutable snapshot: the live entities and a
//! [`RefsTable`]. [`MutableEntityStorage`] is the builder that produces the
//! next snapshot. Both implement [`ReferenceStorage`], the interface the
//! typed accessors navigate through; only the builder hands out a
//! [`MutableRefsTable`].
//!
//! # Examples
//!
//! ```rust
//! use refgraph::error::{NotModifiableError, ReferenceError};
//! use refgraph::refs::{EntityTypeId, Relation};
//! use refgraph::storage::MutableEntityStorage;
//!
//! const MODULE: EntityTypeId = EntityTypeId(1);
//! const SDK: EntityTypeId = EntityTypeId(2);
//! let sdk = Relation::one_to_one(MODULE, SDK);
//!
//! let mut builder = MutableEntityStorage::new();
//! let module = builder.add_entity(MODULE);
//! let first = builder.add_entity(SDK);
//! sdk.child().set(&mut builder, module, Some(first)).unwrap();
//! let mut snapshot = builder.to_snapshot();
//!
//! let second = builder.add_entity(SDK);
//! assert_eq!(
//!     sdk.child().set(&mut snapshot, module, Some(second)),
//!     Err(ReferenceError::NotModifiable(NotModifiableError::Snapshot))
//! );
//! assert_eq!(sdk.child().get(&snapshot, module).unwrap(), Some(first));
//! ```

mod config;
mod consistency;

pub use config::ConsistencyCheckingMode;
pub use config::StorageConfig;

use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::error::{ConsistencyError, NotModifiableError, ReferenceError};
use crate::persistent::{PersistentHashSet, TransientHashSet};
use crate::refs::{
    ConnectionId, ConnectionRegistry, EntityId, EntityTypeId, MutableRefsTable, RefsRead, RefsTable,
};

// =============================================================================
// ReferenceStorage
// =============================================================================

/// What reference accessors need from a storage.
pub trait ReferenceStorage {
    /// The reference table reads go through.
    type Refs: RefsRead;

    /// Returns the reference table.
    fn refs(&self) -> &Self::Refs;

    /// Returns `true` if the entity is live.
    fn contains_entity(&self, entity: EntityId) -> bool;

    /// Returns the live entities in unspecified order.
    fn entities(&self) -> impl Iterator<Item = EntityId> + '_;

    /// Returns the writable reference table for a write touching `touched`.
    ///
    /// # Errors
    ///
    /// Returns [`NotModifiableError::Snapshot`] when the storage is a
    /// snapshot and [`NotModifiableError::MissingEntity`] when one of the
    /// touched entities is not live.
    fn modifiable(
        &mut self,
        touched: &[EntityId],
    ) -> Result<&mut MutableRefsTable, NotModifiableError>;
}

// =============================================================================
// EntityStorage
// =============================================================================

/// Immutable snapshot of an entity storage.
#[derive(Debug, Clone, Default)]
pub struct EntityStorage {
    entities: PersistentHashSet<EntityId>,
    next_array_ids: FxHashMap<EntityTypeId, u32>,
    refs: RefsTable,
    config: StorageConfig,
    broken: Option<ConsistencyError>,
}

impl EntityStorage {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no live entities.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the configuration the snapshot was built with.
    #[must_use]
    pub const fn config(&self) -> StorageConfig {
        self.config
    }

    /// Returns `false` if strict checking found a violation when the
    /// snapshot was built.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.broken.is_none()
    }

    /// Returns the violation strict checking found, if any.
    #[must_use]
    pub const fn consistency_error(&self) -> Option<&ConsistencyError> {
        self.broken.as_ref()
    }

    /// Verifies the reference invariants now, whatever the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        consistency::check_storage(self)
    }

    /// Returns a builder starting from this snapshot.
    #[must_use]
    pub fn to_builder(&self) -> MutableEntityStorage {
        MutableEntityStorage {
            entities: self.entities.transient(),
            next_array_ids: self.next_array_ids.clone(),
            refs: self.refs.to_builder(),
            config: self.config,
        }
    }
}

impl ReferenceStorage for EntityStorage {
    type Refs = RefsTable;

    fn refs(&self) -> &Self::Refs {
        &self.refs
    }

    fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    fn modifiable(
        &mut self,
        touched: &[EntityId],
    ) -> Result<&mut MutableRefsTable, NotModifiableError> {
        debug!(touched = touched.len(), "storage.not_modifiable");
        Err(NotModifiableError::Snapshot)
    }
}

// =============================================================================
// MutableEntityStorage
// =============================================================================

/// Builder producing the next [`EntityStorage`].
#[derive(Debug, Default)]
pub struct MutableEntityStorage {
    entities: TransientHashSet<EntityId>,
    next_array_ids: FxHashMap<EntityTypeId, u32>,
    refs: MutableRefsTable,
    config: StorageConfig,
}

impl MutableEntityStorage {
    /// Creates an empty builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with the given configuration.
    #[must_use]
    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> StorageConfig {
        self.config
    }

    /// Returns the number of live entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if there are no live entities.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Declares a relation so its invariants are checked even before any
    /// reference is written.
    pub fn declare_connection(&mut self, connection: ConnectionId) {
        self.refs.declare(connection);
    }

    /// Declares every relation of the registry.
    pub fn declare(&mut self, registry: &ConnectionRegistry) {
        for connection in registry {
            self.refs.declare(*connection);
        }
    }

    /// Allocates a new live entity of the class.
    pub fn add_entity(&mut self, entity_type: EntityTypeId) -> EntityId {
        let next = self.next_array_ids.entry(entity_type).or_insert(0);
        let entity = EntityId::new(entity_type, *next);
        *next += 1;
        self.entities.insert(entity);
        entity
    }

    /// Removes an entity and every reference to and from it, returning the
    /// children it leaves without a parent. Nothing else is removed.
    ///
    /// # Errors
    ///
    /// Returns [`NotModifiableError::MissingEntity`] if the entity is not
    /// live.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<Vec<EntityId>, ReferenceError> {
        if !self.entities.contains(&entity) {
            debug!(%entity, "storage.not_modifiable");
            return Err(NotModifiableError::MissingEntity(entity).into());
        }
        let detached = self.refs.remove_entity_refs(entity)?;
        self.entities.remove(&entity);
        debug!(%entity, detached = detached.len(), "storage.remove_entity");
        Ok(detached)
    }

    /// Verifies the reference invariants of the builder now.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        consistency::check_storage(self)
    }

    /// Returns a snapshot of the current state; the builder stays usable.
    ///
    /// With [`ConsistencyCheckingMode::Strict`] the snapshot is checked; a
    /// violation is logged and recorded on the snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> EntityStorage {
        let mut snapshot = EntityStorage {
            entities: self.entities.to_persistent(),
            next_array_ids: self.next_array_ids.clone(),
            refs: self.refs.to_immutable(),
            config: self.config,
            broken: None,
        };
        if self.config.is_strict() {
            if let Err(violation) = consistency::check_storage(&snapshot) {
                error!(error = %violation, "storage.consistency.broken");
                snapshot.broken = Some(violation);
            }
        }
        debug!(
            entities = snapshot.len(),
            consistent = snapshot.is_consistent(),
            "storage.snapshot"
        );
        snapshot
    }
}

impl From<&EntityStorage> for MutableEntityStorage {
    fn from(snapshot: &EntityStorage) -> Self {
        snapshot.to_builder()
    }
}

impl ReferenceStorage for MutableEntityStorage {
    type Refs = MutableRefsTable;

    fn refs(&self) -> &Self::Refs {
        &self.refs
    }

    fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    fn modifiable(
        &mut self,
        touched: &[EntityId],
    ) -> Result<&mut MutableRefsTable, NotModifiableError> {
        if let Some(&missing) = touched.iter().find(|entity| !self.entities.contains(*entity)) {
            debug!(entity = %missing, "storage.not_modifiable");
            return Err(NotModifiableError::MissingEntity(missing));
        }
        Ok(&mut self.refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::Relation;
    use rstest::rstest;

    const MODULE: EntityTypeId = EntityTypeId(1);
    const ROOT: EntityTypeId = EntityTypeId(2);

    #[rstest]
    fn test_array_ids_are_allocated_per_class() {
        let mut builder = MutableEntityStorage::new();
        let first_module = builder.add_entity(MODULE);
        let first_root = builder.add_entity(ROOT);
        let second_module = builder.add_entity(MODULE);

        assert_eq!(first_module.array_id(), 0);
        assert_eq!(first_root.array_id(), 0);
        assert_eq!(second_module.array_id(), 1);
        assert_eq!(builder.len(), 3);
    }

    #[rstest]
    fn test_builder_from_snapshot_keeps_allocating_fresh_ids() {
        let mut builder = MutableEntityStorage::new();
        let first = builder.add_entity(MODULE);
        let mut next = builder.to_snapshot().to_builder();
        let second = next.add_entity(MODULE);

        assert_ne!(first, second);
        assert!(next.contains_entity(first));
    }

    #[rstest]
    fn test_write_to_removed_entity_is_rejected() {
        let roots = Relation::one_to_many(MODULE, ROOT);
        let mut builder = MutableEntityStorage::new();
        let module = builder.add_entity(MODULE);
        let root = builder.add_entity(ROOT);
        builder.remove_entity(root).unwrap();

        assert_eq!(
            roots.children().set(&mut builder, module, &[root]),
            Err(ReferenceError::NotModifiable(NotModifiableError::MissingEntity(root)))
        );
        assert_eq!(
            builder.remove_entity(root),
            Err(ReferenceError::NotModifiable(NotModifiableError::MissingEntity(root)))
        );
    }

    #[rstest]
    fn test_snapshot_is_checked_only_in_strict_mode() {
        let roots = Relation::one_to_many(MODULE, ROOT).parent_nullable(false);
        for (config, consistent) in [
            (StorageConfig::default(), true),
            (StorageConfig::strict(), false),
        ] {
            let mut builder = MutableEntityStorage::with_config(config);
            builder.declare_connection(roots.connection());
            builder.add_entity(ROOT);

            let snapshot = builder.to_snapshot();
            assert_eq!(snapshot.is_consistent(), consistent);
            assert!(snapshot.check_consistency().is_err());
        }
    }
}
