//! Reference tables: one container per relation.
//!
//! | Cardinality            | Container                                         |
//! |------------------------|---------------------------------------------------|
//! | `OneToOne`             | [`IntBiMap`], child array id ↔ parent array id    |
//! | `OneToMany`            | [`IntMultiMap`], parent array id → child array ids |
//! | `OneToAbstractOne`     | [`PersistentBidirectionalMap`], child id → parent id |
//! | `OneToAbstractMany`    | [`PersistentBidirectionalMap`], child id → parent id |
//!
//! Concrete containers store array ids only; the class of each side is
//! implied by the relation. Abstract containers store whole [`EntityId`]s so
//! the class of a polymorphic child is kept.
//!
//! [`RefsTable`] is the snapshot and [`MutableRefsTable`] the builder.
//! Converting one into the other shares every container; a container is
//! copied the first time the builder writes to it. Reads are shared through
//! the [`RefsRead`] trait.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use super::{ConnectionId, ConnectionType, EntityId, EntityTypeId};
use crate::collections::{
    BidirectionalRead, IntBiMap, IntMultiMap, IntMultiMapRead, MutableIntBiMap, MutableIntMultiMap,
};
use crate::error::{ConsistencyError, ReferenceError};
use crate::persistent::{BidirectionalMapBuilder, PersistentBidirectionalMap};

// =============================================================================
// Children
// =============================================================================

/// Lazy sequence of child ids in insertion order.
///
/// Cloning the iterator restarts it from the current position, so a fresh
/// clone taken before iteration replays the whole sequence.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    inner: ChildrenInner<'a>,
}

#[derive(Debug, Clone)]
enum ChildrenInner<'a> {
    Concrete {
        child_type: EntityTypeId,
        array_ids: std::slice::Iter<'a, u32>,
    },
    Abstract(std::slice::Iter<'a, EntityId>),
}

impl<'a> Children<'a> {
    fn concrete(child_type: EntityTypeId, array_ids: &'a [u32]) -> Self {
        Self {
            inner: ChildrenInner::Concrete {
                child_type,
                array_ids: array_ids.iter(),
            },
        }
    }

    fn abstract_ids(ids: &'a [EntityId]) -> Self {
        Self {
            inner: ChildrenInner::Abstract(ids.iter()),
        }
    }

    /// An empty sequence.
    #[must_use]
    pub fn empty() -> Self {
        Self::abstract_ids(&[])
    }
}

impl Default for Children<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Iterator for Children<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            ChildrenInner::Concrete {
                child_type,
                array_ids,
            } => array_ids
                .next()
                .map(|&array_id| EntityId::new(*child_type, array_id)),
            ChildrenInner::Abstract(ids) => ids.next().copied(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            ChildrenInner::Concrete { array_ids, .. } => array_ids.size_hint(),
            ChildrenInner::Abstract(ids) => ids.size_hint(),
        }
    }
}

impl ExactSizeIterator for Children<'_> {}

// =============================================================================
// RefsRead
// =============================================================================

/// Borrowed container of one relation.
#[derive(Debug)]
pub enum RefsContainer<'a, M, A> {
    /// Container of a `OneToOne` relation.
    OneToOne(&'a IntBiMap),
    /// Container of a `OneToMany` relation.
    OneToMany(&'a M),
    /// Container of an abstract relation.
    Abstract(&'a A),
}

/// Read operations shared by [`RefsTable`] and [`MutableRefsTable`].
///
/// Implementors only expose their containers; every navigation method is
/// provided on top of [`RefsRead::container`].
pub trait RefsRead {
    /// Container type of `OneToMany` relations.
    type ManyContainer: IntMultiMapRead;
    /// Container type of abstract relations.
    type AbstractContainer: BidirectionalRead<EntityId, EntityId>;

    /// Returns the container of the relation, if it was ever written or
    /// declared.
    fn container(
        &self,
        connection: &ConnectionId,
    ) -> Option<RefsContainer<'_, Self::ManyContainer, Self::AbstractContainer>>;

    /// Returns the relations that own a container, in ascending order.
    fn connections(&self) -> Vec<ConnectionId>;

    /// Returns the child of `parent` in a single-child relation.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::WrongCardinality`] for a many-children
    /// relation and [`ReferenceError::UnexpectedEntityType`] if `parent` is
    /// not of the declared parent class.
    fn one_child(
        &self,
        connection: &ConnectionId,
        parent: EntityId,
    ) -> Result<Option<EntityId>, ReferenceError> {
        expect_single_child(connection)?;
        expect_parent_type(connection, parent)?;
        Ok(match self.container(connection) {
            Some(RefsContainer::OneToOne(map)) => map
                .get_key(parent.array_id())
                .map(|child| EntityId::new(connection.child_type(), child)),
            Some(RefsContainer::Abstract(map)) => map.keys_of(&parent).first().copied(),
            Some(RefsContainer::OneToMany(_)) | None => None,
        })
    }

    /// Returns the children of `parent` in a many-children relation.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::WrongCardinality`] for a single-child
    /// relation and [`ReferenceError::UnexpectedEntityType`] if `parent` is
    /// not of the declared parent class.
    fn children(
        &self,
        connection: &ConnectionId,
        parent: EntityId,
    ) -> Result<Children<'_>, ReferenceError> {
        expect_many_children(connection)?;
        expect_parent_type(connection, parent)?;
        Ok(match self.container(connection) {
            Some(RefsContainer::OneToMany(map)) => {
                Children::concrete(connection.child_type(), map.values_of(parent.array_id()))
            }
            Some(RefsContainer::Abstract(map)) => Children::abstract_ids(map.keys_of(&parent)),
            Some(RefsContainer::OneToOne(_)) | None => Children::empty(),
        })
    }

    /// Returns the parent of `child`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::UnexpectedEntityType`] if the relation is
    /// concrete and `child` is not of the declared child class.
    fn parent(
        &self,
        connection: &ConnectionId,
        child: EntityId,
    ) -> Result<Option<EntityId>, ReferenceError> {
        expect_child_type(connection, child)?;
        let parent_type = connection.parent_type();
        Ok(match self.container(connection) {
            Some(RefsContainer::OneToOne(map)) => map
                .get(child.array_id())
                .map(|parent| EntityId::new(parent_type, parent)),
            Some(RefsContainer::OneToMany(map)) => map
                .key_of(child.array_id())
                .map(|parent| EntityId::new(parent_type, parent)),
            Some(RefsContainer::Abstract(map)) => map.value_of(&child).copied(),
            None => None,
        })
    }

    /// Returns every relation in which `child` has a parent, with that
    /// parent.
    fn parent_refs_of_child(&self, child: EntityId) -> Vec<(ConnectionId, EntityId)> {
        self.connections()
            .into_iter()
            .filter(|connection| accepts_child(connection, child))
            .filter_map(|connection| {
                let parent = self.parent(&connection, child).ok().flatten()?;
                Some((connection, parent))
            })
            .collect()
    }

    /// Returns every relation in which `parent` has children, with those
    /// children.
    fn children_refs_of_parent(&self, parent: EntityId) -> Vec<(ConnectionId, Vec<EntityId>)> {
        self.connections()
            .into_iter()
            .filter(|connection| connection.parent_type() == parent.entity_type())
            .filter_map(|connection| {
                let children: Vec<EntityId> = if connection.connection_type().is_single_child() {
                    self.one_child(&connection, parent).ok().flatten().into_iter().collect()
                } else {
                    self.children(&connection, parent).ok()?.collect()
                };
                (!children.is_empty()).then_some((connection, children))
            })
            .collect()
    }

    /// Returns every `(parent, child)` pair of the relation.
    fn references(&self, connection: &ConnectionId) -> Vec<(EntityId, EntityId)> {
        let parent_type = connection.parent_type();
        let child_type = connection.child_type();
        match self.container(connection) {
            Some(RefsContainer::OneToOne(map)) => map
                .iter()
                .map(|(child, parent)| {
                    (
                        EntityId::new(parent_type, parent),
                        EntityId::new(child_type, child),
                    )
                })
                .collect(),
            Some(RefsContainer::OneToMany(map)) => map
                .keys()
                .flat_map(|parent| {
                    map.values_of(parent).iter().map(move |&child| {
                        (
                            EntityId::new(parent_type, parent),
                            EntityId::new(child_type, child),
                        )
                    })
                })
                .collect(),
            Some(RefsContainer::Abstract(map)) => map
                .bindings()
                .map(|(child, parent)| (*parent, *child))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Verifies every container of the table.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, tagged with its relation.
    fn assert_consistency(&self) -> Result<(), ConsistencyError> {
        for connection in self.connections() {
            let checked = match self.container(&connection) {
                Some(RefsContainer::OneToOne(map)) => map.check_consistency(),
                Some(RefsContainer::OneToMany(map)) => map.check_consistency(),
                Some(RefsContainer::Abstract(map)) => check_abstract(&connection, map),
                None => Ok(()),
            };
            checked.map_err(|error| error.in_connection(connection))?;
        }
        Ok(())
    }
}

fn check_abstract<A: BidirectionalRead<EntityId, EntityId>>(
    connection: &ConnectionId,
    map: &A,
) -> Result<(), ConsistencyError> {
    map.check_consistency()?;
    if connection.connection_type().is_single_child() && map.slot_count() > 0 {
        return Err(ConsistencyError::new(format!(
            "{} parents hold more than one child",
            map.slot_count()
        )));
    }
    match map
        .bindings()
        .find(|(_, parent)| parent.entity_type() != connection.parent_type())
    {
        Some((child, parent)) => Err(ConsistencyError::new(format!(
            "{child} refers to {parent} of the wrong class"
        ))),
        None => Ok(()),
    }
}

fn expect_single_child(connection: &ConnectionId) -> Result<(), ReferenceError> {
    if connection.connection_type().is_single_child() {
        Ok(())
    } else {
        Err(ReferenceError::WrongCardinality {
            connection: *connection,
            expected: "single-child",
        })
    }
}

fn expect_many_children(connection: &ConnectionId) -> Result<(), ReferenceError> {
    if connection.connection_type().is_single_child() {
        Err(ReferenceError::WrongCardinality {
            connection: *connection,
            expected: "many-children",
        })
    } else {
        Ok(())
    }
}

fn expect_parent_type(connection: &ConnectionId, parent: EntityId) -> Result<(), ReferenceError> {
    if parent.entity_type() == connection.parent_type() {
        Ok(())
    } else {
        Err(ReferenceError::UnexpectedEntityType {
            connection: *connection,
            entity: parent,
            expected: connection.parent_type(),
        })
    }
}

fn expect_child_type(connection: &ConnectionId, child: EntityId) -> Result<(), ReferenceError> {
    if accepts_child(connection, child) {
        Ok(())
    } else {
        Err(ReferenceError::UnexpectedEntityType {
            connection: *connection,
            entity: child,
            expected: connection.child_type(),
        })
    }
}

fn accepts_child(connection: &ConnectionId, child: EntityId) -> bool {
    connection.connection_type().is_abstract() || child.entity_type() == connection.child_type()
}

fn sorted(mut connections: Vec<ConnectionId>) -> Vec<ConnectionId> {
    connections.sort_unstable();
    connections
}

// =============================================================================
// RefsTable
// =============================================================================

/// Immutable snapshot of every relation's references.
#[derive(Debug, Clone, Default)]
pub struct RefsTable {
    one_to_one: FxHashMap<ConnectionId, IntBiMap>,
    one_to_many: FxHashMap<ConnectionId, IntMultiMap>,
    abstract_refs: FxHashMap<ConnectionId, PersistentBidirectionalMap<EntityId, EntityId>>,
}

impl RefsTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder sharing every container with this snapshot.
    #[must_use]
    pub fn to_builder(&self) -> MutableRefsTable {
        MutableRefsTable::from(self)
    }
}

impl RefsRead for RefsTable {
    type ManyContainer = IntMultiMap;
    type AbstractContainer = PersistentBidirectionalMap<EntityId, EntityId>;

    fn container(
        &self,
        connection: &ConnectionId,
    ) -> Option<RefsContainer<'_, Self::ManyContainer, Self::AbstractContainer>> {
        match connection.connection_type() {
            ConnectionType::OneToOne => {
                self.one_to_one.get(connection).map(RefsContainer::OneToOne)
            }
            ConnectionType::OneToMany => {
                self.one_to_many.get(connection).map(RefsContainer::OneToMany)
            }
            ConnectionType::OneToAbstractOne | ConnectionType::OneToAbstractMany => {
                self.abstract_refs.get(connection).map(RefsContainer::Abstract)
            }
        }
    }

    fn connections(&self) -> Vec<ConnectionId> {
        sorted(
            self.one_to_one
                .keys()
                .chain(self.one_to_many.keys())
                .chain(self.abstract_refs.keys())
                .copied()
                .collect(),
        )
    }
}

// =============================================================================
// MutableRefsTable
// =============================================================================

/// Builder over a [`RefsTable`].
#[derive(Debug, Default)]
pub struct MutableRefsTable {
    one_to_one: FxHashMap<ConnectionId, MutableIntBiMap>,
    one_to_many: FxHashMap<ConnectionId, MutableIntMultiMap>,
    abstract_refs: FxHashMap<ConnectionId, BidirectionalMapBuilder<EntityId, EntityId>>,
}

impl MutableRefsTable {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the container of the relation if it does not exist yet, so
    /// the relation shows up in [`RefsRead::connections`].
    pub fn declare(&mut self, connection: ConnectionId) {
        match connection.connection_type() {
            ConnectionType::OneToOne => {
                self.one_to_one.entry(connection).or_default();
            }
            ConnectionType::OneToMany => {
                self.one_to_many.entry(connection).or_default();
            }
            ConnectionType::OneToAbstractOne | ConnectionType::OneToAbstractMany => {
                self.abstract_refs.entry(connection).or_default();
            }
        }
    }

    fn bimap_mut(&mut self, connection: &ConnectionId) -> &mut MutableIntBiMap {
        self.one_to_one.entry(*connection).or_default()
    }

    fn multimap_mut(&mut self, connection: &ConnectionId) -> &mut MutableIntMultiMap {
        self.one_to_many.entry(*connection).or_default()
    }

    fn abstract_mut(
        &mut self,
        connection: &ConnectionId,
    ) -> &mut BidirectionalMapBuilder<EntityId, EntityId> {
        self.abstract_refs.entry(*connection).or_default()
    }

    /// Makes `child` the only child of `parent`, returning the previous one.
    ///
    /// A child that had another parent is detached from it first.
    ///
    /// # Errors
    ///
    /// Fails for many-children relations and for ids of the wrong class.
    pub fn replace_one_child(
        &mut self,
        connection: &ConnectionId,
        parent: EntityId,
        child: Option<EntityId>,
    ) -> Result<Option<EntityId>, ReferenceError> {
        expect_single_child(connection)?;
        expect_parent_type(connection, parent)?;
        if let Some(child) = child {
            expect_child_type(connection, child)?;
        }

        if connection.connection_type().is_abstract() {
            let map = self.abstract_mut(connection);
            let previous = map.keys_by_value(&parent).first().copied();
            if previous != child {
                map.remove_value(&parent);
                if let Some(child) = child {
                    map.set(child, parent);
                }
            }
            return Ok(previous);
        }

        let child_type = connection.child_type();
        let map = self.bimap_mut(connection);
        let previous = map.get_key(parent.array_id());
        let next = child.map(EntityId::array_id);
        if previous != next {
            map.remove_by_value(parent.array_id());
            if let Some(child) = next {
                map.remove(child);
                map.put(child, parent.array_id())?;
            }
        }
        Ok(previous.map(|child| EntityId::new(child_type, child)))
    }

    /// Makes `children` the children of `parent`, in order, and returns the
    /// previous children that are no longer attached to it.
    ///
    /// Children that belonged to another parent are moved.
    ///
    /// # Errors
    ///
    /// Fails for single-child relations and for ids of the wrong class.
    pub fn replace_children(
        &mut self,
        connection: &ConnectionId,
        parent: EntityId,
        children: &[EntityId],
    ) -> Result<Vec<EntityId>, ReferenceError> {
        expect_many_children(connection)?;
        expect_parent_type(connection, parent)?;
        for &child in children {
            expect_child_type(connection, child)?;
        }
        let kept: FxHashSet<EntityId> = children.iter().copied().collect();

        if connection.connection_type().is_abstract() {
            let map = self.abstract_mut(connection);
            let previous = map.remove_value(&parent);
            for &child in children {
                map.set(child, parent);
            }
            return Ok(previous
                .into_iter()
                .filter(|child| !kept.contains(child))
                .collect());
        }

        let child_type = connection.child_type();
        let map = self.multimap_mut(connection);
        let previous = map.remove(parent.array_id());
        map.add_all(parent.array_id(), children.iter().map(|child| child.array_id()));
        Ok(previous
            .into_iter()
            .map(|child| EntityId::new(child_type, child))
            .filter(|child| !kept.contains(child))
            .collect())
    }

    /// Attaches `child` to `parent`, or detaches it when `parent` is `None`,
    /// returning its previous parent.
    ///
    /// In single-child relations the previous child of `parent` is detached.
    ///
    /// # Errors
    ///
    /// Fails for ids of the wrong class.
    pub fn replace_parent(
        &mut self,
        connection: &ConnectionId,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<Option<EntityId>, ReferenceError> {
        expect_child_type(connection, child)?;
        if let Some(parent) = parent {
            expect_parent_type(connection, parent)?;
        }
        let parent_type = connection.parent_type();

        match connection.connection_type() {
            ConnectionType::OneToOne => {
                let map = self.bimap_mut(connection);
                let previous = map.get(child.array_id());
                let next = parent.map(EntityId::array_id);
                if previous != next {
                    map.remove(child.array_id());
                    if let Some(parent) = next {
                        map.remove_by_value(parent);
                        map.put(child.array_id(), parent)?;
                    }
                }
                Ok(previous.map(|parent| EntityId::new(parent_type, parent)))
            }
            ConnectionType::OneToMany => {
                let map = self.multimap_mut(connection);
                let previous = map.get_key(child.array_id());
                match parent {
                    Some(parent) => map.add_all(parent.array_id(), [child.array_id()]),
                    None => {
                        if let Some(old) = previous {
                            map.remove_value(old, child.array_id());
                        }
                    }
                }
                Ok(previous.map(|parent| EntityId::new(parent_type, parent)))
            }
            ConnectionType::OneToAbstractOne => {
                let map = self.abstract_mut(connection);
                let previous = map.get(&child).copied();
                if previous != parent {
                    match parent {
                        Some(parent) => {
                            map.remove_value(&parent);
                            map.set(child, parent);
                        }
                        None => {
                            map.remove(&child);
                        }
                    }
                }
                Ok(previous)
            }
            ConnectionType::OneToAbstractMany => {
                let map = self.abstract_mut(connection);
                let previous = match parent {
                    Some(parent) => map.set(child, parent),
                    None => map.remove(&child),
                };
                Ok(previous)
            }
        }
    }

    /// Detaches every child of `parent` in the relation and returns them.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is not of the declared parent class.
    pub fn remove_refs_by_parent(
        &mut self,
        connection: &ConnectionId,
        parent: EntityId,
    ) -> Result<Vec<EntityId>, ReferenceError> {
        expect_parent_type(connection, parent)?;
        let child_type = connection.child_type();
        let detached = match connection.connection_type() {
            ConnectionType::OneToOne => self
                .one_to_one
                .get_mut(connection)
                .and_then(|map| map.remove_by_value(parent.array_id()))
                .map(|child| EntityId::new(child_type, child))
                .into_iter()
                .collect(),
            ConnectionType::OneToMany => self
                .one_to_many
                .get_mut(connection)
                .map(|map| map.remove(parent.array_id()))
                .unwrap_or_default()
                .into_iter()
                .map(|child| EntityId::new(child_type, child))
                .collect(),
            ConnectionType::OneToAbstractOne | ConnectionType::OneToAbstractMany => self
                .abstract_refs
                .get_mut(connection)
                .map(|map| map.remove_value(&parent))
                .unwrap_or_default(),
        };
        Ok(detached)
    }

    /// Removes the single link `parent -> child`, returning `true` if it
    /// existed.
    ///
    /// # Errors
    ///
    /// Fails for ids of the wrong class.
    pub fn remove_parent_to_child_ref(
        &mut self,
        connection: &ConnectionId,
        parent: EntityId,
        child: EntityId,
    ) -> Result<bool, ReferenceError> {
        expect_parent_type(connection, parent)?;
        expect_child_type(connection, child)?;
        let removed = match connection.connection_type() {
            ConnectionType::OneToOne => match self.one_to_one.get_mut(connection) {
                Some(map) if map.get(child.array_id()) == Some(parent.array_id()) => {
                    map.remove(child.array_id()).is_some()
                }
                _ => false,
            },
            ConnectionType::OneToMany => self
                .one_to_many
                .get_mut(connection)
                .is_some_and(|map| map.remove_value(parent.array_id(), child.array_id())),
            ConnectionType::OneToAbstractOne | ConnectionType::OneToAbstractMany => {
                match self.abstract_refs.get_mut(connection) {
                    Some(map) if map.get(&child) == Some(&parent) => map.remove(&child).is_some(),
                    _ => false,
                }
            }
        };
        Ok(removed)
    }

    /// Drops every reference to and from `entity`, returning the children
    /// it leaves without a parent. Children are not removed.
    ///
    /// # Errors
    ///
    /// Propagates the errors of the removals it performs.
    pub fn remove_entity_refs(
        &mut self,
        entity: EntityId,
    ) -> Result<Vec<EntityId>, ReferenceError> {
        let mut detached = Vec::new();
        for connection in self.connections() {
            if connection.parent_type() == entity.entity_type() {
                detached.extend(self.remove_refs_by_parent(&connection, entity)?);
            }
            if accepts_child(&connection, entity) {
                if let Some(parent) = self.parent(&connection, entity)? {
                    self.remove_parent_to_child_ref(&connection, parent, entity)?;
                }
            }
        }
        Ok(detached)
    }

    /// Returns a snapshot of the current references.
    ///
    /// The builder stays usable; its next write to a container copies that
    /// container.
    #[must_use]
    pub fn to_immutable(&self) -> RefsTable {
        trace!(
            one_to_one = self.one_to_one.len(),
            one_to_many = self.one_to_many.len(),
            abstract_refs = self.abstract_refs.len(),
            "refs.table.to_immutable"
        );
        RefsTable {
            one_to_one: self
                .one_to_one
                .iter()
                .map(|(connection, map)| (*connection, map.to_immutable()))
                .collect(),
            one_to_many: self
                .one_to_many
                .iter()
                .map(|(connection, map)| (*connection, map.to_immutable()))
                .collect(),
            abstract_refs: self
                .abstract_refs
                .iter()
                .map(|(connection, map)| (*connection, map.snapshot()))
                .collect(),
        }
    }
}

impl From<&RefsTable> for MutableRefsTable {
    fn from(table: &RefsTable) -> Self {
        Self {
            one_to_one: table
                .one_to_one
                .iter()
                .map(|(connection, map)| (*connection, map.to_mutable()))
                .collect(),
            one_to_many: table
                .one_to_many
                .iter()
                .map(|(connection, map)| (*connection, map.to_mutable()))
                .collect(),
            abstract_refs: table
                .abstract_refs
                .iter()
                .map(|(connection, map)| (*connection, map.builder()))
                .collect(),
        }
    }
}

impl RefsRead for MutableRefsTable {
    type ManyContainer = MutableIntMultiMap;
    type AbstractContainer = BidirectionalMapBuilder<EntityId, EntityId>;

    fn container(
        &self,
        connection: &ConnectionId,
    ) -> Option<RefsContainer<'_, Self::ManyContainer, Self::AbstractContainer>> {
        match connection.connection_type() {
            ConnectionType::OneToOne => self
                .one_to_one
                .get(connection)
                .map(|map| RefsContainer::OneToOne(map.as_immutable())),
            ConnectionType::OneToMany => {
                self.one_to_many.get(connection).map(RefsContainer::OneToMany)
            }
            ConnectionType::OneToAbstractOne | ConnectionType::OneToAbstractMany => {
                self.abstract_refs.get(connection).map(RefsContainer::Abstract)
            }
        }
    }

    fn connections(&self) -> Vec<ConnectionId> {
        sorted(
            self.one_to_one
                .keys()
                .chain(self.one_to_many.keys())
                .chain(self.abstract_refs.keys())
                .copied()
                .collect(),
        )
    }
}
