//! Typed reference accessors.
//!
//! A [`Relation`] is declared once per reference site, typed by how many
//! children a parent may hold ([`One`] or [`Many`]). Its accessors navigate
//! the relation in any [`ReferenceStorage`]; reads work on snapshots and
//! builders alike, writes only on builders.
//!
//! The [`ConnectionId`] of a relation is resolved on first use and cached in
//! the relation.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::refs::{EntityTypeId, Relation};
//! use refgraph::storage::MutableEntityStorage;
//!
//! const MODULE: EntityTypeId = EntityTypeId(1);
//! const CONTENT_ROOT: EntityTypeId = EntityTypeId(2);
//!
//! let content_roots = Relation::one_to_many(MODULE, CONTENT_ROOT);
//!
//! let mut builder = MutableEntityStorage::new();
//! let module = builder.add_entity(MODULE);
//! let first = builder.add_entity(CONTENT_ROOT);
//! let second = builder.add_entity(CONTENT_ROOT);
//! content_roots.children().set(&mut builder, module, &[first, second]).unwrap();
//!
//! let snapshot = builder.to_snapshot();
//! let roots: Vec<_> = content_roots.children().get(&snapshot, module).unwrap().collect();
//! assert_eq!(roots, vec![first, second]);
//! assert_eq!(content_roots.parent().get(&snapshot, second).unwrap(), Some(module));
//! ```

use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;

use smallvec::SmallVec;

use super::{
    Children, ConnectionId, ConnectionRegistry, ConnectionType, EntityId, EntityTypeId, RefsRead,
};
use crate::error::{MissingRequiredReferenceError, ReferenceError, ReferenceSide};
use crate::storage::ReferenceStorage;

/// Marker for relations where a parent holds at most one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct One;

/// Marker for relations where a parent holds any number of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Many;

// =============================================================================
// Relation
// =============================================================================

/// Declaration of one parent/child relation.
///
/// Both ends are nullable unless declared otherwise.
pub struct Relation<C> {
    parent_type: EntityTypeId,
    child_type: EntityTypeId,
    connection_type: ConnectionType,
    parent_nullable: bool,
    child_nullable: bool,
    connection: OnceCell<ConnectionId>,
    cardinality: PhantomData<C>,
}

impl<C> Relation<C> {
    const fn declare(
        parent_type: EntityTypeId,
        child_type: EntityTypeId,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            parent_type,
            child_type,
            connection_type,
            parent_nullable: true,
            child_nullable: true,
            connection: OnceCell::new(),
            cardinality: PhantomData,
        }
    }

    /// Declares whether a child may exist without a parent.
    #[must_use]
    pub fn parent_nullable(self, parent_nullable: bool) -> Self {
        Self {
            parent_nullable,
            connection: OnceCell::new(),
            ..self
        }
    }

    /// Declares whether a parent may exist without a child.
    #[must_use]
    pub fn child_nullable(self, child_nullable: bool) -> Self {
        Self {
            child_nullable,
            connection: OnceCell::new(),
            ..self
        }
    }

    /// Returns the id of the relation, resolving it on first call.
    pub fn connection(&self) -> ConnectionId {
        *self.connection.get_or_init(|| {
            ConnectionId::new(
                self.parent_type,
                self.child_type,
                self.connection_type,
                self.parent_nullable,
                self.child_nullable,
            )
        })
    }

    /// Returns `true` once the id has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.connection.get().is_some()
    }

    /// Records the relation in a registry and returns its id.
    pub fn register(&self, registry: &mut ConnectionRegistry) -> ConnectionId {
        registry.register(self.connection())
    }

    /// Accessor from a child to its parent.
    #[must_use]
    pub const fn parent(&self) -> ParentAccessor<'_, C> {
        ParentAccessor { relation: self }
    }
}

impl Relation<One> {
    /// Declares a relation where a parent holds at most one child of
    /// `child_type`.
    #[must_use]
    pub const fn one_to_one(parent_type: EntityTypeId, child_type: EntityTypeId) -> Self {
        Self::declare(parent_type, child_type, ConnectionType::OneToOne)
    }

    /// Declares a relation where a parent holds at most one child of any
    /// subclass of `child_type`.
    #[must_use]
    pub const fn one_to_abstract_one(parent_type: EntityTypeId, child_type: EntityTypeId) -> Self {
        Self::declare(parent_type, child_type, ConnectionType::OneToAbstractOne)
    }

    /// Accessor from a parent to its child.
    #[must_use]
    pub const fn child(&self) -> OneChildAccessor<'_> {
        OneChildAccessor { relation: self }
    }
}

impl Relation<Many> {
    /// Declares a relation where a parent holds children of `child_type`.
    #[must_use]
    pub const fn one_to_many(parent_type: EntityTypeId, child_type: EntityTypeId) -> Self {
        Self::declare(parent_type, child_type, ConnectionType::OneToMany)
    }

    /// Declares a relation where a parent holds children of any subclass of
    /// `child_type`.
    #[must_use]
    pub const fn one_to_abstract_many(parent_type: EntityTypeId, child_type: EntityTypeId) -> Self {
        Self::declare(parent_type, child_type, ConnectionType::OneToAbstractMany)
    }

    /// Accessor from a parent to its children.
    #[must_use]
    pub const fn children(&self) -> ManyChildrenAccessor<'_> {
        ManyChildrenAccessor { relation: self }
    }
}

impl<C> fmt::Debug for Relation<C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Relation")
            .field("parent_type", &self.parent_type)
            .field("child_type", &self.child_type)
            .field("connection_type", &self.connection_type)
            .field("parent_nullable", &self.parent_nullable)
            .field("child_nullable", &self.child_nullable)
            .finish()
    }
}

// =============================================================================
// Accessors
// =============================================================================

/// Reads and writes the child of a parent in a [`One`] relation.
#[derive(Debug, Clone, Copy)]
pub struct OneChildAccessor<'r> {
    relation: &'r Relation<One>,
}

impl OneChildAccessor<'_> {
    /// Returns the child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MissingRequiredReference`] when the child
    /// end is not nullable and `parent` has no child.
    pub fn get<S: ReferenceStorage>(
        &self,
        storage: &S,
        parent: EntityId,
    ) -> Result<Option<EntityId>, ReferenceError> {
        let connection = self.relation.connection();
        let child = storage.refs().one_child(&connection, parent)?;
        if child.is_none() && !connection.is_child_nullable() {
            return Err(missing(connection, parent, ReferenceSide::Child));
        }
        Ok(child)
    }

    /// Returns the child of `parent`, failing when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MissingRequiredReference`] when `parent`
    /// has no child.
    pub fn require<S: ReferenceStorage>(
        &self,
        storage: &S,
        parent: EntityId,
    ) -> Result<EntityId, ReferenceError> {
        self.get(storage, parent)?.ok_or_else(|| {
            missing(self.relation.connection(), parent, ReferenceSide::Child)
        })
    }

    /// Replaces the child of `parent`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::NotModifiable`] on a snapshot or when an
    /// entity involved does not exist.
    pub fn set<S: ReferenceStorage>(
        &self,
        storage: &mut S,
        parent: EntityId,
        child: Option<EntityId>,
    ) -> Result<Option<EntityId>, ReferenceError> {
        let connection = self.relation.connection();
        let touched: SmallVec<[EntityId; 2]> =
            std::iter::once(parent).chain(child).collect();
        storage
            .modifiable(&touched)?
            .replace_one_child(&connection, parent, child)
    }
}

/// Reads and writes the children of a parent in a [`Many`] relation.
#[derive(Debug, Clone, Copy)]
pub struct ManyChildrenAccessor<'r> {
    relation: &'r Relation<Many>,
}

impl ManyChildrenAccessor<'_> {
    /// Returns the children of `parent` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::UnexpectedEntityType`] if `parent` is not of
    /// the declared parent class.
    pub fn get<'s, S: ReferenceStorage>(
        &self,
        storage: &'s S,
        parent: EntityId,
    ) -> Result<Children<'s>, ReferenceError> {
        storage.refs().children(&self.relation.connection(), parent)
    }

    /// Replaces the children of `parent`, returning the previous children
    /// no longer attached to it.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::NotModifiable`] on a snapshot or when an
    /// entity involved does not exist.
    pub fn set<S: ReferenceStorage>(
        &self,
        storage: &mut S,
        parent: EntityId,
        children: &[EntityId],
    ) -> Result<Vec<EntityId>, ReferenceError> {
        let connection = self.relation.connection();
        let touched: SmallVec<[EntityId; 8]> = std::iter::once(parent)
            .chain(children.iter().copied())
            .collect();
        storage
            .modifiable(&touched)?
            .replace_children(&connection, parent, children)
    }
}

/// Reads and writes the parent of a child.
pub struct ParentAccessor<'r, C> {
    relation: &'r Relation<C>,
}

impl<C> ParentAccessor<'_, C> {
    /// Returns the parent of `child`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MissingRequiredReference`] when the parent
    /// end is not nullable and `child` has no parent.
    pub fn get<S: ReferenceStorage>(
        &self,
        storage: &S,
        child: EntityId,
    ) -> Result<Option<EntityId>, ReferenceError> {
        let connection = self.relation.connection();
        let parent = storage.refs().parent(&connection, child)?;
        if parent.is_none() && !connection.is_parent_nullable() {
            return Err(missing(connection, child, ReferenceSide::Parent));
        }
        Ok(parent)
    }

    /// Attaches `child` to `parent`, or detaches it when `parent` is `None`,
    /// returning the previous parent.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::NotModifiable`] on a snapshot or when an
    /// entity involved does not exist.
    pub fn set<S: ReferenceStorage>(
        &self,
        storage: &mut S,
        child: EntityId,
        parent: Option<EntityId>,
    ) -> Result<Option<EntityId>, ReferenceError> {
        let connection = self.relation.connection();
        let touched: SmallVec<[EntityId; 2]> = std::iter::once(child).chain(parent).collect();
        storage
            .modifiable(&touched)?
            .replace_parent(&connection, child, parent)
    }
}

impl<C> Clone for ParentAccessor<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ParentAccessor<'_, C> {}

impl<C> fmt::Debug for ParentAccessor<'_, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ParentAccessor")
            .field("relation", self.relation)
            .finish()
    }
}

fn missing(connection: ConnectionId, entity: EntityId, side: ReferenceSide) -> ReferenceError {
    MissingRequiredReferenceError {
        connection,
        entity,
        side,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MODULE: EntityTypeId = EntityTypeId(1);
    const SDK: EntityTypeId = EntityTypeId(2);

    #[rstest]
    fn test_connection_is_resolved_lazily_once() {
        let relation = Relation::one_to_one(MODULE, SDK).child_nullable(false);
        assert!(!relation.is_resolved());

        let first = relation.connection();
        assert!(relation.is_resolved());
        assert_eq!(first, relation.connection());
        assert!(!first.is_child_nullable());
        assert!(first.is_parent_nullable());
    }

    #[rstest]
    fn test_equal_declarations_are_interchangeable() {
        let left = Relation::one_to_abstract_many(MODULE, SDK).parent_nullable(false);
        let right = Relation::one_to_abstract_many(MODULE, SDK).parent_nullable(false);
        assert_eq!(left.connection(), right.connection());

        let mut registry = ConnectionRegistry::new();
        left.register(&mut registry);
        right.register(&mut registry);
        assert_eq!(registry.len(), 1);
    }
}
