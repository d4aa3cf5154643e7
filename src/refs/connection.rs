//! Relation descriptors.
//!
//! A [`ConnectionId`] names one parent-class/child-class relation together
//! with its cardinality and nullability. It is a small `Copy` value with
//! structural equality, so two descriptions of the same relation are
//! interchangeable wherever one is expected.

use std::fmt;

use rustc_hash::FxHashSet;

use super::EntityTypeId;

// =============================================================================
// ConnectionType
// =============================================================================

/// Cardinality of a relation.
///
/// The abstract variants accept a child of any class implementing the
/// declared base class, so the child class is not checked on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionType {
    /// One parent, at most one child, both of a concrete class.
    OneToOne,
    /// One parent, any number of children of a concrete class.
    OneToMany,
    /// One parent, at most one child of any subclass of the declared class.
    OneToAbstractOne,
    /// One parent, any number of children of any subclass of the declared class.
    OneToAbstractMany,
}

impl ConnectionType {
    /// Returns `true` if a parent holds at most one child.
    #[inline]
    #[must_use]
    pub const fn is_single_child(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToAbstractOne)
    }

    /// Returns `true` if the child class is resolved polymorphically.
    #[inline]
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::OneToAbstractOne | Self::OneToAbstractMany)
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::OneToAbstractOne => "one-to-abstract-one",
            Self::OneToAbstractMany => "one-to-abstract-many",
        };
        formatter.write_str(name)
    }
}

// =============================================================================
// ConnectionId
// =============================================================================

/// Identifies one relation kind.
///
/// # Examples
///
/// ```rust
/// use refgraph::refs::{ConnectionId, ConnectionType, EntityTypeId};
///
/// let first =
///     ConnectionId::new(EntityTypeId(1), EntityTypeId(2), ConnectionType::OneToMany, false, true);
/// let second =
///     ConnectionId::new(EntityTypeId(1), EntityTypeId(2), ConnectionType::OneToMany, false, true);
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionId {
    parent_type: EntityTypeId,
    child_type: EntityTypeId,
    connection_type: ConnectionType,
    parent_nullable: bool,
    child_nullable: bool,
}

impl ConnectionId {
    /// Creates a descriptor.
    ///
    /// `parent_nullable` tells whether a child may exist without a parent;
    /// `child_nullable` tells whether a parent may exist without a child.
    #[must_use]
    pub const fn new(
        parent_type: EntityTypeId,
        child_type: EntityTypeId,
        connection_type: ConnectionType,
        parent_nullable: bool,
        child_nullable: bool,
    ) -> Self {
        Self {
            parent_type,
            child_type,
            connection_type,
            parent_nullable,
            child_nullable,
        }
    }

    /// Returns the parent class.
    #[must_use]
    pub const fn parent_type(&self) -> EntityTypeId {
        self.parent_type
    }

    /// Returns the (base) child class.
    #[must_use]
    pub const fn child_type(&self) -> EntityTypeId {
        self.child_type
    }

    /// Returns the cardinality.
    #[must_use]
    pub const fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    /// Returns `true` if a child may exist without a parent.
    #[must_use]
    pub const fn is_parent_nullable(&self) -> bool {
        self.parent_nullable
    }

    /// Returns `true` if a parent may exist without a child.
    #[must_use]
    pub const fn is_child_nullable(&self) -> bool {
        self.child_nullable
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}{} -[{}]-> {}{}",
            self.parent_type,
            if self.parent_nullable { "?" } else { "" },
            self.connection_type,
            self.child_type,
            if self.child_nullable { "?" } else { "" },
        )
    }
}

// =============================================================================
// ConnectionRegistry
// =============================================================================

/// The set of declared relations, in declaration order.
///
/// Resolution is idempotent: resolving the same description twice yields
/// equal ids and records the relation once.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    declared: Vec<ConnectionId>,
    known: FxHashSet<ConnectionId>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a relation description to its id, recording it.
    pub fn resolve(
        &mut self,
        parent_type: EntityTypeId,
        child_type: EntityTypeId,
        connection_type: ConnectionType,
        parent_nullable: bool,
        child_nullable: bool,
    ) -> ConnectionId {
        self.register(ConnectionId::new(
            parent_type,
            child_type,
            connection_type,
            parent_nullable,
            child_nullable,
        ))
    }

    /// Records an already built id and returns it.
    pub fn register(&mut self, connection: ConnectionId) -> ConnectionId {
        if self.known.insert(connection) {
            self.declared.push(connection);
        }
        connection
    }

    /// Returns `true` if the relation was declared.
    #[must_use]
    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.known.contains(connection)
    }

    /// Returns the number of declared relations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Returns `true` if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Returns the declared relations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionId> {
        self.declared.iter()
    }

    /// Returns the relations whose parent class is `parent_type`.
    pub fn by_parent(&self, parent_type: EntityTypeId) -> impl Iterator<Item = &ConnectionId> {
        self.declared
            .iter()
            .filter(move |connection| connection.parent_type == parent_type)
    }
}

impl<'a> IntoIterator for &'a ConnectionRegistry {
    type Item = &'a ConnectionId;
    type IntoIter = std::slice::Iter<'a, ConnectionId>;

    fn into_iter(self) -> Self::IntoIter {
        self.declared.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MODULE: EntityTypeId = EntityTypeId(1);
    const ROOT: EntityTypeId = EntityTypeId(2);

    #[rstest]
    fn test_resolve_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        let first = registry.resolve(MODULE, ROOT, ConnectionType::OneToMany, false, true);
        let second = registry.resolve(MODULE, ROOT, ConnectionType::OneToMany, false, true);

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn test_nullability_distinguishes_relations() {
        let mut registry = ConnectionRegistry::new();
        registry.resolve(MODULE, ROOT, ConnectionType::OneToOne, false, true);
        registry.resolve(MODULE, ROOT, ConnectionType::OneToOne, true, true);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.by_parent(MODULE).count(), 2);
        assert_eq!(registry.by_parent(ROOT).count(), 0);
    }

    #[rstest]
    #[case(ConnectionType::OneToOne, true, false)]
    #[case(ConnectionType::OneToMany, false, false)]
    #[case(ConnectionType::OneToAbstractOne, true, true)]
    #[case(ConnectionType::OneToAbstractMany, false, true)]
    fn test_connection_type_classification(
        #[case] connection_type: ConnectionType,
        #[case] single_child: bool,
        #[case] is_abstract: bool,
    ) {
        assert_eq!(connection_type.is_single_child(), single_child);
        assert_eq!(connection_type.is_abstract(), is_abstract);
    }

    #[rstest]
    fn test_display() {
        let connection = ConnectionId::new(MODULE, ROOT, ConnectionType::OneToMany, false, true);
        assert_eq!(connection.to_string(), "#1 -[one-to-many]-> #2?");
    }
}
