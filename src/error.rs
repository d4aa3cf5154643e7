//! Error types for the reference index.
//!
//! Structural violations are reported through these types and propagate to
//! the caller unchanged. Absent data is never an error: lookups return
//! `None` or an empty sequence instead.

use std::fmt;

use crate::refs::{ConnectionId, EntityId, EntityTypeId};

// =============================================================================
// DuplicateBindingError
// =============================================================================

/// Which side of a unique binding is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingConflict {
    /// The key is bound to this other value.
    KeyBound(u32),
    /// The value is bound to this other key.
    ValueBound(u32),
}

/// A unique bi-map `put` found the key or the value bound to a different
/// partner.
///
/// # Examples
///
/// ```rust
/// use refgraph::collections::MutableIntBiMap;
/// use refgraph::error::BindingConflict;
///
/// let mut map = MutableIntBiMap::new();
/// map.put(1, 2).unwrap();
/// let error = map.put(1, 3).unwrap_err();
/// assert_eq!(error.conflict, BindingConflict::KeyBound(2));
/// assert_eq!(error.to_string(), "cannot bind 1 -> 3: key 1 is already bound to 2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateBindingError {
    /// The key of the rejected binding.
    pub key: u32,
    /// The value of the rejected binding.
    pub value: u32,
    /// The existing binding that prevented it.
    pub conflict: BindingConflict,
}

impl fmt::Display for DuplicateBindingError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.conflict {
            BindingConflict::KeyBound(existing) => write!(
                formatter,
                "cannot bind {} -> {}: key {} is already bound to {existing}",
                self.key, self.value, self.key
            ),
            BindingConflict::ValueBound(existing) => write!(
                formatter,
                "cannot bind {} -> {}: value {} is already bound to {existing}",
                self.key, self.value, self.value
            ),
        }
    }
}

impl std::error::Error for DuplicateBindingError {}

// =============================================================================
// NotModifiableError
// =============================================================================

/// A write was attempted where none is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotModifiableError {
    /// The target is an immutable snapshot.
    Snapshot,
    /// The entity does not exist in the builder.
    MissingEntity(EntityId),
}

impl fmt::Display for NotModifiableError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => formatter.write_str("storage snapshot is not modifiable"),
            Self::MissingEntity(entity) => {
                write!(formatter, "entity {entity} does not exist in the builder")
            }
        }
    }
}

impl std::error::Error for NotModifiableError {}

// =============================================================================
// MissingRequiredReferenceError
// =============================================================================

/// Which end of a relation a read was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSide {
    /// The parent of a child.
    Parent,
    /// The child of a parent.
    Child,
}

impl fmt::Display for ReferenceSide {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Parent => "parent",
            Self::Child => "child",
        })
    }
}

/// A non-nullable reference has no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingRequiredReferenceError {
    /// The relation that was read.
    pub connection: ConnectionId,
    /// The entity whose reference is missing.
    pub entity: EntityId,
    /// The end that was missing.
    pub side: ReferenceSide,
}

impl fmt::Display for MissingRequiredReferenceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "entity {} has no {} in required relation {}",
            self.entity, self.side, self.connection
        )
    }
}

impl std::error::Error for MissingRequiredReferenceError {}

// =============================================================================
// ReferenceError
// =============================================================================

/// Errors raised by reference reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceError {
    /// The write target is not modifiable.
    NotModifiable(NotModifiableError),
    /// A non-nullable reference has no target.
    MissingRequiredReference(MissingRequiredReferenceError),
    /// A unique binding was violated.
    DuplicateBinding(DuplicateBindingError),
    /// The operation does not apply to the relation's cardinality.
    WrongCardinality {
        /// The relation used.
        connection: ConnectionId,
        /// The cardinality the operation needs.
        expected: &'static str,
    },
    /// The entity is not of the class the relation declares.
    UnexpectedEntityType {
        /// The relation used.
        connection: ConnectionId,
        /// The offending entity.
        entity: EntityId,
        /// The declared class.
        expected: EntityTypeId,
    },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotModifiable(error) => write!(formatter, "{error}"),
            Self::MissingRequiredReference(error) => write!(formatter, "{error}"),
            Self::DuplicateBinding(error) => write!(formatter, "{error}"),
            Self::WrongCardinality {
                connection,
                expected,
            } => write!(
                formatter,
                "relation {connection} does not support {expected} access"
            ),
            Self::UnexpectedEntityType {
                connection,
                entity,
                expected,
            } => write!(
                formatter,
                "entity {entity} is not of class {expected} required by {connection}"
            ),
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotModifiable(error) => Some(error),
            Self::MissingRequiredReference(error) => Some(error),
            Self::DuplicateBinding(error) => Some(error),
            Self::WrongCardinality { .. } | Self::UnexpectedEntityType { .. } => None,
        }
    }
}

impl From<NotModifiableError> for ReferenceError {
    fn from(error: NotModifiableError) -> Self {
        Self::NotModifiable(error)
    }
}

impl From<MissingRequiredReferenceError> for ReferenceError {
    fn from(error: MissingRequiredReferenceError) -> Self {
        Self::MissingRequiredReference(error)
    }
}

impl From<DuplicateBindingError> for ReferenceError {
    fn from(error: DuplicateBindingError) -> Self {
        Self::DuplicateBinding(error)
    }
}

// =============================================================================
// ConsistencyError
// =============================================================================

/// An internal invariant of the index does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyError {
    /// The relation the violation was found in, if any.
    pub connection: Option<ConnectionId>,
    /// What was found.
    pub message: String,
}

impl ConsistencyError {
    /// Creates an error not tied to a relation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            connection: None,
            message: message.into(),
        }
    }

    /// Attaches the relation the violation was found in.
    #[must_use]
    pub fn in_connection(mut self, connection: ConnectionId) -> Self {
        self.connection = Some(connection);
        self
    }
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.connection {
            Some(connection) => write!(formatter, "{connection}: {}", self.message),
            None => formatter.write_str(&self.message),
        }
    }
}

impl std::error::Error for ConsistencyError {}
