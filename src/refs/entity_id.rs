//! Compact entity identifiers.
//!
//! An [`EntityId`] packs the entity class ([`EntityTypeId`]) and the
//! per-class array index into one `u64`. Concrete reference containers only
//! store the array index; polymorphic containers store the whole id so the
//! concrete class of the other side stays recoverable.

use std::fmt;

/// Identifies one entity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityTypeId(pub u32);

impl fmt::Display for EntityTypeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Identifies one entity within a storage generation.
///
/// # Examples
///
/// ```rust
/// use refgraph::refs::{EntityId, EntityTypeId};
///
/// let id = EntityId::new(EntityTypeId(3), 17);
/// assert_eq!(id.entity_type(), EntityTypeId(3));
/// assert_eq!(id.array_id(), 17);
/// assert_eq!(EntityId::from_raw(id.raw()), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an id from its class and array index.
    #[inline]
    #[must_use]
    pub const fn new(entity_type: EntityTypeId, array_id: u32) -> Self {
        Self(((entity_type.0 as u64) << 32) | array_id as u64)
    }

    /// Reconstructs an id from its packed form.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the packed form.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the entity class.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn entity_type(self) -> EntityTypeId {
        EntityTypeId((self.0 >> 32) as u32)
    }

    /// Returns the index of the entity within its class.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn array_id(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.entity_type(), self.array_id())
    }
}
