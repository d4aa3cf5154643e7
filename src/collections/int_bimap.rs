//! Unique integer bi-map.
//!
//! Every key is bound to at most one value and every value to at most one
//! key. [`MutableIntBiMap::put`] refuses to repoint an existing binding: a
//! one-to-one relation must never orphan its previous link silently.
//!
//! [`IntBiMap`] is the read-only form. Both forms keep their two tables
//! behind a [`ReferenceCounter`], so [`IntBiMap::to_mutable`] and
//! [`MutableIntBiMap::to_immutable`] are O(1) and the first write after
//! either call copies the table it touches.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::collections::MutableIntBiMap;
//!
//! let mut map = MutableIntBiMap::new();
//! map.put(1, 2).unwrap();
//! assert_eq!(map.get(1), Some(2));
//! assert_eq!(map.get_key(2), Some(1));
//! assert!(map.put(1, 3).is_err());
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{BindingConflict, ConsistencyError, DuplicateBindingError};
use crate::persistent::ReferenceCounter;

// =============================================================================
// IntBiMap
// =============================================================================

/// Read-only unique integer bi-map.
#[derive(Clone, Default)]
pub struct IntBiMap {
    key_to_value: ReferenceCounter<FxHashMap<u32, u32>>,
    value_to_key: ReferenceCounter<FxHashMap<u32, u32>>,
}

impl IntBiMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bindings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.key_to_value.len()
    }

    /// Returns `true` if there are no bindings.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_to_value.is_empty()
    }

    /// Returns the value bound to the key.
    #[inline]
    #[must_use]
    pub fn get(&self, key: u32) -> Option<u32> {
        self.key_to_value.get(&key).copied()
    }

    /// Returns the key bound to the value.
    #[inline]
    #[must_use]
    pub fn get_key(&self, value: u32) -> Option<u32> {
        self.value_to_key.get(&value).copied()
    }

    /// Returns `true` if the key is bound.
    #[must_use]
    pub fn contains_key(&self, key: u32) -> bool {
        self.key_to_value.contains_key(&key)
    }

    /// Returns `true` if the value is bound.
    #[must_use]
    pub fn contains_value(&self, value: u32) -> bool {
        self.value_to_key.contains_key(&value)
    }

    /// Returns the bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.key_to_value.iter().map(|(&key, &value)| (key, value))
    }

    /// Returns a mutable map starting from these bindings.
    #[must_use]
    pub fn to_mutable(&self) -> MutableIntBiMap {
        MutableIntBiMap { map: self.clone() }
    }

    /// Verifies that both directions describe the same bindings.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        if self.key_to_value.len() != self.value_to_key.len() {
            return Err(ConsistencyError::new(format!(
                "bi-map has {} keys but {} values",
                self.key_to_value.len(),
                self.value_to_key.len()
            )));
        }
        for (key, value) in self.iter() {
            if self.get_key(value) != Some(key) {
                return Err(ConsistencyError::new(format!(
                    "bi-map binds {key} -> {value} but not {value} -> {key}"
                )));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn shares_tables_with(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.key_to_value, &other.key_to_value)
            && ReferenceCounter::ptr_eq(&self.value_to_key, &other.value_to_key)
    }
}

impl PartialEq for IntBiMap {
    fn eq(&self, other: &Self) -> bool {
        self.key_to_value == other.key_to_value
    }
}

impl Eq for IntBiMap {}

impl fmt::Debug for IntBiMap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.key_to_value.iter()).finish()
    }
}

// =============================================================================
// MutableIntBiMap
// =============================================================================

/// Mutable unique integer bi-map.
#[derive(Default)]
pub struct MutableIntBiMap {
    map: IntBiMap,
}

impl MutableIntBiMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bindings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no bindings.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the value bound to the key.
    #[inline]
    #[must_use]
    pub fn get(&self, key: u32) -> Option<u32> {
        self.map.get(key)
    }

    /// Returns the key bound to the value.
    #[inline]
    #[must_use]
    pub fn get_key(&self, value: u32) -> Option<u32> {
        self.map.get_key(value)
    }

    /// Returns the bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.map.iter()
    }

    /// Binds the key to the value.
    ///
    /// Putting a binding that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateBindingError`] if the key or the value is bound to
    /// a different partner; the map is left unchanged.
    pub fn put(&mut self, key: u32, value: u32) -> Result<(), DuplicateBindingError> {
        match (self.map.get(key), self.map.get_key(value)) {
            (Some(existing), _) if existing == value => Ok(()),
            (Some(existing), _) => Err(DuplicateBindingError {
                key,
                value,
                conflict: BindingConflict::KeyBound(existing),
            }),
            (None, Some(existing)) => Err(DuplicateBindingError {
                key,
                value,
                conflict: BindingConflict::ValueBound(existing),
            }),
            (None, None) => {
                ReferenceCounter::make_mut(&mut self.map.key_to_value).insert(key, value);
                ReferenceCounter::make_mut(&mut self.map.value_to_key).insert(value, key);
                Ok(())
            }
        }
    }

    /// Removes the binding of the key, returning its value.
    pub fn remove(&mut self, key: u32) -> Option<u32> {
        if !self.map.contains_key(key) {
            return None;
        }
        let value = ReferenceCounter::make_mut(&mut self.map.key_to_value).remove(&key)?;
        ReferenceCounter::make_mut(&mut self.map.value_to_key).remove(&value);
        Some(value)
    }

    /// Removes the binding of the value, returning its key.
    pub fn remove_by_value(&mut self, value: u32) -> Option<u32> {
        if !self.map.contains_value(value) {
            return None;
        }
        let key = ReferenceCounter::make_mut(&mut self.map.value_to_key).remove(&value)?;
        ReferenceCounter::make_mut(&mut self.map.key_to_value).remove(&key);
        Some(key)
    }

    /// Returns a read-only map with the current bindings.
    ///
    /// The builder stays usable; its next write copies the touched table.
    #[must_use]
    pub fn to_immutable(&self) -> IntBiMap {
        self.map.clone()
    }

    pub(crate) const fn as_immutable(&self) -> &IntBiMap {
        &self.map
    }
}

impl fmt::Debug for MutableIntBiMap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.map, formatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_put_rejects_taken_value() {
        let mut map = MutableIntBiMap::new();
        map.put(1, 2).unwrap();
        let error = map.put(5, 2).unwrap_err();

        assert_eq!(error.conflict, BindingConflict::ValueBound(1));
        assert_eq!(map.get(5), None);
        assert_eq!(map.len(), 1);
    }

    #[rstest]
    fn test_put_same_binding_is_noop() {
        let mut map = MutableIntBiMap::new();
        map.put(1, 2).unwrap();
        assert_eq!(map.put(1, 2), Ok(()));
        assert_eq!(map.len(), 1);
    }

    #[rstest]
    fn test_remove_clears_both_directions() {
        let mut map = MutableIntBiMap::new();
        map.put(1, 2).unwrap();
        map.put(3, 4).unwrap();

        assert_eq!(map.remove(1), Some(2));
        assert_eq!(map.get_key(2), None);
        assert_eq!(map.remove_by_value(4), Some(3));
        assert_eq!(map.get(3), None);
        assert!(map.is_empty());
        assert_eq!(map.remove(1), None);
    }

    #[rstest]
    fn test_to_immutable_is_unaffected_by_later_writes() {
        let mut map = MutableIntBiMap::new();
        map.put(1, 2).unwrap();
        let snapshot = map.to_immutable();
        assert!(snapshot.shares_tables_with(map.as_immutable()));

        map.remove(1);
        map.put(1, 9).unwrap();

        assert_eq!(snapshot.get(1), Some(2));
        assert_eq!(map.get(1), Some(9));
        assert!(!snapshot.shares_tables_with(map.as_immutable()));
        assert!(snapshot.check_consistency().is_ok());
    }

    #[rstest]
    fn test_to_mutable_shares_until_written() {
        let mut source = MutableIntBiMap::new();
        source.put(7, 8).unwrap();
        let snapshot = source.to_immutable();
        let mut builder = snapshot.to_mutable();
        assert!(builder.as_immutable().shares_tables_with(&snapshot));

        assert_eq!(builder.remove(42), None);
        assert!(builder.as_immutable().shares_tables_with(&snapshot));
    }
}
