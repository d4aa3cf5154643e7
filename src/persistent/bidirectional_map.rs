//! Persistent many-to-one bidirectional map with a builder/commit protocol.
//!
//! [`PersistentBidirectionalMap`] is the immutable snapshot; its three
//! tables (key → value, value → keys, shared values) are HAMTs, so a
//! snapshot is cheap to clone and safe to hand to any number of readers.
//! [`BidirectionalMapBuilder`] is the mutable view obtained with
//! [`PersistentBidirectionalMap::builder`]: it holds transients over the
//! same tables, copies nodes on first write, and produces the next snapshot
//! with [`BidirectionalMapBuilder::build`]. The snapshot a builder was
//! derived from is never affected by the builder.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::persistent::PersistentBidirectionalMap;
//!
//! let first: PersistentBidirectionalMap<u32, u32> =
//!     [(1, 1), (2, 2), (3, 3)].into_iter().collect();
//!
//! let mut builder = first.builder();
//! builder.remove(&1);
//! let second = builder.build();
//!
//! assert_eq!(first.len(), 3);
//! assert_eq!(second.len(), 2);
//! assert_eq!(first.get(&1), Some(&1));
//! assert_eq!(second.get(&1), None);
//! assert!(!first.shares_storage_with(&second));
//! ```

use std::fmt;
use std::hash::Hash;

use super::{PersistentHashMap, PersistentHashSet, TransientHashMap, TransientHashSet};
use crate::collections::KeySlot;
use crate::collections::BidirectionalRead;
use crate::collections::bidirectional_map::{bind, keys_bound_to, unbind, unbind_value};

// =============================================================================
// PersistentBidirectionalMap
// =============================================================================

/// An immutable many-to-one bidirectional map.
pub struct PersistentBidirectionalMap<K, V> {
    key_to_value: PersistentHashMap<K, V>,
    value_to_keys: PersistentHashMap<V, KeySlot<K>>,
    slots_with_list: PersistentHashSet<V>,
}

impl<K, V> PersistentBidirectionalMap<K, V> {
    /// Creates a new empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key_to_value: PersistentHashMap::new(),
            value_to_keys: PersistentHashMap::new(),
            slots_with_list: PersistentHashSet::new(),
        }
    }

    /// Returns the number of keys in the map.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.key_to_value.len()
    }

    /// Returns `true` if the map holds no bindings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.key_to_value.is_empty()
    }

    /// Returns the values currently bound to two or more keys.
    #[must_use]
    pub const fn slots_with_list(&self) -> &PersistentHashSet<V> {
        &self.slots_with_list
    }

    /// Returns an iterator over the bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.key_to_value.iter()
    }

    /// Returns `true` if both snapshots use the same forward table.
    ///
    /// A snapshot built from a builder that performed any write never shares
    /// its forward table with the snapshot the builder was derived from.
    #[must_use]
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        self.key_to_value.ptr_eq(&other.key_to_value)
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> PersistentBidirectionalMap<K, V> {
    /// Returns the value bound to the key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.key_to_value.get(key)
    }

    /// Returns `true` if the key is bound.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.key_to_value.contains_key(key)
    }

    /// Returns `true` if at least one key is bound to the value.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.value_to_keys.contains_key(value)
    }

    /// Returns the keys bound to the value, in binding order.
    #[must_use]
    pub fn keys_by_value(&self, value: &V) -> &[K] {
        match self.value_to_keys.get(value) {
            Some(slot) => slot.as_slice(),
            None => &[],
        }
    }

    /// Returns `true` if two or more keys are bound to the value.
    #[must_use]
    pub fn is_shared(&self, value: &V) -> bool {
        self.slots_with_list.contains(value)
    }

    /// Returns a mutable view starting from this snapshot.
    ///
    /// # Complexity
    ///
    /// O(1); nodes are copied lazily by the builder's writes.
    #[must_use]
    pub fn builder(&self) -> BidirectionalMapBuilder<K, V> {
        BidirectionalMapBuilder {
            key_to_value: self.key_to_value.transient(),
            value_to_keys: self.value_to_keys.transient(),
            slots_with_list: self.slots_with_list.transient(),
        }
    }
}

impl<K, V> Clone for PersistentBidirectionalMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            key_to_value: self.key_to_value.clone(),
            value_to_keys: self.value_to_keys.clone(),
            slots_with_list: self.slots_with_list.clone(),
        }
    }
}

impl<K, V> Default for PersistentBidirectionalMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> FromIterator<(K, V)>
    for PersistentBidirectionalMap<K, V>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut builder = Self::new().builder();
        for (key, value) in iter {
            builder.set(key, value);
        }
        builder.build()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentBidirectionalMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.key_to_value.iter()).finish()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> BidirectionalRead<K, V>
    for PersistentBidirectionalMap<K, V>
{
    fn value_of(&self, key: &K) -> Option<&V> {
        self.key_to_value.get(key)
    }

    fn keys_of(&self, value: &V) -> &[K] {
        self.keys_by_value(value)
    }

    fn is_slot(&self, value: &V) -> bool {
        self.slots_with_list.contains(value)
    }

    fn bindings<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        K: 'a,
        V: 'a,
    {
        self.key_to_value.iter()
    }

    fn binding_count(&self) -> usize {
        self.key_to_value.len()
    }

    fn value_count(&self) -> usize {
        self.value_to_keys.len()
    }

    fn slot_count(&self) -> usize {
        self.slots_with_list.len()
    }
}

// =============================================================================
// BidirectionalMapBuilder
// =============================================================================

/// The mutable view of a [`PersistentBidirectionalMap`].
pub struct BidirectionalMapBuilder<K, V> {
    key_to_value: TransientHashMap<K, V>,
    value_to_keys: TransientHashMap<V, KeySlot<K>>,
    slots_with_list: TransientHashSet<V>,
}

static_assertions::assert_not_impl_any!(BidirectionalMapBuilder<u32, u32>: Send, Sync);

impl<K, V> BidirectionalMapBuilder<K, V> {
    /// Returns the number of keys in the builder.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.key_to_value.len()
    }

    /// Returns `true` if the builder holds no bindings.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.key_to_value.is_empty()
    }

    /// Returns an iterator over the bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.key_to_value.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> BidirectionalMapBuilder<K, V> {
    /// Creates a builder over an empty map.
    #[must_use]
    pub fn new() -> Self {
        PersistentBidirectionalMap::new().builder()
    }

    /// Returns the value bound to the key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.key_to_value.get(key)
    }

    /// Returns `true` if the key is bound.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.key_to_value.contains_key(key)
    }

    /// Returns the keys bound to the value, in binding order.
    #[must_use]
    pub fn keys_by_value(&self, value: &V) -> &[K] {
        keys_bound_to(&self.value_to_keys, value)
    }

    /// Returns `true` if two or more keys are bound to the value.
    #[must_use]
    pub fn is_shared(&self, value: &V) -> bool {
        self.slots_with_list.contains(value)
    }

    /// Returns the values currently bound to two or more keys.
    pub fn slots_with_list(&self) -> impl Iterator<Item = &V> {
        self.slots_with_list.iter()
    }

    /// Binds the key to the value, returning the key's previous value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        bind(
            &mut self.key_to_value,
            &mut self.value_to_keys,
            &mut self.slots_with_list,
            key,
            value,
        )
    }

    /// Removes the key, returning the value it was bound to.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        unbind(
            &mut self.key_to_value,
            &mut self.value_to_keys,
            &mut self.slots_with_list,
            key,
        )
    }

    /// Removes every key bound to the value and returns them.
    pub fn remove_value(&mut self, value: &V) -> Vec<K> {
        unbind_value(
            &mut self.key_to_value,
            &mut self.value_to_keys,
            &mut self.slots_with_list,
            value,
        )
    }

    /// Commits the builder into a new snapshot.
    #[must_use]
    pub fn build(self) -> PersistentBidirectionalMap<K, V> {
        PersistentBidirectionalMap {
            key_to_value: self.key_to_value.persistent(),
            value_to_keys: self.value_to_keys.persistent(),
            slots_with_list: self.slots_with_list.persistent(),
        }
    }

    /// Returns a snapshot of the current contents without consuming the
    /// builder. Later writes copy whatever they touch first.
    #[must_use]
    pub fn snapshot(&self) -> PersistentBidirectionalMap<K, V> {
        PersistentBidirectionalMap {
            key_to_value: self.key_to_value.to_persistent(),
            value_to_keys: self.value_to_keys.to_persistent(),
            slots_with_list: self.slots_with_list.to_persistent(),
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> BidirectionalRead<K, V>
    for BidirectionalMapBuilder<K, V>
{
    fn value_of(&self, key: &K) -> Option<&V> {
        self.key_to_value.get(key)
    }

    fn keys_of(&self, value: &V) -> &[K] {
        keys_bound_to(&self.value_to_keys, value)
    }

    fn is_slot(&self, value: &V) -> bool {
        self.slots_with_list.contains(value)
    }

    fn bindings<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        K: 'a,
        V: 'a,
    {
        self.key_to_value.iter()
    }

    fn binding_count(&self) -> usize {
        self.key_to_value.len()
    }

    fn value_count(&self) -> usize {
        self.value_to_keys.len()
    }

    fn slot_count(&self) -> usize {
        self.slots_with_list.len()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> Default for BidirectionalMapBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BidirectionalMapBuilder<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.key_to_value.iter())
            .finish()
    }
}
