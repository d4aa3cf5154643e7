//! Many-to-one bidirectional map with shared-value ("slot") tracking.
//!
//! [`BidirectionalMap`] binds every key to exactly one value while several
//! keys may share a value. The reverse index keeps, per value, either the
//! single key bound to it or the list of keys bound to it; values in the
//! second state are *slots* and are also recorded in a dedicated set so
//! that "is this value shared" never requires a scan.
//!
//! The binding logic lives in free functions generic over the backing
//! tables ([`BackingMap`] / [`BackingSet`]) and is shared with
//! [`BidirectionalMapBuilder`](crate::persistent::BidirectionalMapBuilder),
//! the transient side of the persistent variant.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::collections::BidirectionalMap;
//!
//! let mut map = BidirectionalMap::new();
//! map.set("a", 1);
//! map.set("b", 1);
//! map.set("c", 2);
//!
//! assert_eq!(map.keys_by_value(&1), &["a", "b"]);
//! assert!(map.is_shared(&1));
//! assert!(!map.is_shared(&2));
//!
//! map.remove(&"a");
//! assert!(!map.is_shared(&1));
//! ```

use std::fmt;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ConsistencyError;
use crate::persistent::{TransientHashMap, TransientHashSet};

// =============================================================================
// KeySlot
// =============================================================================

/// Reverse-index entry: the keys currently bound to one value.
///
/// `Shared` always holds at least two keys, in binding order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySlot<K> {
    /// Exactly one key is bound to the value.
    Single(K),
    /// Two or more keys are bound to the value.
    Shared(Vec<K>),
}

impl<K> KeySlot<K> {
    /// Returns the keys as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        match self {
            Self::Single(key) => std::slice::from_ref(key),
            Self::Shared(keys) => keys,
        }
    }

    /// Returns the number of keys in the slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Always `false`; an empty slot is never stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    fn into_vec(self) -> Vec<K> {
        match self {
            Self::Single(key) => vec![key],
            Self::Shared(keys) => keys,
        }
    }
}

// =============================================================================
// Backing tables
// =============================================================================

/// Key/value table a bidirectional map can be stored in.
pub(crate) trait BackingMap<K, V> {
    fn lookup(&self, key: &K) -> Option<&V>;
    fn store(&mut self, key: K, value: V) -> Option<V>;
    fn discard(&mut self, key: &K) -> Option<V>;
}

/// Set table recording the shared values.
pub(crate) trait BackingSet<T> {
    fn include(&mut self, element: T);
    fn exclude(&mut self, element: &T);
}

impl<K: Hash + Eq, V> BackingMap<K, V> for FxHashMap<K, V> {
    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn store(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn discard(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }
}

impl<T: Hash + Eq> BackingSet<T> for FxHashSet<T> {
    fn include(&mut self, element: T) {
        self.insert(element);
    }

    fn exclude(&mut self, element: &T) {
        self.remove(element);
    }
}

impl<K: Clone + Hash + Eq, V: Clone> BackingMap<K, V> for TransientHashMap<K, V> {
    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn store(&mut self, key: K, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn discard(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }
}

impl<T: Clone + Hash + Eq> BackingSet<T> for TransientHashSet<T> {
    fn include(&mut self, element: T) {
        self.insert(element);
    }

    fn exclude(&mut self, element: &T) {
        self.remove(element);
    }
}

// =============================================================================
// Binding logic
// =============================================================================

/// Binds `key` to `value`, returning the value it was bound to before.
pub(crate) fn bind<K, V, F, R, S>(
    forward: &mut F,
    reverse: &mut R,
    slots: &mut S,
    key: K,
    value: V,
) -> Option<V>
where
    K: Clone + PartialEq,
    V: Clone + PartialEq,
    F: BackingMap<K, V>,
    R: BackingMap<V, KeySlot<K>>,
    S: BackingSet<V>,
{
    let previous = forward.store(key.clone(), value.clone());
    if let Some(old) = &previous {
        if *old == value {
            return previous;
        }
        detach(reverse, slots, &key, old);
    }
    attach(reverse, slots, key, value);
    previous
}

/// Removes the binding of `key`, returning its value.
pub(crate) fn unbind<K, V, F, R, S>(
    forward: &mut F,
    reverse: &mut R,
    slots: &mut S,
    key: &K,
) -> Option<V>
where
    K: PartialEq,
    V: Clone,
    F: BackingMap<K, V>,
    R: BackingMap<V, KeySlot<K>>,
    S: BackingSet<V>,
{
    let value = forward.discard(key)?;
    detach(reverse, slots, key, &value);
    Some(value)
}

/// Removes every binding to `value`, returning the keys in binding order.
pub(crate) fn unbind_value<K, V, F, R, S>(
    forward: &mut F,
    reverse: &mut R,
    slots: &mut S,
    value: &V,
) -> Vec<K>
where
    F: BackingMap<K, V>,
    R: BackingMap<V, KeySlot<K>>,
    S: BackingSet<V>,
{
    let Some(slot) = reverse.discard(value) else {
        return Vec::new();
    };
    slots.exclude(value);
    let keys = slot.into_vec();
    for key in &keys {
        forward.discard(key);
    }
    keys
}

fn attach<K, V, R, S>(reverse: &mut R, slots: &mut S, key: K, value: V)
where
    K: PartialEq,
    V: Clone,
    R: BackingMap<V, KeySlot<K>>,
    S: BackingSet<V>,
{
    let slot = match reverse.discard(&value) {
        None => KeySlot::Single(key),
        Some(KeySlot::Single(existing)) if existing == key => KeySlot::Single(existing),
        Some(KeySlot::Single(existing)) => {
            slots.include(value.clone());
            KeySlot::Shared(vec![existing, key])
        }
        Some(KeySlot::Shared(mut keys)) => {
            if !keys.contains(&key) {
                keys.push(key);
            }
            KeySlot::Shared(keys)
        }
    };
    reverse.store(value, slot);
}

fn detach<K, V, R, S>(reverse: &mut R, slots: &mut S, key: &K, value: &V)
where
    K: PartialEq,
    V: Clone,
    R: BackingMap<V, KeySlot<K>>,
    S: BackingSet<V>,
{
    match reverse.discard(value) {
        None => {}
        Some(KeySlot::Single(existing)) => {
            if existing != *key {
                reverse.store(value.clone(), KeySlot::Single(existing));
            }
        }
        Some(KeySlot::Shared(mut keys)) => {
            keys.retain(|candidate| candidate != key);
            if keys.len() >= 2 {
                reverse.store(value.clone(), KeySlot::Shared(keys));
                return;
            }
            slots.exclude(value);
            if let Some(last) = keys.pop() {
                reverse.store(value.clone(), KeySlot::Single(last));
            }
        }
    }
}

/// Returns the keys bound to `value` in a reverse table.
pub(crate) fn keys_bound_to<'a, K, V, R>(reverse: &'a R, value: &V) -> &'a [K]
where
    K: 'a,
    R: BackingMap<V, KeySlot<K>>,
{
    match reverse.lookup(value) {
        Some(slot) => slot.as_slice(),
        None => &[],
    }
}

// =============================================================================
// BidirectionalRead
// =============================================================================

/// Read access shared by [`BidirectionalMap`] and both sides of
/// [`PersistentBidirectionalMap`](crate::persistent::PersistentBidirectionalMap).
pub trait BidirectionalRead<K, V> {
    /// Returns the value bound to the key.
    fn value_of(&self, key: &K) -> Option<&V>;

    /// Returns the keys bound to the value, in binding order.
    fn keys_of(&self, value: &V) -> &[K];

    /// Returns `true` if the value is recorded as shared.
    fn is_slot(&self, value: &V) -> bool;

    /// Returns the bindings in unspecified order.
    fn bindings<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        K: 'a,
        V: 'a;

    /// Returns the number of keys.
    fn binding_count(&self) -> usize;

    /// Returns the number of values in the reverse index.
    fn value_count(&self) -> usize;

    /// Returns the number of values recorded as shared.
    fn slot_count(&self) -> usize;

    /// Verifies that the forward table, the reverse index and the slot set
    /// agree.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found.
    fn check_consistency(&self) -> Result<(), ConsistencyError>
    where
        K: PartialEq + fmt::Debug,
        V: Hash + Eq + fmt::Debug,
    {
        let mut values = FxHashSet::default();
        for (key, value) in self.bindings() {
            if !self.keys_of(value).contains(key) {
                return Err(ConsistencyError::new(format!(
                    "{key:?} is bound to {value:?} but not listed under it"
                )));
            }
            values.insert(value);
        }
        if values.len() != self.value_count() {
            return Err(ConsistencyError::new(format!(
                "reverse index has {} values, forward table {}",
                self.value_count(),
                values.len()
            )));
        }
        let mut listed = 0;
        let mut shared = 0;
        for value in values {
            let keys = self.keys_of(value).len();
            listed += keys;
            if keys >= 2 {
                shared += 1;
            }
            if self.is_slot(value) != (keys >= 2) {
                return Err(ConsistencyError::new(format!(
                    "{value:?} has {keys} keys but its slot flag is {}",
                    self.is_slot(value)
                )));
            }
        }
        if listed != self.binding_count() {
            return Err(ConsistencyError::new(format!(
                "reverse index lists {listed} keys, forward table has {}",
                self.binding_count()
            )));
        }
        if shared == self.slot_count() {
            Ok(())
        } else {
            Err(ConsistencyError::new(format!(
                "slot set has {} values, {shared} are shared",
                self.slot_count()
            )))
        }
    }
}

// =============================================================================
// BidirectionalMap
// =============================================================================

/// A mutable many-to-one bidirectional map.
///
/// # Time Complexity
///
/// | Operation        | Complexity             |
/// |------------------|------------------------|
/// | `get`            | O(1)                   |
/// | `keys_by_value`  | O(1)                   |
/// | `set` / `remove` | O(k), k keys per value |
/// | `remove_value`   | O(k)                   |
/// | `is_shared`      | O(1)                   |
/// | `copy`           | O(n)                   |
#[derive(Clone)]
pub struct BidirectionalMap<K, V> {
    key_to_value: FxHashMap<K, V>,
    value_to_keys: FxHashMap<V, KeySlot<K>>,
    slots_with_list: FxHashSet<V>,
}

impl<K, V> BidirectionalMap<K, V> {
    /// Creates a new empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key_to_value: FxHashMap::default(),
            value_to_keys: FxHashMap::default(),
            slots_with_list: FxHashSet::default(),
        }
    }

    /// Returns the number of keys in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.key_to_value.len()
    }

    /// Returns `true` if the map holds no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_to_value.is_empty()
    }

    /// Returns the values currently bound to two or more keys.
    #[must_use]
    pub const fn slots_with_list(&self) -> &FxHashSet<V> {
        &self.slots_with_list
    }

    /// Returns an iterator over the bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.key_to_value.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> BidirectionalMap<K, V> {
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
        keys_bound_to(&self.value_to_keys, value)
    }

    /// Returns `true` if two or more keys are bound to the value.
    #[must_use]
    pub fn is_shared(&self, value: &V) -> bool {
        self.slots_with_list.contains(value)
    }

    /// Binds the key to the value, returning the key's previous value.
    ///
    /// When the key was the last one bound to its previous value, that value
    /// leaves the reverse index.
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

    /// Returns an independent copy of the map.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> BidirectionalRead<K, V>
    for BidirectionalMap<K, V>
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

impl<K, V> Default for BidirectionalMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Hash + Eq> FromIterator<(K, V)> for BidirectionalMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BidirectionalMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.key_to_value.iter()).finish()
    }
}
