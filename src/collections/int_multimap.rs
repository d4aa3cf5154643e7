//! Integer multi-map: one key to an ordered set of values.
//!
//! Every value belongs to at most one key. Adding a value that already
//! belongs to another key moves it: it leaves the old key's set in the same
//! step, so no key keeps a stale reference to it. Adding a value twice to
//! the same key keeps a single copy.
//!
//! [`IntMultiMap`] is the compact read-only form: the value sets of all keys
//! are laid out back to back in one boxed slice. [`MutableIntMultiMap`]
//! starts out frozen on top of a compact map and thaws into per-key
//! [`SmallVec`]s on its first write.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::collections::MutableIntMultiMap;
//!
//! let mut map = MutableIntMultiMap::new();
//! map.add_all(1, [2]);
//! map.add_all(1, [3]);
//! assert_eq!(map.get(1), &[2, 3]);
//!
//! map.add_all(5, [3]);
//! assert_eq!(map.get(1), &[2]);
//! assert_eq!(map.get_key(3), Some(5));
//!
//! let compact = map.to_immutable();
//! assert_eq!(compact.get(5), &[3]);
//! ```

use std::cell::OnceCell;
use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::ConsistencyError;
use crate::persistent::ReferenceCounter;

// =============================================================================
// IntMultiMapRead
// =============================================================================

/// Read access shared by both forms of the multi-map.
pub trait IntMultiMapRead {
    /// Returns the values of the key in insertion order; empty if unknown.
    fn values_of(&self, key: u32) -> &[u32];

    /// Returns the key the value belongs to.
    fn key_of(&self, value: u32) -> Option<u32>;

    /// Returns the keys holding at least one value, in unspecified order.
    fn keys(&self) -> impl Iterator<Item = u32> + '_;

    /// Returns the number of values over all keys.
    fn value_count(&self) -> usize;

    /// Verifies that the value sets and the owner index agree.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found.
    fn check_consistency(&self) -> Result<(), ConsistencyError> {
        let mut seen = 0;
        for key in self.keys() {
            let values = self.values_of(key);
            if values.is_empty() {
                return Err(ConsistencyError::new(format!(
                    "multi-map keeps an empty set for {key}"
                )));
            }
            for (index, &value) in values.iter().enumerate() {
                if values[..index].contains(&value) {
                    return Err(ConsistencyError::new(format!(
                        "multi-map holds {value} twice under {key}"
                    )));
                }
                if self.key_of(value) != Some(key) {
                    return Err(ConsistencyError::new(format!(
                        "multi-map holds {value} under {key} but its owner is {:?}",
                        self.key_of(value)
                    )));
                }
            }
            seen += values.len();
        }
        if seen == self.value_count() {
            Ok(())
        } else {
            Err(ConsistencyError::new(format!(
                "multi-map owner index has {} values, sets hold {seen}",
                self.value_count()
            )))
        }
    }
}

// =============================================================================
// IntMultiMap
// =============================================================================

#[derive(Default)]
struct CompactTables {
    ranges: FxHashMap<u32, (usize, usize)>,
    values: Box<[u32]>,
    owners: FxHashMap<u32, u32>,
}

/// Compact read-only multi-map.
#[derive(Clone, Default)]
pub struct IntMultiMap {
    tables: ReferenceCounter<CompactTables>,
}

impl IntMultiMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys holding at least one value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.ranges.len()
    }

    /// Returns `true` if no key holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.ranges.is_empty()
    }

    /// Returns the values of the key in insertion order; empty if unknown.
    #[must_use]
    pub fn get(&self, key: u32) -> &[u32] {
        match self.tables.ranges.get(&key) {
            Some(&(start, length)) => &self.tables.values[start..start + length],
            None => &[],
        }
    }

    /// Returns the key the value belongs to.
    #[must_use]
    pub fn get_key(&self, value: u32) -> Option<u32> {
        self.tables.owners.get(&value).copied()
    }

    /// Returns `true` if both maps share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.tables, &other.tables)
    }

    /// Returns a mutable map starting from these contents in O(1).
    #[must_use]
    pub fn to_mutable(&self) -> MutableIntMultiMap {
        MutableIntMultiMap {
            frozen: self.clone(),
            thawed: None,
            compacted: OnceCell::new(),
        }
    }
}

impl IntMultiMapRead for IntMultiMap {
    fn values_of(&self, key: u32) -> &[u32] {
        self.get(key)
    }

    fn key_of(&self, value: u32) -> Option<u32> {
        self.get_key(value)
    }

    fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.tables.ranges.keys().copied()
    }

    fn value_count(&self) -> usize {
        self.tables.owners.len()
    }
}

impl fmt::Debug for IntMultiMap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.keys().map(|key| (key, self.get(key))))
            .finish()
    }
}

// =============================================================================
// MutableIntMultiMap
// =============================================================================

#[derive(Default)]
struct ThawedTables {
    keys_to_values: FxHashMap<u32, SmallVec<[u32; 4]>>,
    owners: FxHashMap<u32, u32>,
}

impl ThawedTables {
    fn from_compact(compact: &IntMultiMap) -> Self {
        let keys_to_values = compact
            .keys()
            .map(|key| (key, SmallVec::from_slice(compact.get(key))))
            .collect();
        Self {
            keys_to_values,
            owners: compact.tables.owners.clone(),
        }
    }

    fn detach(&mut self, key: u32, value: u32) {
        if let Some(values) = self.keys_to_values.get_mut(&key) {
            values.retain(|candidate| *candidate != value);
            if values.is_empty() {
                self.keys_to_values.remove(&key);
            }
        }
    }

    fn compact(&self) -> IntMultiMap {
        let mut keys: Vec<u32> = self.keys_to_values.keys().copied().collect();
        keys.sort_unstable();

        let mut ranges = FxHashMap::default();
        ranges.reserve(keys.len());
        let mut values = Vec::with_capacity(self.owners.len());
        for key in keys {
            let slice = self.keys_to_values.get(&key).map_or(&[][..], |set| set.as_slice());
            ranges.insert(key, (values.len(), slice.len()));
            values.extend_from_slice(slice);
        }

        IntMultiMap {
            tables: ReferenceCounter::new(CompactTables {
                ranges,
                values: values.into_boxed_slice(),
                owners: self.owners.clone(),
            }),
        }
    }
}

/// Mutable multi-map with move-on-conflict insertion.
#[derive(Default)]
pub struct MutableIntMultiMap {
    frozen: IntMultiMap,
    thawed: Option<ThawedTables>,
    // Compact form of `thawed`; reset by every write.
    compacted: OnceCell<IntMultiMap>,
}

impl MutableIntMultiMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys holding at least one value.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.thawed {
            Some(tables) => tables.keys_to_values.len(),
            None => self.frozen.len(),
        }
    }

    /// Returns `true` if no key holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the values of the key in insertion order; empty if unknown.
    #[must_use]
    pub fn get(&self, key: u32) -> &[u32] {
        match &self.thawed {
            Some(tables) => tables
                .keys_to_values
                .get(&key)
                .map_or(&[][..], |values| values.as_slice()),
            None => self.frozen.get(key),
        }
    }

    /// Returns the key the value belongs to.
    #[must_use]
    pub fn get_key(&self, value: u32) -> Option<u32> {
        match &self.thawed {
            Some(tables) => tables.owners.get(&value).copied(),
            None => self.frozen.get_key(value),
        }
    }

    /// Appends the values to the key's set.
    ///
    /// A value owned by another key is moved; a value already owned by this
    /// key keeps its position.
    pub fn add_all(&mut self, key: u32, values: impl IntoIterator<Item = u32>) {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            return;
        }
        let tables = self.thawed();
        for value in values {
            match tables.owners.insert(value, key) {
                Some(owner) if owner == key => continue,
                Some(owner) => tables.detach(owner, value),
                None => {}
            }
            tables.keys_to_values.entry(key).or_default().push(value);
        }
    }

    /// Drops every value of the key and returns them in insertion order.
    pub fn remove(&mut self, key: u32) -> Vec<u32> {
        if self.get(key).is_empty() {
            return Vec::new();
        }
        let tables = self.thawed();
        let removed = tables.keys_to_values.remove(&key).unwrap_or_default();
        for value in &removed {
            tables.owners.remove(value);
        }
        removed.into_vec()
    }

    /// Drops one value from the key's set, returning `true` if it was there.
    pub fn remove_value(&mut self, key: u32, value: u32) -> bool {
        if self.get_key(value) != Some(key) {
            return false;
        }
        let tables = self.thawed();
        tables.owners.remove(&value);
        tables.detach(key, value);
        true
    }

    /// Returns the compact read-only form of the current contents.
    ///
    /// O(n) on the first call after a write, O(1) otherwise. The map stays
    /// usable either way.
    #[must_use]
    pub fn to_immutable(&self) -> IntMultiMap {
        match &self.thawed {
            Some(tables) => self.compacted.get_or_init(|| tables.compact()).clone(),
            None => self.frozen.clone(),
        }
    }

    fn thawed(&mut self) -> &mut ThawedTables {
        self.compacted = OnceCell::new();
        if self.thawed.is_none() {
            let frozen = std::mem::take(&mut self.frozen);
            self.thawed = Some(ThawedTables::from_compact(&frozen));
        }
        self.thawed.get_or_insert_with(ThawedTables::default)
    }
}

impl IntMultiMapRead for MutableIntMultiMap {
    fn values_of(&self, key: u32) -> &[u32] {
        self.get(key)
    }

    fn key_of(&self, value: u32) -> Option<u32> {
        self.get_key(value)
    }

    fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        let (thawed, frozen) = match &self.thawed {
            Some(tables) => (Some(tables.keys_to_values.keys().copied()), None),
            None => (None, Some(self.frozen.keys())),
        };
        thawed.into_iter().flatten().chain(frozen.into_iter().flatten())
    }

    fn value_count(&self) -> usize {
        match &self.thawed {
            Some(tables) => tables.owners.len(),
            None => self.frozen.value_count(),
        }
    }
}

impl fmt::Debug for MutableIntMultiMap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.keys().map(|key| (key, self.get(key))))
            .finish()
    }
}
