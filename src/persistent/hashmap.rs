//! Persistent (immutable) hash map based on HAMT.
//!
//! This module provides [`PersistentHashMap`], an immutable hash map that
//! uses structural sharing, and [`TransientHashMap`], its temporarily
//! mutable counterpart used for batches of updates.
//!
//! # Overview
//!
//! The map is a Hash Array Mapped Trie with 32-way branching. Every node is
//! held behind a [`ReferenceCounter`], and every mutation goes through
//! `make_mut`: a node that is shared with another version is copied before
//! it is touched, a node owned exclusively is updated in place. As a result
//!
//! - `PersistentHashMap::insert` / `remove` copy only the nodes on the path
//!   from the root to the changed entry;
//! - `TransientHashMap` mutates in place once the path has been copied, so a
//!   batch of updates pays the copying cost once per touched node;
//! - converting between the two forms is O(1).
//!
//! # Examples
//!
//! ```rust
//! use refgraph::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//!
//! let mut transient = map.transient();
//! transient.insert("three".to_string(), 3);
//! transient.remove("one");
//! let updated = transient.persistent();
//!
//! assert_eq!(map.get("one"), Some(&1));      // Original unchanged
//! assert_eq!(updated.get("one"), None);
//! assert_eq!(updated.get("three"), Some(&3));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;

use rustc_hash::FxBuildHasher;

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Bits per level in the trie
const BITS_PER_LEVEL: usize = 5;

/// Bit mask for extracting index within a node
const MASK: u64 = (1 << BITS_PER_LEVEL) - 1;

// =============================================================================
// Hash computation
// =============================================================================

fn compute_hash<Q: Hash + ?Sized>(key: &Q) -> u64 {
    FxBuildHasher.hash_one(key)
}

/// Extracts the index at a given depth from a hash.
#[inline]
const fn hash_index(hash: u64, depth: usize) -> usize {
    ((hash >> (depth * BITS_PER_LEVEL)) & MASK) as usize
}

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node structure for the HAMT.
#[derive(Clone)]
enum Node<K, V> {
    /// Bitmap-indexed branch node
    Branch {
        /// Bitmap indicating which slots are occupied
        bitmap: u32,
        /// Children (entries or subnodes), compressed
        children: Vec<Child<K, V>>,
    },
    /// Keys whose full hashes are equal
    Collision { hash: u64, entries: Vec<(K, V)> },
}

/// A child in a branch node.
#[derive(Clone)]
enum Child<K, V> {
    Entry { hash: u64, key: K, value: V },
    Node(ReferenceCounter<Node<K, V>>),
}

impl<K, V> Node<K, V> {
    const fn empty() -> Self {
        Self::Branch {
            bitmap: 0,
            children: Vec::new(),
        }
    }
}

impl<K, V> Child<K, V> {
    fn into_entry(self) -> Option<(K, V)> {
        match self {
            Self::Entry { key, value, .. } => Some((key, value)),
            Self::Node(_) => None,
        }
    }
}

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on HAMT.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `insert`       | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `transient`    | O(1)              |
///
/// # Examples
///
/// ```rust
/// use refgraph::persistent::PersistentHashMap;
///
/// let map: PersistentHashMap<u32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
/// assert_eq!(map.get(&1), Some(&"a"));
/// assert_eq!(map.len(), 2);
/// ```
pub struct PersistentHashMap<K, V> {
    /// Root node of the trie, always a branch
    root: ReferenceCounter<Node<K, V>>,
    /// Number of entries
    length: usize,
}

impl<K, V> PersistentHashMap<K, V> {
    /// Creates a new empty map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: ReferenceCounter::new(Node::empty()),
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// Two maps sharing a root are guaranteed to hold the same entries. A
    /// mutation through a transient derived from one of them always gives the
    /// result a fresh root, so this is the cheap way to observe that two
    /// versions are structurally independent.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.root, &other.root)
    }

    /// Returns an iterator over the entries of the map in unspecified order.
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        let stack = match &*self.root {
            Node::Branch { children, .. } => vec![children.iter()],
            Node::Collision { .. } => Vec::new(),
        };
        let collision = match &*self.root {
            Node::Collision { entries, .. } => entries.iter(),
            Node::Branch { .. } => std::slice::Iter::default(),
        };
        PersistentHashMapIterator {
            stack,
            collision,
            remaining: self.length,
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: Clone + Hash + Eq, V: Clone> PersistentHashMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use refgraph::persistent::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("hello".to_string(), 42);
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = compute_hash(key);
        let mut node: &Node<K, V> = &self.root;
        let mut depth = 0;
        loop {
            match node {
                Node::Branch { bitmap, children } => {
                    let bit = 1u32 << hash_index(hash, depth);
                    if bitmap & bit == 0 {
                        return None;
                    }
                    let position = (bitmap & (bit - 1)).count_ones() as usize;
                    match &children[position] {
                        Child::Entry {
                            hash: entry_hash,
                            key: entry_key,
                            value,
                        } => {
                            return (*entry_hash == hash && entry_key.borrow() == key)
                                .then_some(value);
                        }
                        Child::Node(subnode) => {
                            node = &**subnode;
                            depth += 1;
                        }
                    }
                }
                Node::Collision {
                    hash: collision_hash,
                    entries,
                } => {
                    if *collision_hash != hash {
                        return None;
                    }
                    return entries
                        .iter()
                        .find(|(entry_key, _)| entry_key.borrow() == key)
                        .map(|(_, value)| value);
                }
            }
        }
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns a new map with the key bound to the value.
    ///
    /// If the map already contains the key, the value is replaced.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let mut next = self.clone();
        next.insert_in_place(key, value);
        next
    }

    /// Returns a new map without the key.
    ///
    /// Removing an absent key returns a map sharing this map's root.
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut next = self.clone();
        next.remove_in_place(key);
        next
    }

    /// Converts this map into a transient map for batch updates.
    ///
    /// The transient shares every node with this map until it writes to it.
    #[must_use]
    pub fn transient(&self) -> TransientHashMap<K, V> {
        TransientHashMap {
            inner: self.clone(),
            _marker: PhantomData,
        }
    }

    fn insert_in_place(&mut self, key: K, value: V) -> Option<V> {
        let hash = compute_hash(&key);
        let previous = Self::insert_into(&mut self.root, hash, key, value, 0);
        if previous.is_none() {
            self.length += 1;
        }
        previous
    }

    fn remove_in_place<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Probe first so that removing an absent key never copies a path.
        if !self.contains_key(key) {
            return None;
        }
        let hash = compute_hash(key);
        let removed = Self::remove_from(&mut self.root, hash, key, 0);
        if removed.is_some() {
            self.length -= 1;
        }
        removed
    }

    fn insert_into(
        node: &mut ReferenceCounter<Node<K, V>>,
        hash: u64,
        key: K,
        value: V,
        depth: usize,
    ) -> Option<V> {
        let node = ReferenceCounter::make_mut(node);
        match node {
            Node::Branch { bitmap, children } => {
                let bit = 1u32 << hash_index(hash, depth);
                let position = (*bitmap & (bit - 1)).count_ones() as usize;
                if *bitmap & bit == 0 {
                    children.insert(position, Child::Entry { hash, key, value });
                    *bitmap |= bit;
                    return None;
                }

                let existing_hash = match &mut children[position] {
                    Child::Node(subnode) => {
                        return Self::insert_into(subnode, hash, key, value, depth + 1);
                    }
                    Child::Entry {
                        hash: entry_hash,
                        key: entry_key,
                        value: entry_value,
                    } => {
                        if *entry_hash == hash && *entry_key == key {
                            return Some(mem::replace(entry_value, value));
                        }
                        *entry_hash
                    }
                };

                let existing = children.remove(position);
                let merged = if existing_hash == hash {
                    let mut entries: Vec<(K, V)> = existing.into_entry().into_iter().collect();
                    entries.push((key, value));
                    Node::Collision { hash, entries }
                } else {
                    Self::pair(
                        depth + 1,
                        existing,
                        existing_hash,
                        Child::Entry { hash, key, value },
                        hash,
                    )
                };
                children.insert(position, Child::Node(ReferenceCounter::new(merged)));
                None
            }
            Node::Collision {
                hash: collision_hash,
                entries,
            } => {
                if *collision_hash == hash {
                    if let Some((_, entry_value)) =
                        entries.iter_mut().find(|(entry_key, _)| *entry_key == key)
                    {
                        return Some(mem::replace(entry_value, value));
                    }
                    entries.push((key, value));
                    return None;
                }
                let collision_hash = *collision_hash;
                let collision = mem::replace(node, Node::empty());
                *node = Self::pair(
                    depth,
                    Child::Node(ReferenceCounter::new(collision)),
                    collision_hash,
                    Child::Entry { hash, key, value },
                    hash,
                );
                None
            }
        }
    }

    /// Builds a branch at `depth` holding two children with distinct hashes.
    fn pair(
        depth: usize,
        first: Child<K, V>,
        first_hash: u64,
        second: Child<K, V>,
        second_hash: u64,
    ) -> Node<K, V> {
        let first_index = hash_index(first_hash, depth);
        let second_index = hash_index(second_hash, depth);
        if first_index == second_index {
            let nested = Self::pair(depth + 1, first, first_hash, second, second_hash);
            return Node::Branch {
                bitmap: 1 << first_index,
                children: vec![Child::Node(ReferenceCounter::new(nested))],
            };
        }
        let children = if first_index < second_index {
            vec![first, second]
        } else {
            vec![second, first]
        };
        Node::Branch {
            bitmap: (1 << first_index) | (1 << second_index),
            children,
        }
    }

    fn remove_from<Q>(
        node: &mut ReferenceCounter<Node<K, V>>,
        hash: u64,
        key: &Q,
        depth: usize,
    ) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match ReferenceCounter::make_mut(node) {
            Node::Branch { bitmap, children } => {
                let bit = 1u32 << hash_index(hash, depth);
                if *bitmap & bit == 0 {
                    return None;
                }
                let position = (*bitmap & (bit - 1)).count_ones() as usize;
                match &mut children[position] {
                    Child::Entry {
                        hash: entry_hash,
                        key: entry_key,
                        ..
                    } => {
                        if *entry_hash != hash || (*entry_key).borrow() != key {
                            return None;
                        }
                    }
                    Child::Node(subnode) => {
                        let removed = Self::remove_from(subnode, hash, key, depth + 1);
                        if removed.is_some() {
                            Self::compact(&mut children[position]);
                        }
                        return removed;
                    }
                }
                *bitmap &= !bit;
                children
                    .remove(position)
                    .into_entry()
                    .map(|(_, value)| value)
            }
            Node::Collision { entries, .. } => {
                let index = entries
                    .iter()
                    .position(|(entry_key, _)| entry_key.borrow() == key)?;
                Some(entries.remove(index).1)
            }
        }
    }

    /// Pulls a lone entry up into its parent slot.
    fn compact(slot: &mut Child<K, V>) {
        let Child::Node(subnode) = slot else {
            return;
        };
        let replacement = match &**subnode {
            Node::Branch { children, .. } => match children.as_slice() {
                [entry @ Child::Entry { .. }] => entry.clone(),
                _ => return,
            },
            Node::Collision { hash, entries } => match entries.as_slice() {
                [(key, value)] => Child::Entry {
                    hash: *hash,
                    key: key.clone(),
                    value: value.clone(),
                },
                _ => return,
            },
        };
        *slot = replacement;
    }
}

// =============================================================================
// Iterator
// =============================================================================

/// An iterator over the entries of a [`PersistentHashMap`].
pub struct PersistentHashMapIterator<'a, K, V> {
    stack: Vec<std::slice::Iter<'a, Child<K, V>>>,
    collision: std::slice::Iter<'a, (K, V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, value)) = self.collision.next() {
                self.remaining -= 1;
                return Some((key, value));
            }
            let top = self.stack.last_mut()?;
            match top.next() {
                None => {
                    self.stack.pop();
                }
                Some(Child::Entry { key, value, .. }) => {
                    self.remaining -= 1;
                    return Some((key, value));
                }
                Some(Child::Node(subnode)) => match &**subnode {
                    Node::Branch { children, .. } => self.stack.push(children.iter()),
                    Node::Collision { entries, .. } => self.collision = entries.iter(),
                },
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIterator<'_, K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Clone for PersistentHashMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: ReferenceCounter::clone(&self.root),
            length: self.length,
        }
    }
}

impl<K, V> Default for PersistentHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut transient = TransientHashMap::new();
        for (key, value) in iter {
            transient.insert(key, value);
        }
        transient.persistent()
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.length == other.length
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Clone + Hash + Eq, V: Clone + Eq> Eq for PersistentHashMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// TransientHashMap
// =============================================================================

/// A transient (temporarily mutable) hash map for efficient batch updates.
///
/// Nodes shared with the persistent map the transient was created from are
/// copied on first write; nodes the transient owns exclusively are updated
/// in place.
///
/// `PhantomData<Rc<()>>` keeps the transient `!Send` and `!Sync`, and
/// `Clone` is intentionally not implemented.
///
/// # Examples
///
/// ```rust
/// use refgraph::persistent::{PersistentHashMap, TransientHashMap};
///
/// let mut transient = TransientHashMap::new();
/// assert_eq!(transient.insert(1, "one"), None);
/// assert_eq!(transient.insert(1, "uno"), Some("one"));
///
/// let persistent: PersistentHashMap<i32, &str> = transient.persistent();
/// assert_eq!(persistent.get(&1), Some(&"uno"));
/// ```
pub struct TransientHashMap<K, V> {
    inner: PersistentHashMap<K, V>,
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientHashMap<u32, u32>: Send, Sync);

impl<K, V> TransientHashMap<K, V> {
    /// Returns the number of entries in the map.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over the entries of the map.
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        self.inner.iter()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> TransientHashMap<K, V> {
    /// Creates a new empty transient map.
    #[must_use]
    pub fn new() -> Self {
        PersistentHashMap::new().transient()
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Binds the key to the value, returning the previous value if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert_in_place(key, value)
    }

    /// Removes the key, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove_in_place(key)
    }

    /// Converts this transient map into a persistent map in O(1).
    #[must_use]
    pub fn persistent(self) -> PersistentHashMap<K, V> {
        self.inner
    }

    /// Returns a persistent snapshot of the current contents in O(1).
    ///
    /// The transient stays usable; its next write to any node now shared
    /// with the snapshot copies that node first.
    #[must_use]
    pub fn to_persistent(&self) -> PersistentHashMap<K, V> {
        self.inner.clone()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Default for TransientHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TransientHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TransientHashMap")
            .field("entries", &self.inner)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
