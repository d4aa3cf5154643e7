//! Prefix tree (trie) map keyed by segment sequences.
//!
//! Each node holds an optional value and its children ordered by segment.
//! A node that holds no value and has no children is pruned as soon as a
//! removal leaves it that way, and every node keeps the number of values in
//! its subtree up to date on the way back from each insertion or removal.
//!
//! Ancestors are reported farthest-first (from the root towards the queried
//! path); descendants in pre-order with sibling segments in ascending order.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::collections::PrefixTreeMap;
//!
//! let mut tree = PrefixTreeMap::new();
//! tree.insert(&["src"], 1);
//! tree.insert(&["src", "main"], 2);
//! tree.insert(&["src", "main", "lib"], 3);
//!
//! let ancestors: Vec<_> = tree
//!     .ancestors(&["src", "main", "lib"])
//!     .into_iter()
//!     .map(|(_, v)| *v)
//!     .collect();
//! assert_eq!(ancestors, vec![1, 2, 3]);
//!
//! assert_eq!(tree.remove(&["src", "main"]), Some(2));
//! assert_eq!(tree.descendants(&["src"]).len(), 2);
//! assert_eq!(tree.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

struct Node<S, V> {
    value: Option<V>,
    children: BTreeMap<S, Node<S, V>>,
    size: usize,
}

impl<S, V> Node<S, V> {
    const fn new() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
            size: 0,
        }
    }

    fn is_vacant(&self) -> bool {
        self.value.is_none() && self.children.is_empty()
    }
}

impl<S: Clone, V: Clone> Clone for Node<S, V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            children: self.children.clone(),
            size: self.size,
        }
    }
}

/// A map from segment paths to values with prefix queries.
///
/// # Time Complexity
///
/// | Operation      | Complexity              |
/// |----------------|-------------------------|
/// | `get`          | O(d log b)              |
/// | `insert`       | O(d log b)              |
/// | `remove`       | O(d log b)              |
/// | `ancestors`    | O(d log b)              |
/// | `descendants`  | O(d log b + m)          |
/// | `len`          | O(1)                    |
///
/// `d` is the path length, `b` the branching factor and `m` the number of
/// reported entries.
pub struct PrefixTreeMap<S, V> {
    root: Node<S, V>,
}

impl<S, V> PrefixTreeMap<S, V> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: Node::new() }
    }

    /// Returns the number of paths holding a value.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.root.size
    }

    /// Returns `true` if no path holds a value.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.size == 0
    }
}

impl<S: Ord + Clone, V> PrefixTreeMap<S, V> {
    fn node(&self, path: &[S]) -> Option<&Node<S, V>> {
        path.iter()
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }

    /// Returns the value stored at the path.
    #[must_use]
    pub fn get(&self, path: &[S]) -> Option<&V> {
        self.node(path)?.value.as_ref()
    }

    /// Returns a mutable reference to the value stored at the path.
    pub fn get_mut(&mut self, path: &[S]) -> Option<&mut V> {
        path.iter()
            .try_fold(&mut self.root, |node, segment| node.children.get_mut(segment))?
            .value
            .as_mut()
    }

    /// Returns `true` if the path holds a value.
    #[must_use]
    pub fn contains_key(&self, path: &[S]) -> bool {
        self.get(path).is_some()
    }

    /// Stores the value at the path, returning the value it replaced.
    pub fn insert(&mut self, path: &[S], value: V) -> Option<V> {
        fn descend<S: Ord + Clone, V>(node: &mut Node<S, V>, path: &[S], value: V) -> Option<V> {
            let previous = match path.split_first() {
                None => node.value.replace(value),
                Some((segment, rest)) => {
                    let child = node
                        .children
                        .entry(segment.clone())
                        .or_insert_with(Node::new);
                    descend(child, rest, value)
                }
            };
            if previous.is_none() {
                node.size += 1;
            }
            previous
        }
        descend(&mut self.root, path, value)
    }

    /// Removes the value at the path and prunes the nodes left empty.
    pub fn remove(&mut self, path: &[S]) -> Option<V> {
        fn descend<S: Ord, V>(node: &mut Node<S, V>, path: &[S]) -> Option<V> {
            let removed = match path.split_first() {
                None => node.value.take(),
                Some((segment, rest)) => {
                    let child = node.children.get_mut(segment)?;
                    let removed = descend(child, rest);
                    if child.is_vacant() {
                        node.children.remove(segment);
                    }
                    removed
                }
            };
            if removed.is_some() {
                node.size -= 1;
            }
            removed
        }
        descend(&mut self.root, path)
    }

    /// Returns every entry whose path is a prefix of `path`, the path itself
    /// included, farthest-first.
    #[must_use]
    pub fn ancestors(&self, path: &[S]) -> Vec<(Vec<S>, &V)> {
        let mut found = Vec::new();
        let mut node = &self.root;
        for depth in 0..=path.len() {
            if let Some(value) = &node.value {
                found.push((path[..depth].to_vec(), value));
            }
            match path.get(depth).and_then(|segment| node.children.get(segment)) {
                Some(child) => node = child,
                None => break,
            }
        }
        found
    }

    /// Returns every entry whose path starts with `path`, the path itself
    /// included, in pre-order.
    #[must_use]
    pub fn descendants(&self, path: &[S]) -> Vec<(Vec<S>, &V)> {
        fn collect<'a, S: Clone, V>(
            node: &'a Node<S, V>,
            prefix: &mut Vec<S>,
            found: &mut Vec<(Vec<S>, &'a V)>,
        ) {
            if let Some(value) = &node.value {
                found.push((prefix.clone(), value));
            }
            for (segment, child) in &node.children {
                prefix.push(segment.clone());
                collect(child, prefix, found);
                prefix.pop();
            }
        }

        let mut found = Vec::new();
        if let Some(node) = self.node(path) {
            found.reserve(node.size);
            collect(node, &mut path.to_vec(), &mut found);
        }
        found
    }

    /// Returns every entry in pre-order.
    #[must_use]
    pub fn entries(&self) -> Vec<(Vec<S>, &V)> {
        self.descendants(&[])
    }
}

impl<S, V> Default for PrefixTreeMap<S, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone, V: Clone> Clone for PrefixTreeMap<S, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<S: Ord + Clone, V> FromIterator<(Vec<S>, V)> for PrefixTreeMap<S, V> {
    fn from_iter<I: IntoIterator<Item = (Vec<S>, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        for (path, value) in iter {
            tree.insert(&path, value);
        }
        tree
    }
}

impl<S: Ord + Clone + fmt::Debug, V: fmt::Debug> fmt::Debug for PrefixTreeMap<S, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.entries()).finish()
    }
}
