//! Persistent (immutable) data structures.
//!
//! This module provides the structurally shared tables the reference index
//! is built on:
//!
//! - [`PersistentHashMap`]: Persistent hash map (HAMT)
//! - [`PersistentHashSet`]: Persistent hash set (based on HAMT)
//! - [`PersistentBidirectionalMap`]: Many-to-one bidirectional map with a
//!   [`BidirectionalMapBuilder`] producing the next snapshot
//!
//! # Structural Sharing
//!
//! Nodes are reference counted. A transient or builder derived from a
//! snapshot shares every node with it and copies a node only when it writes
//! through a shared one, so the snapshot is never observed changing.
//!
//! # Examples
//!
//! ```rust
//! use refgraph::persistent::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//! assert_eq!(map.get("one"), Some(&1));
//!
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(updated.get("one"), Some(&100));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod bidirectional_map;
mod hashmap;
mod hashset;

pub use bidirectional_map::BidirectionalMapBuilder;
pub use bidirectional_map::PersistentBidirectionalMap;
pub use hashmap::PersistentHashMap;
pub use hashmap::PersistentHashMapIterator;
pub use hashmap::TransientHashMap;
pub use hashset::PersistentHashSet;
pub use hashset::TransientHashSet;

// =============================================================================
// Tests
// =============================================================================
