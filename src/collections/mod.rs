//! Mutable and compact index containers.
//!
//! - [`IntBiMap`] / [`MutableIntBiMap`]: unique integer key-value pairs
//! - [`IntMultiMap`] / [`MutableIntMultiMap`]: integer key to ordered value set
//! - [`BidirectionalMap`]: many-to-one map with shared-value tracking
//! - [`PrefixTreeMap`]: trie keyed by segment paths
//!
//! The persistent counterpart of [`BidirectionalMap`] lives in
//! [`crate::persistent`].

pub(crate) mod bidirectional_map;
mod int_bimap;
mod int_multimap;
mod prefix_tree;

pub use bidirectional_map::BidirectionalMap;
pub use bidirectional_map::BidirectionalRead;
pub use bidirectional_map::KeySlot;
pub use int_bimap::IntBiMap;
pub use int_bimap::MutableIntBiMap;
pub use int_multimap::IntMultiMap;
pub use int_multimap::IntMultiMapRead;
pub use int_multimap::MutableIntMultiMap;
pub use prefix_tree::PrefixTreeMap;
