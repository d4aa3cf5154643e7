//! # refgraph
//!
//! An entity-relationship indexing engine: typed parent/child references
//! between integer-identified entities, stored in compact containers with
//! snapshot/builder semantics.
//!
//! ## Overview
//!
//! - **Persistent Data Structures**: HAMT `HashMap`/`HashSet` and a
//!   many-to-one bidirectional map with a builder/commit protocol
//! - **Collections**: unique integer bi-map, integer multi-map, shared-value
//!   tracking bidirectional map, prefix tree map
//! - **References**: entity ids, relation descriptors, reference tables and
//!   typed accessors
//! - **Storage**: a minimal entity storage that scopes writes to builders
//!   and checks reference invariants
//!
//! A committed snapshot is never changed by the builder derived from it;
//! any number of readers may keep using it while the next generation is
//! built.
//!
//! ## Feature Flags
//!
//! - `arc`: share snapshot nodes through `Arc` so snapshots are `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for identifiers and configuration
//!
//! ## Example
//!
//! ```rust
//! use refgraph::prelude::*;
//!
//! const MODULE: EntityTypeId = EntityTypeId(1);
//! const FACET: EntityTypeId = EntityTypeId(2);
//! let facets = Relation::one_to_abstract_many(MODULE, FACET);
//!
//! let mut builder = MutableEntityStorage::new();
//! let module = builder.add_entity(MODULE);
//! let facet = builder.add_entity(FACET);
//! facets.children().set(&mut builder, module, &[facet]).unwrap();
//! let snapshot = builder.to_snapshot();
//!
//! builder.remove_entity(facet).unwrap();
//! assert_eq!(facets.children().get(&snapshot, module).unwrap().count(), 1);
//! assert_eq!(facets.children().get(&builder, module).unwrap().count(), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use refgraph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::collections::*;
    pub use crate::error::*;
    pub use crate::persistent::*;
    pub use crate::refs::*;
    pub use crate::storage::*;
}

pub mod collections;
pub mod error;
pub mod persistent;
pub mod refs;
pub mod storage;

#[cfg(feature = "arc")]
mod thread_safety {
    use crate::persistent::{PersistentBidirectionalMap, PersistentHashMap};
    use crate::refs::{EntityId, RefsTable};
    use crate::storage::EntityStorage;

    static_assertions::assert_impl_all!(PersistentHashMap<u64, String>: Send, Sync);
    static_assertions::assert_impl_all!(PersistentBidirectionalMap<EntityId, EntityId>: Send, Sync);
    static_assertions::assert_impl_all!(RefsTable: Send, Sync);
    static_assertions::assert_impl_all!(EntityStorage: Send, Sync);
}
