//! Entity references: identifiers, relation descriptors, reference tables
//! and typed accessors.
//!
//! - [`EntityId`] / [`EntityTypeId`]: compact entity identifiers
//! - [`ConnectionId`] / [`ConnectionRegistry`]: relation descriptors
//! - [`RefsTable`] / [`MutableRefsTable`]: per-relation containers with
//!   snapshot/builder semantics
//! - [`Relation`]: typed accessors over any
//!   [`ReferenceStorage`](crate::storage::ReferenceStorage)

mod accessor;
mod connection;
mod entity_id;
mod table;

pub use accessor::Many;
pub use accessor::ManyChildrenAccessor;
pub use accessor::One;
pub use accessor::OneChildAccessor;
pub use accessor::ParentAccessor;
pub use accessor::Relation;
pub use connection::ConnectionId;
pub use connection::ConnectionRegistry;
pub use connection::ConnectionType;
pub use entity_id::EntityId;
pub use entity_id::EntityTypeId;
pub use table::Children;
pub use table::MutableRefsTable;
pub use table::RefsContainer;
pub use table::RefsRead;
pub use table::RefsTable;
