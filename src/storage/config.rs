//! Storage configuration.

/// When the storage verifies its reference invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConsistencyCheckingMode {
    /// Never check.
    #[default]
    Disabled,
    /// Check every snapshot produced by a builder; a failure is logged and
    /// recorded on the snapshot.
    Strict,
}

/// Runtime configuration of an entity storage.
///
/// # Examples
///
/// ```rust
/// use refgraph::storage::{ConsistencyCheckingMode, StorageConfig};
///
/// let config = StorageConfig::default();
/// assert_eq!(config.consistency_checking, ConsistencyCheckingMode::Disabled);
/// assert_eq!(StorageConfig::strict().consistency_checking, ConsistencyCheckingMode::Strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StorageConfig {
    /// When reference invariants are verified.
    pub consistency_checking: ConsistencyCheckingMode,
}

impl StorageConfig {
    /// A configuration that checks every snapshot.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            consistency_checking: ConsistencyCheckingMode::Strict,
        }
    }

    /// Returns this configuration with another checking mode.
    #[must_use]
    pub const fn with_consistency_checking(mut self, mode: ConsistencyCheckingMode) -> Self {
        self.consistency_checking = mode;
        self
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.consistency_checking == ConsistencyCheckingMode::Strict
    }
}
