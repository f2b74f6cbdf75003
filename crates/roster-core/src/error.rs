//! Registry error types.
//!
//! Lookups never fail for "not found"; absence is always an empty result.
//! The errors here cover the two cases that can actually go wrong: a factory
//! failing while constructing an instance, and a group being addressed through
//! a different capability type than the one it was created with.

use thiserror::Error;

/// Error type produced by component factories.
///
/// Factory errors are handed back to the caller exactly as the factory
/// returned them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while registering components.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The throwaway instance built to read a component's key failed to construct.
    #[error("Failed to construct probe instance for group '{group}': {source}")]
    Probe {
        group: String,
        #[source]
        source: BoxError,
    },

    /// The group already holds components of another capability type.
    #[error("Group '{group}' holds `{found}`, not `{expected}`")]
    GroupTypeMismatch {
        group: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl RegistryError {
    /// Creates a probe error for the given group.
    pub fn probe(group: impl Into<String>, source: BoxError) -> Self {
        Self::Probe {
            group: group.into(),
            source,
        }
    }

    /// Returns the group the error refers to.
    pub fn group(&self) -> &str {
        match self {
            Self::Probe { group, .. } | Self::GroupTypeMismatch { group, .. } => group,
        }
    }
}

/// Result type for registration operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
