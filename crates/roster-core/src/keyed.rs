//! The keyed-entity contract.
//!
//! Every registrable implementation reports the key it occupies within its
//! group. Capabilities are ordinary traits that carry [`Keyed`] as a supertrait
//! with a concrete key type:
//!
//! ```rust,ignore
//! pub trait PaymentProcessor: Keyed<Key = String> {
//!     fn charge(&self, cents: u64) -> Result<String, BoxError>;
//! }
//! ```
//!
//! Instances are stored and handed out as `Arc<dyn PaymentProcessor>`.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Bounds required of a key type.
///
/// Blanket-implemented for every type that satisfies them. `Display` is used
/// for introspection output and log fields.
pub trait RegistryKey: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static {}

impl<K> RegistryKey for K where K: Eq + Hash + Clone + Debug + Display + Send + Sync + 'static {}

/// A value that can identify the slot it occupies within a group.
pub trait Keyed: Send + Sync + 'static {
    /// The key type shared by every member of the group.
    type Key: RegistryKey;

    /// Returns the key this instance registers under.
    fn key(&self) -> Self::Key;
}

/// Associates a capability type with its group name.
///
/// Implemented for `dyn Trait` by the `#[capability]` attribute. A group named
/// through a capability type and one named by an equal string resolve to the
/// same registry.
pub trait CapabilityMeta {
    /// The group this capability's implementations register under.
    const GROUP: &'static str;
}
