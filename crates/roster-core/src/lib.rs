//! # Roster Core
//!
//! Keyed component registry for the Roster framework.
//!
//! Independently written implementations of a capability register themselves
//! under a key; consumers look up one implementation by key or the whole
//! group, without hand-written wiring.
//!
//! ## Building blocks
//!
//! - **Contract**: [`Keyed`]: every registrable type reports its key
//! - **Store**: [`Registry`]: one group's `key → [entry]` map with
//!   singleton/transient policies per entry
//! - **Container**: [`Container`]: `group → registry`, the single point of truth
//! - **Views**: [`SingletonView`]: first-entry-per-key projection of a group
//! - **Injection**: [`InjectCollection`], [`InjectOne`]: lazily resolved cells
//! - **Registration**: [`ComponentRegistration`] / [`COMPONENTS`]: link-time
//!   records emitted by `#[component]`
//!
//! ```text
//! ┌──────────────┐  install   ┌───────────┐  group   ┌──────────┐
//! │ #[component] │──────────▶│ Container │─────────▶│ Registry │──▶ Arc<dyn Capability>
//! └──────────────┘            └───────────┘          └──────────┘
//! ```

pub mod component;
pub mod container;
pub mod error;
pub mod inject;
pub mod keyed;
pub mod registry;
pub mod view;

pub use component::{COMPONENTS, ComponentRegistration, InstallFn, components_declared_in, linked_components};
pub use container::{Container, RegistryInfo};
pub use error::{BoxError, RegistryError, RegistryResult};
pub use inject::{InjectCollection, InjectOne};
pub use keyed::{CapabilityMeta, Keyed, RegistryKey};
pub use registry::{Factory, RegistrationEntry, Registry};
pub use view::SingletonView;

#[doc(hidden)]
pub use linkme;
