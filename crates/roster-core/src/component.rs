//! Link-time component registrations.
//!
//! The `#[component]` attribute appends one [`ComponentRegistration`] per
//! annotated type to the [`COMPONENTS`] distributed slice. Nothing is
//! registered until a registration is *installed* into a [`Container`]; module
//! loaders in `roster-discovery` install every registration declared in a file
//! when that file is loaded, which is the Rust counterpart of "register when
//! the type is loaded".

use std::path::Path;

use linkme::distributed_slice;

use crate::container::Container;
use crate::error::RegistryResult;

/// Installs one component into a container and returns its key as text.
pub type InstallFn = fn(&Container) -> RegistryResult<String>;

/// A static, `Copy` record produced by `#[component]`.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRegistration {
    /// Name of the annotated type.
    pub type_name: &'static str,

    /// Group the component registers under.
    pub group: &'static str,

    /// Whether resolutions share one instance.
    pub singleton: bool,

    /// Source file that declared the component (`file!()`).
    pub source: &'static str,

    /// Registers the component, probing its key.
    pub register: InstallFn,
}

impl ComponentRegistration {
    /// Registers this component into `container`.
    #[inline]
    pub fn install(&self, container: &Container) -> RegistryResult<String> {
        (self.register)(container)
    }

    /// Returns `true` if this component was declared in the file at `path`.
    ///
    /// `source` is relative to wherever the compiler was invoked, so the match
    /// is a component-wise suffix match against `path`. Several files may
    /// match one registration; loaders install it once.
    pub fn is_declared_in(&self, path: &Path) -> bool {
        path.ends_with(self.source)
    }
}

/// Every component registration linked into the binary.
#[distributed_slice]
pub static COMPONENTS: [ComponentRegistration];

/// Iterates over the linked component registrations.
pub fn linked_components() -> impl Iterator<Item = &'static ComponentRegistration> {
    COMPONENTS.iter()
}

/// Returns the registrations declared in the file at `path`.
pub fn components_declared_in(path: &Path) -> Vec<&'static ComponentRegistration> {
    linked_components()
        .filter(|registration| registration.is_declared_in(path))
        .collect()
}
