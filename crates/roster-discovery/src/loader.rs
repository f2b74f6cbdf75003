//! Module loading.
//!
//! A [`ModuleLoader`] turns one discovered file into registered components.
//! The production loader, [`LinkedModuleLoader`], installs every
//! `#[component]` registration linked into the binary whose declaring source
//! file is the discovered file. Loading a file twice is the scanner's concern;
//! installing a registration twice is the loader's: each registration is
//! installed at most once per loader, however many paths declare it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use roster_core::{ComponentRegistration, Container, linked_components};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::LoadError;

/// One component installed by a module load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedComponent {
    pub type_name: String,
    pub group: String,
    pub key: String,
}

/// Outcome of loading one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedModule {
    pub path: PathBuf,
    pub components: Vec<LoadedComponent>,
}

impl LoadedModule {
    /// Creates an empty module record.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            components: Vec::new(),
        }
    }

    /// Adds one installed component.
    pub fn with_component(
        mut self,
        type_name: impl Into<String>,
        group: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.components.push(LoadedComponent {
            type_name: type_name.into(),
            group: group.into(),
            key: key.into(),
        });
        self
    }
}

/// Loads one discovered file into a container.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Loads the file at `path`, registering whatever it declares.
    async fn load(&self, path: &Path, container: &Container) -> Result<LoadedModule, LoadError>;

    /// Forgets what has been installed, after the container was cleared.
    fn forget_installed(&self) {}
}

/// Installs link-time `#[component]` registrations by source file.
#[derive(Debug)]
pub struct LinkedModuleLoader {
    registrations: Vec<&'static ComponentRegistration>,
    /// Addresses of registrations installed or being installed.
    installed: Mutex<HashSet<usize>>,
}

impl Default for LinkedModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkedModuleLoader {
    /// Creates a loader over every registration linked into the binary.
    pub fn new() -> Self {
        Self::from_registrations(linked_components())
    }

    /// Creates a loader over an explicit set of registrations.
    pub fn from_registrations(registrations: impl IntoIterator<Item = &'static ComponentRegistration>) -> Self {
        Self {
            registrations: registrations.into_iter().collect(),
            installed: Mutex::new(HashSet::new()),
        }
    }

    /// Number of registrations this loader can install.
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    fn declared_in(&self, path: &Path) -> Vec<&'static ComponentRegistration> {
        self.registrations
            .iter()
            .copied()
            .filter(|registration| registration.is_declared_in(path))
            .collect()
    }

    /// Returns `true` if `registration` has been installed by this loader.
    pub fn is_installed(&self, registration: &'static ComponentRegistration) -> bool {
        self.installed.lock().contains(&identity(registration))
    }

    fn reserve(&self, registration: &'static ComponentRegistration) -> bool {
        self.installed.lock().insert(identity(registration))
    }

    fn release(&self, registration: &'static ComponentRegistration) {
        self.installed.lock().remove(&identity(registration));
    }
}

fn identity(registration: &'static ComponentRegistration) -> usize {
    std::ptr::from_ref(registration) as usize
}

#[async_trait]
impl ModuleLoader for LinkedModuleLoader {
    async fn load(&self, path: &Path, container: &Container) -> Result<LoadedModule, LoadError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(LoadError::NotLinked(path.to_path_buf()));
        }

        let declared = self.declared_in(path);
        if declared.is_empty() {
            return Err(LoadError::NotLinked(path.to_path_buf()));
        }

        let mut module = LoadedModule::new(path);
        let mut first_failure = None;

        // Siblings still install when one component fails. Only the failed
        // ones are attempted again on a later load.
        for registration in declared {
            if !self.reserve(registration) {
                trace!(component = registration.type_name, "Component already installed");
                continue;
            }
            match registration.install(container) {
                Ok(key) => {
                    trace!(
                        component = registration.type_name,
                        group = registration.group,
                        key = %key,
                        "Installed component"
                    );
                    module = module.with_component(registration.type_name, registration.group, key);
                }
                Err(source) => {
                    self.release(registration);
                    warn!(
                        component = registration.type_name,
                        group = registration.group,
                        error = %source,
                        "Component failed to install"
                    );
                    first_failure.get_or_insert(LoadError::Install {
                        path: path.to_path_buf(),
                        type_name: registration.type_name.to_string(),
                        source,
                    });
                }
            }
        }

        if let Some(failure) = first_failure {
            return Err(failure);
        }

        debug!(path = %path.display(), components = module.components.len(), "Module loaded");
        Ok(module)
    }

    fn forget_installed(&self) {
        self.installed.lock().clear();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn write_file(dir: &Path, relative: &str) -> PathBuf {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "// component source\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_installs_components_declared_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let stripe = write_file(dir.path(), "src/processors/stripe.rs");
        let container = Container::new();
        let loader = LinkedModuleLoader::from_registrations([&STRIPE, &PAYPAL]);

        let module = loader.load(&stripe, &container).await.unwrap();

        assert_eq!(module.components.len(), 1);
        assert_eq!(module.components[0].key, "stripe");
        assert!(container.has_for::<dyn Processor>(&"stripe".to_string()));
        assert!(!container.has_for::<dyn Processor>(&"paypal".to_string()));
    }

    #[tokio::test]
    async fn test_file_without_components_is_not_linked() {
        let dir = tempfile::tempdir().unwrap();
        let helper = write_file(dir.path(), "src/util.rs");
        let loader = LinkedModuleLoader::from_registrations([&STRIPE]);

        let err = loader.load(&helper, &Container::new()).await.unwrap_err();

        assert!(matches!(err, LoadError::NotLinked(_)));
        assert!(err.is_expected());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = LinkedModuleLoader::from_registrations([&STRIPE]);

        let err = loader
            .load(&dir.path().join("src/processors/stripe.rs"), &Container::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.is_expected());
    }

    #[tokio::test]
    async fn test_install_failure_keeps_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let paypal = write_file(dir.path(), "src/processors/paypal.rs");
        let container = Container::new();
        let loader = LinkedModuleLoader::from_registrations([&BROKEN, &PAYPAL]);

        let err = loader.load(&paypal, &container).await.unwrap_err();

        assert!(matches!(err, LoadError::Install { ref type_name, .. } if type_name == "Broken"));
        assert!(!err.is_expected());
        assert!(container.has_for::<dyn Processor>(&"paypal".to_string()));
        assert!(loader.is_installed(&PAYPAL));
        assert!(!loader.is_installed(&BROKEN));
    }

    #[tokio::test]
    async fn test_retry_after_partial_failure_does_not_duplicate_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let paypal = write_file(dir.path(), "src/processors/paypal.rs");
        let container = Container::new();
        let loader = LinkedModuleLoader::from_registrations([&BROKEN, &PAYPAL]);

        loader.load(&paypal, &container).await.unwrap_err();
        let err = loader.load(&paypal, &container).await.unwrap_err();

        assert!(matches!(err, LoadError::Install { ref type_name, .. } if type_name == "Broken"));
        let registry = container.registry::<dyn Processor>("Processor").unwrap();
        assert_eq!(registry.entry_count(&"paypal".to_string()), 1);
    }

    #[tokio::test]
    async fn test_same_relative_path_under_two_roots_installs_once() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = write_file(first.path(), "src/processors/stripe.rs");
        let b = write_file(second.path(), "src/processors/stripe.rs");
        let container = Container::new();
        let loader = LinkedModuleLoader::from_registrations([&STRIPE]);

        let loaded = loader.load(&a, &container).await.unwrap();
        let again = loader.load(&b, &container).await.unwrap();

        assert_eq!(loaded.components.len(), 1);
        assert!(again.components.is_empty());
        let registry = container.registry::<dyn Processor>("Processor").unwrap();
        assert_eq!(registry.entry_count(&"stripe".to_string()), 1);
    }

    #[tokio::test]
    async fn test_forget_installed_allows_reinstall_into_cleared_container() {
        let dir = tempfile::tempdir().unwrap();
        let stripe = write_file(dir.path(), "src/processors/stripe.rs");
        let container = Container::new();
        let loader = LinkedModuleLoader::from_registrations([&STRIPE]);

        loader.load(&stripe, &container).await.unwrap();
        container.clear_all();
        loader.forget_installed();
        let module = loader.load(&stripe, &container).await.unwrap();

        assert_eq!(module.components.len(), 1);
        assert!(container.has_for::<dyn Processor>(&"stripe".to_string()));
    }
}
