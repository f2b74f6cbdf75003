//! The component container.
//!
//! [`Container`] owns every group's [`Registry`] and is the single point of
//! truth for lookups. It is an ordinary value: construct one, share it behind
//! an `Arc`, and hand it to whatever needs it. [`Container::clear_all`] resets
//! it between tests.
//!
//! # Typed access over erased storage
//!
//! Groups are stored type-erased; every typed operation names the capability
//! type it expects, usually a `dyn Trait`:
//!
//! ```rust,ignore
//! let container = Container::new();
//! container.register_component::<dyn PaymentProcessor, _>(
//!     "payment-processors",
//!     || Ok(Arc::new(Stripe::default()) as Arc<dyn PaymentProcessor>),
//!     true,
//! )?;
//!
//! let stripe = container.get::<dyn PaymentProcessor>("payment-processors", &"stripe".into())?;
//! ```
//!
//! The `*_for` variants take the group from [`CapabilityMeta`] instead of a
//! string; both notations address the same registry.
//!
//! # Failure semantics
//!
//! Unknown groups and unknown keys produce empty results, never errors. A
//! factory error is passed back to the caller unchanged.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BoxError, RegistryError, RegistryResult};
use crate::keyed::{CapabilityMeta, Keyed};
use crate::registry::Registry;
use crate::view::SingletonView;

/// Object-safe view of a [`Registry`] for introspection across groups.
trait ErasedRegistry: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn key_labels(&self) -> Vec<String>;
    fn clear(&self);
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: ?Sized + Keyed> ErasedRegistry for Registry<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn len(&self) -> usize {
        Registry::len(self)
    }

    fn key_labels(&self) -> Vec<String> {
        self.keys().iter().map(ToString::to_string).collect()
    }

    fn clear(&self) {
        Registry::clear(self);
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Introspection snapshot of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryInfo {
    /// Group name.
    pub name: String,
    /// Number of distinct keys.
    pub size: usize,
    /// Keys in first-registration order, rendered with `Display`.
    pub keys: Vec<String>,
}

/// Process-wide store of group name → registry.
#[derive(Default)]
pub struct Container {
    registries: RwLock<HashMap<String, Arc<dyn ErasedRegistry>>>,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the typed registry for `group`, if it exists.
    ///
    /// A group created for another capability type reads as absent.
    pub fn registry<T: ?Sized + Keyed>(&self, group: &str) -> Option<Arc<Registry<T>>> {
        let erased = self.registries.read().get(group).cloned()?;
        let found = erased.type_name();
        match erased.as_any().downcast::<Registry<T>>() {
            Ok(registry) => Some(registry),
            Err(_) => {
                warn!(
                    group,
                    expected = std::any::type_name::<T>(),
                    found,
                    "Group accessed through a different capability type"
                );
                None
            }
        }
    }

    /// Returns the typed registry for `group`, creating it on first write.
    fn registry_or_create<T: ?Sized + Keyed>(&self, group: &str) -> RegistryResult<Arc<Registry<T>>> {
        let erased = {
            let mut registries = self.registries.write();
            Arc::clone(registries.entry(group.to_string()).or_insert_with(|| {
                debug!(group, capability = std::any::type_name::<T>(), "Created registry");
                let created: Arc<dyn ErasedRegistry> = Arc::new(Registry::<T>::new(group));
                created
            }))
        };

        let found = erased.type_name();
        erased
            .as_any()
            .downcast::<Registry<T>>()
            .map_err(|_| RegistryError::GroupTypeMismatch {
                group: group.to_string(),
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a component whose key is read from a probe instance.
    ///
    /// One throwaway instance is constructed immediately so its key can be
    /// read; it is dropped before the registration is recorded. Factories
    /// passed here must therefore be cheap and free of observable side
    /// effects. Use [`register_keyed`](Self::register_keyed) when the key is
    /// known without constructing anything.
    pub fn register_component<T, F>(&self, group: &str, factory: F, singleton: bool) -> RegistryResult<T::Key>
    where
        T: ?Sized + Keyed,
        F: Fn() -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let registry = self.registry_or_create::<T>(group)?;
        let key = factory()
            .map_err(|source| RegistryError::probe(group, source))?
            .key();

        registry.register(key.clone(), factory, singleton);
        debug!(group, key = %key, singleton, "Registered component");
        Ok(key)
    }

    /// Registers a component under an explicit key, without probing.
    pub fn register_keyed<T, F>(&self, group: &str, key: T::Key, factory: F, singleton: bool) -> RegistryResult<()>
    where
        T: ?Sized + Keyed,
        F: Fn() -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let registry = self.registry_or_create::<T>(group)?;
        debug!(group, key = %key, singleton, "Registered component");
        registry.register(key, factory, singleton);
        Ok(())
    }

    /// Registers an already constructed instance as a singleton.
    pub fn register_instance<T: ?Sized + Keyed>(&self, group: &str, instance: Arc<T>) -> RegistryResult<T::Key> {
        let registry = self.registry_or_create::<T>(group)?;
        let key = registry.register_instance(instance);
        debug!(group, key = %key, "Registered instance");
        Ok(key)
    }

    /// [`register_component`](Self::register_component) with the group taken from `T`.
    pub fn register_component_for<T, F>(&self, factory: F, singleton: bool) -> RegistryResult<T::Key>
    where
        T: ?Sized + Keyed + CapabilityMeta,
        F: Fn() -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.register_component(T::GROUP, factory, singleton)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolves the first component registered under `key`.
    pub fn get<T: ?Sized + Keyed>(&self, group: &str, key: &T::Key) -> Result<Option<Arc<T>>, BoxError> {
        match self.registry::<T>(group) {
            Some(registry) => registry.resolve(key),
            None => Ok(None),
        }
    }

    /// Resolves one instance per key.
    pub fn get_all<T: ?Sized + Keyed>(&self, group: &str) -> Result<IndexMap<T::Key, Arc<T>>, BoxError> {
        match self.registry::<T>(group) {
            Some(registry) => registry.all_as_singleton_map(),
            None => Ok(IndexMap::new()),
        }
    }

    /// Resolves every entry of every key.
    pub fn get_all_collections<T: ?Sized + Keyed>(
        &self,
        group: &str,
    ) -> Result<IndexMap<T::Key, Vec<Arc<T>>>, BoxError> {
        match self.registry::<T>(group) {
            Some(registry) => registry.all_as_collection_map(),
            None => Ok(IndexMap::new()),
        }
    }

    /// Returns a [`SingletonView`] over the group's current contents.
    pub fn singleton_view<T: ?Sized + Keyed>(&self, group: &str) -> Result<SingletonView<T>, BoxError> {
        Ok(SingletonView::new(group, self.get_all_collections(group)?))
    }

    /// Returns `true` if `key` is registered in `group`.
    pub fn has<T: ?Sized + Keyed>(&self, group: &str, key: &T::Key) -> bool {
        self.registry::<T>(group)
            .is_some_and(|registry| registry.contains(key))
    }

    /// Returns the keys of `group` in first-registration order.
    pub fn keys<T: ?Sized + Keyed>(&self, group: &str) -> Vec<T::Key> {
        self.registry::<T>(group)
            .map(|registry| registry.keys())
            .unwrap_or_default()
    }

    /// [`get`](Self::get) with the group taken from `T`.
    pub fn get_for<T: ?Sized + Keyed + CapabilityMeta>(&self, key: &T::Key) -> Result<Option<Arc<T>>, BoxError> {
        self.get(T::GROUP, key)
    }

    /// [`get_all`](Self::get_all) with the group taken from `T`.
    pub fn get_all_for<T: ?Sized + Keyed + CapabilityMeta>(&self) -> Result<IndexMap<T::Key, Arc<T>>, BoxError> {
        self.get_all(T::GROUP)
    }

    /// [`get_all_collections`](Self::get_all_collections) with the group taken from `T`.
    pub fn get_all_collections_for<T: ?Sized + Keyed + CapabilityMeta>(
        &self,
    ) -> Result<IndexMap<T::Key, Vec<Arc<T>>>, BoxError> {
        self.get_all_collections(T::GROUP)
    }

    /// [`singleton_view`](Self::singleton_view) with the group taken from `T`.
    pub fn singleton_view_for<T: ?Sized + Keyed + CapabilityMeta>(&self) -> Result<SingletonView<T>, BoxError> {
        self.singleton_view(T::GROUP)
    }

    /// [`has`](Self::has) with the group taken from `T`.
    pub fn has_for<T: ?Sized + Keyed + CapabilityMeta>(&self, key: &T::Key) -> bool {
        self.has::<T>(T::GROUP, key)
    }

    /// [`keys`](Self::keys) with the group taken from `T`.
    pub fn keys_for<T: ?Sized + Keyed + CapabilityMeta>(&self) -> Vec<T::Key> {
        self.keys::<T>(T::GROUP)
    }

    // =========================================================================
    // Introspection and reset
    // =========================================================================

    /// Returns every known group name, sorted.
    pub fn registry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registries.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Describes one group without resolving anything.
    pub fn registry_info(&self, group: &str) -> Option<RegistryInfo> {
        let registries = self.registries.read();
        let registry = registries.get(group)?;
        Some(RegistryInfo {
            name: group.to_string(),
            size: registry.len(),
            keys: registry.key_labels(),
        })
    }

    /// Total number of keys across all groups.
    pub fn total_keys(&self) -> usize {
        self.registries.read().values().map(|r| r.len()).sum()
    }

    /// Removes every registration in `group`. Returns `false` for an unknown group.
    pub fn clear_registry(&self, group: &str) -> bool {
        match self.registries.read().get(group) {
            Some(registry) => {
                registry.clear();
                debug!(group, "Cleared registry");
                true
            }
            None => false,
        }
    }

    /// Removes every group.
    pub fn clear_all(&self) {
        self.registries.write().clear();
        debug!("Cleared all registries");
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("groups", &self.registry_names())
            .finish()
    }
}
