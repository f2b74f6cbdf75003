//! Per-group component registry.
//!
//! A [`Registry`] maps each key to an ordered list of registration entries.
//! Duplicate keys are not an error: every registration under a key is kept,
//! in registration order, so "all handlers for one event" can be modelled
//! directly.
//!
//! # Instantiation policy
//!
//! Each entry carries its own lifetime:
//!
//! - **singleton** entries construct their instance at most once and hand out
//!   the same `Arc` on every later resolution of that entry;
//! - **transient** entries construct a fresh instance on every resolution.
//!
//! The cache slot belongs to the entry, not the key, so two singleton entries
//! under one key yield two distinct instances.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::error::BoxError;
use crate::keyed::Keyed;

/// Shared factory that builds one instance of a component.
pub type Factory<T> = Arc<dyn Fn() -> Result<Arc<T>, BoxError> + Send + Sync>;

/// A single registration: a factory plus its instantiation policy.
pub struct RegistrationEntry<T: ?Sized + Keyed> {
    key: T::Key,
    factory: Factory<T>,
    singleton: bool,
    cached: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized + Keyed> RegistrationEntry<T> {
    fn new(key: T::Key, factory: Factory<T>, singleton: bool) -> Self {
        Self {
            key,
            factory,
            singleton,
            cached: Mutex::new(None),
        }
    }

    /// Returns the key this entry is registered under.
    pub fn key(&self) -> &T::Key {
        &self.key
    }

    /// Returns `true` if resolutions of this entry share one instance.
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Returns `true` if a singleton instance has already been constructed.
    pub fn is_cached(&self) -> bool {
        self.cached.lock().is_some()
    }

    /// Resolves this entry according to its policy.
    ///
    /// The cache slot stays locked while a singleton is being constructed, so
    /// concurrent resolutions of the same entry never build it twice. A factory
    /// must not resolve its own entry.
    pub fn resolve(&self) -> Result<Arc<T>, BoxError> {
        if !self.singleton {
            return (self.factory)();
        }

        let mut slot = self.cached.lock();
        if let Some(instance) = slot.as_ref() {
            return Ok(Arc::clone(instance));
        }
        let instance = (self.factory)()?;
        *slot = Some(Arc::clone(&instance));
        Ok(instance)
    }
}

impl<T: ?Sized + Keyed> std::fmt::Debug for RegistrationEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationEntry")
            .field("key", &self.key)
            .field("singleton", &self.singleton)
            .field("cached", &self.is_cached())
            .finish()
    }
}

type EntryList<T> = Vec<Arc<RegistrationEntry<T>>>;

/// Store for one group: key → ordered registration entries.
///
/// Keys keep their first-registration order. A key that is present always has
/// at least one entry.
pub struct Registry<T: ?Sized + Keyed> {
    name: String,
    entries: RwLock<IndexMap<T::Key, EntryList<T>>>,
}

impl<T: ?Sized + Keyed> Registry<T> {
    /// Creates an empty registry for the named group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Returns the group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a registration for `key`.
    ///
    /// Never fails; an existing key gains an additional entry.
    pub fn register<F>(&self, key: T::Key, factory: F, singleton: bool)
    where
        F: Fn() -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.register_factory(key, Arc::new(factory), singleton);
    }

    /// Appends a registration using an already shared factory.
    pub fn register_factory(&self, key: T::Key, factory: Factory<T>, singleton: bool) {
        let entry = Arc::new(RegistrationEntry::new(key.clone(), factory, singleton));
        self.entries.write().entry(key).or_default().push(entry);
    }

    /// Registers a pre-built instance as a singleton entry under its own key.
    pub fn register_instance(&self, instance: Arc<T>) -> T::Key {
        let key = instance.key();
        let shared = Arc::clone(&instance);
        let factory: Factory<T> = Arc::new(move || Ok::<_, BoxError>(Arc::clone(&shared)));
        let entry = RegistrationEntry::new(key.clone(), factory, true);
        *entry.cached.lock() = Some(instance);
        self.entries
            .write()
            .entry(key.clone())
            .or_default()
            .push(Arc::new(entry));
        key
    }

    /// Resolves the first entry registered under `key`.
    pub fn resolve(&self, key: &T::Key) -> Result<Option<Arc<T>>, BoxError> {
        let first = self
            .entries
            .read()
            .get(key)
            .and_then(|list| list.first().cloned());
        first.map(|entry| entry.resolve()).transpose()
    }

    /// Resolves every entry under `key`, in registration order.
    pub fn resolve_all(&self, key: &T::Key) -> Result<Vec<Arc<T>>, BoxError> {
        let list = self.entries.read().get(key).cloned().unwrap_or_default();
        list.iter().map(|entry| entry.resolve()).collect()
    }

    /// Resolves the first-registered entry of every key.
    pub fn all_as_singleton_map(&self) -> Result<IndexMap<T::Key, Arc<T>>, BoxError> {
        let firsts: Vec<_> = self
            .entries
            .read()
            .iter()
            .filter_map(|(key, list)| list.first().map(|e| (key.clone(), Arc::clone(e))))
            .collect();

        let mut resolved = IndexMap::with_capacity(firsts.len());
        for (key, entry) in firsts {
            resolved.insert(key, entry.resolve()?);
        }
        Ok(resolved)
    }

    /// Resolves every entry of every key.
    pub fn all_as_collection_map(&self) -> Result<IndexMap<T::Key, Vec<Arc<T>>>, BoxError> {
        let snapshot = self.entries.read().clone();

        let mut resolved = IndexMap::with_capacity(snapshot.len());
        for (key, list) in snapshot {
            let instances = list
                .iter()
                .map(|entry| entry.resolve())
                .collect::<Result<Vec<_>, _>>()?;
            resolved.insert(key, instances);
        }
        Ok(resolved)
    }

    /// Returns the known keys in first-registration order.
    pub fn keys(&self) -> Vec<T::Key> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns `true` if at least one entry exists for `key`.
    pub fn contains(&self, key: &T::Key) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns how many entries are registered under `key`.
    pub fn entry_count(&self, key: &T::Key) -> usize {
        self.entries.read().get(key).map_or(0, Vec::len)
    }

    /// Returns the entries registered under `key`.
    pub fn entries(&self, key: &T::Key) -> Vec<Arc<RegistrationEntry<T>>> {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Removes every registration, dropping cached instances.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T: ?Sized + Keyed> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Handler: Keyed<Key = String> {
        fn label(&self) -> &str;
    }

    struct Named {
        key: &'static str,
        label: &'static str,
    }

    impl Keyed for Named {
        type Key = String;

        fn key(&self) -> String {
            self.key.to_string()
        }
    }

    impl Handler for Named {
        fn label(&self) -> &str {
            self.label
        }
    }

    fn named(key: &'static str, label: &'static str) -> Result<Arc<dyn Handler>, BoxError> {
        Ok(Arc::new(Named { key, label }))
    }

    #[test]
    fn test_resolve_unknown_key() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        assert!(registry.resolve(&"missing".to_string()).unwrap().is_none());
        assert!(registry.resolve_all(&"missing".to_string()).unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_keys_accumulate_in_order() {
        let registry: Registry<dyn Handler> = Registry::new("event-handlers");
        registry.register("user_signup".into(), || named("user_signup", "welcome"), true);
        registry.register("user_signup".into(), || named("user_signup", "audit"), true);

        let key = "user_signup".to_string();
        let all = registry.resolve_all(&key).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].label(), "welcome");
        assert_eq!(all[1].label(), "audit");

        let first = registry.resolve(&key).unwrap().unwrap();
        assert_eq!(first.label(), "welcome");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entry_count(&key), 2);
    }

    #[test]
    fn test_singleton_entry_constructs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let registry: Registry<dyn Handler> = Registry::new("handlers");
        registry.register(
            "a".into(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                named("a", "a")
            },
            true,
        );

        let key = "a".to_string();
        let first = registry.resolve(&key).unwrap().unwrap();
        let second = registry.resolve(&key).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_singleton_resolution_constructs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let registry: Arc<Registry<dyn Handler>> = Arc::new(Registry::new("handlers"));
        registry.register(
            "slow".into(),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(10));
                named("slow", "slow")
            },
            true,
        );

        let instances: Vec<Arc<dyn Handler>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.resolve(&"slow".to_string()).unwrap().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
    }

    #[test]
    fn test_transient_entry_constructs_every_time() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        registry.register("a".into(), || named("a", "a"), false);

        let key = "a".to_string();
        let first = registry.resolve(&key).unwrap().unwrap();
        let second = registry.resolve(&key).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.key(), second.key());
    }

    #[test]
    fn test_singleton_cache_is_per_entry() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        registry.register("a".into(), || named("a", "one"), true);
        registry.register("a".into(), || named("a", "two"), true);

        let key = "a".to_string();
        let first = registry.resolve_all(&key).unwrap();
        let second = registry.resolve_all(&key).unwrap();
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert!(Arc::ptr_eq(&first[1], &second[1]));
        assert!(!Arc::ptr_eq(&first[0], &first[1]));
    }

    #[test]
    fn test_mixed_policies_under_one_key() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        registry.register("a".into(), || named("a", "cached"), true);
        registry.register("a".into(), || named("a", "fresh"), false);

        let key = "a".to_string();
        let first = registry.resolve_all(&key).unwrap();
        let second = registry.resolve_all(&key).unwrap();
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert!(!Arc::ptr_eq(&first[1], &second[1]));
    }

    #[test]
    fn test_factory_error_is_returned_unchanged() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        registry.register("broken".into(), || Err("gateway offline".into()), true);

        let err = registry.resolve(&"broken".to_string()).err().unwrap();
        assert_eq!(err.to_string(), "gateway offline");

        let entries = registry.entries(&"broken".to_string());
        assert!(!entries[0].is_cached());
    }

    #[test]
    fn test_maps_preserve_key_order() {
        let registry: Registry<dyn Handler> = Registry::new("processors");
        registry.register("stripe".into(), || named("stripe", "s1"), true);
        registry.register("paypal".into(), || named("paypal", "p1"), true);
        registry.register("stripe".into(), || named("stripe", "s2"), true);

        let singles = registry.all_as_singleton_map().unwrap();
        let keys: Vec<_> = singles.keys().cloned().collect();
        assert_eq!(keys, vec!["stripe".to_string(), "paypal".to_string()]);
        assert_eq!(singles["stripe"].label(), "s1");

        let collections = registry.all_as_collection_map().unwrap();
        assert_eq!(collections["stripe"].len(), 2);
        assert_eq!(collections["paypal"].len(), 1);
    }

    #[test]
    fn test_register_instance_is_cached_singleton() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        let instance: Arc<dyn Handler> = Arc::new(Named {
            key: "prebuilt",
            label: "ready",
        });

        let key = registry.register_instance(Arc::clone(&instance));
        assert_eq!(key, "prebuilt");

        let resolved = registry.resolve(&key).unwrap().unwrap();
        assert!(Arc::ptr_eq(&resolved, &instance));
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let registry: Registry<dyn Handler> = Registry::new("handlers");
        registry.register("a".into(), || named("a", "a"), true);
        registry.register("b".into(), || named("b", "b"), true);
        assert_eq!(registry.keys().len(), 2);

        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains(&"a".to_string()));
    }
}
