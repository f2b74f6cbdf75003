//! Single-valued view over a multi-valued group.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::keyed::Keyed;

/// Adapter presenting `key → collection` data as `key → first element`.
///
/// The view wraps a snapshot taken from the container when it was created.
/// [`set`](Self::set) edits only that snapshot; registrations in the container
/// are never touched.
pub struct SingletonView<T: ?Sized + Keyed> {
    group: String,
    entries: RwLock<IndexMap<T::Key, Vec<Arc<T>>>>,
}

impl<T: ?Sized + Keyed> SingletonView<T> {
    /// Wraps a resolved `key → collection` snapshot.
    pub fn new(group: impl Into<String>, entries: IndexMap<T::Key, Vec<Arc<T>>>) -> Self {
        Self {
            group: group.into(),
            entries: RwLock::new(entries),
        }
    }

    /// Returns the group this view was taken from.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the first instance registered under `key`.
    pub fn get(&self, key: &T::Key) -> Option<Arc<T>> {
        self.entries
            .read()
            .get(key)
            .and_then(|list| list.first().cloned())
    }

    /// Returns the full collection for `key`, empty when the key is unknown.
    pub fn get_all(&self, key: &T::Key) -> Vec<Arc<T>> {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Replaces the collection for `key` with `value` alone.
    ///
    /// Any alternates previously held for the key are discarded.
    pub fn set(&self, key: T::Key, value: Arc<T>) {
        self.entries.write().insert(key, vec![value]);
    }

    /// Returns `true` if the view holds a non-empty collection for `key`.
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|list| !list.is_empty())
    }

    pub fn keys(&self) -> Vec<T::Key> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Collapses the view into a `key → first instance` map.
    pub fn to_singleton_map(&self) -> IndexMap<T::Key, Arc<T>> {
        self.entries
            .read()
            .iter()
            .filter_map(|(key, list)| list.first().map(|first| (key.clone(), Arc::clone(first))))
            .collect()
    }
}

impl<T: ?Sized + Keyed> std::fmt::Debug for SingletonView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonView")
            .field("group", &self.group)
            .field("keys", &self.keys())
            .finish()
    }
}
