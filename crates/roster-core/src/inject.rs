//! Lazily resolved injection cells.
//!
//! A consumer that wants a group's contents holds one of these cells instead
//! of a resolved value. Nothing is resolved when the cell is built; the first
//! [`get`](InjectCollection::get) asks the container. Discovery may therefore
//! run after the consumer is constructed, as long as it finishes before the
//! first access.
//!
//! ```rust,ignore
//! struct Checkout {
//!     processors: InjectCollection<dyn PaymentProcessor>,
//!     fallback: InjectOne<dyn PaymentProcessor>,
//! }
//!
//! let checkout = Checkout {
//!     processors: InjectCollection::for_capability(Arc::clone(&container)),
//!     fallback: InjectOne::for_capability(Arc::clone(&container), "stripe".into()),
//! };
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::Container;
use crate::error::BoxError;
use crate::keyed::{CapabilityMeta, Keyed};
use crate::view::SingletonView;

/// Injects a [`SingletonView`] over a whole group.
///
/// The view is fetched on first access and reused afterwards. If resolving the
/// group fails, the error is returned and the next access tries again.
pub struct InjectCollection<T: ?Sized + Keyed> {
    container: Arc<Container>,
    group: String,
    view: Mutex<Option<Arc<SingletonView<T>>>>,
}

impl<T: ?Sized + Keyed> InjectCollection<T> {
    pub fn new(container: Arc<Container>, group: impl Into<String>) -> Self {
        Self {
            container,
            group: group.into(),
            view: Mutex::new(None),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns `true` once the view has been fetched.
    pub fn is_resolved(&self) -> bool {
        self.view.lock().is_some()
    }

    /// Returns the group's view, fetching it on first access.
    pub fn get(&self) -> Result<Arc<SingletonView<T>>, BoxError> {
        let mut slot = self.view.lock();
        if let Some(view) = slot.as_ref() {
            return Ok(Arc::clone(view));
        }
        let view = Arc::new(self.container.singleton_view::<T>(&self.group)?);
        *slot = Some(Arc::clone(&view));
        Ok(view)
    }
}

impl<T: ?Sized + Keyed + CapabilityMeta> InjectCollection<T> {
    /// Builds a cell for the group named by `T`.
    pub fn for_capability(container: Arc<Container>) -> Self {
        Self::new(container, T::GROUP)
    }
}

/// Injects the component registered under one fixed key.
///
/// A found instance is cached; an absent key is looked up again on the next
/// access so a later discovery can still satisfy it.
pub struct InjectOne<T: ?Sized + Keyed> {
    container: Arc<Container>,
    group: String,
    key: T::Key,
    instance: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized + Keyed> InjectOne<T> {
    pub fn new(container: Arc<Container>, group: impl Into<String>, key: T::Key) -> Self {
        Self {
            container,
            group: group.into(),
            key,
            instance: Mutex::new(None),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn key(&self) -> &T::Key {
        &self.key
    }

    pub fn is_resolved(&self) -> bool {
        self.instance.lock().is_some()
    }

    /// Returns the component, resolving it on first access.
    pub fn get(&self) -> Result<Option<Arc<T>>, BoxError> {
        let mut slot = self.instance.lock();
        if let Some(instance) = slot.as_ref() {
            return Ok(Some(Arc::clone(instance)));
        }
        let resolved = self.container.get::<T>(&self.group, &self.key)?;
        *slot = resolved.clone();
        Ok(resolved)
    }
}

impl<T: ?Sized + Keyed + CapabilityMeta> InjectOne<T> {
    /// Builds a cell for `key` in the group named by `T`.
    pub fn for_capability(container: Arc<Container>, key: T::Key) -> Self {
        Self::new(container, T::GROUP, key)
    }
}
