//! Subscription registry for event fan-out
//!
//! Observers are stored behind handles so they can be removed later. Dispatch works on a
//! snapshot of the registry: observers added while an event is being delivered do not see
//! that event, and an observer may (un)subscribe from inside its own callback.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

type Observer<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Identifies one subscription; returned by `subscribe`, consumed by `unsubscribe`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(u64);

struct Registry<E> {
    next_id: AtomicU64,
    observers: RwLock<BTreeMap<u64, Observer<E>>>,
}

/// Shared, cloneable set of observers for events of type `E`
///
/// Clones refer to the same registry.
pub struct Subscribers<E> {
    inner: Arc<Registry<E>>,
}

impl<E> Clone for Subscribers<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                observers: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Register an observer; it receives every event notified from now on
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(observer));
        SubscriptionHandle(id)
    }

    /// Remove an observer. Returns `false` if the handle was already removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0)
            .is_some()
    }

    fn len(&self) -> usize {
        self.inner
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to every observer registered at call time, in subscription order
    ///
    /// The registry lock is released before any observer runs. A panicking observer is
    /// logged and skipped; the remaining observers still receive the event.
    pub fn notify(&self, event: &E)
    where
        E: fmt::Debug,
    {
        let snapshot: Vec<(u64, Observer<E>)> = self
            .inner
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, observer)| (*id, Arc::clone(observer)))
            .collect();

        for (id, observer) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| observer(event))).is_err() {
                tracing::error!(subscription = id, ?event, "Observer panicked; skipping it");
            }
        }
    }
}
