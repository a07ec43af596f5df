//! Foreground/background event source.
//!
//! The platform binding calls [`LifecycleEvents::emit`] whenever the OS
//! reports a phase change. Screens subscribe with a callback and hold the
//! returned [`LifecycleSubscription`]; dropping it unregisters the callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use farmacia_core::AppPhase;
use tracing::debug;

type Listener = Arc<dyn Fn(AppPhase) + Send + Sync>;

/// Broadcasts lifecycle phases to registered listeners.
///
/// Cheap to clone; clones share the listener list.
#[derive(Clone, Default)]
pub struct LifecycleEvents {
    inner: Arc<EventsInner>,
}

#[derive(Default)]
struct EventsInner {
    current: RwLock<AppPhase>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl EventsInner {
    fn unsubscribe(&self, id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|(listener_id, _)| *listener_id != id);
    }
}

impl std::fmt::Debug for LifecycleEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEvents")
            .field("current", &self.current())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl LifecycleEvents {
    /// A source that starts in [`AppPhase::Active`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last phase emitted.
    #[must_use]
    pub fn current(&self) -> AppPhase {
        *self
            .inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a phase and notify every listener.
    ///
    /// Listeners run on the caller's thread, outside the listener lock, so a
    /// listener may drop its own subscription.
    pub fn emit(&self, phase: AppPhase) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = phase;

        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        debug!(%phase, listeners = listeners.len(), "Lifecycle phase changed");
        for listener in listeners {
            listener(phase);
        }
    }

    /// Register a callback for every subsequent phase.
    pub fn subscribe<F>(&self, listener: F) -> LifecycleSubscription
    where
        F: Fn(AppPhase) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        LifecycleSubscription {
            id,
            events: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration handle; dropping it removes the listener.
#[must_use = "dropping the subscription unregisters the listener immediately"]
pub struct LifecycleSubscription {
    id: u64,
    events: Weak<EventsInner>,
}

impl LifecycleSubscription {
    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl std::fmt::Debug for LifecycleSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        if let Some(events) = self.events.upgrade() {
            events.unsubscribe(self.id);
        }
    }
}
