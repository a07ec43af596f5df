//! Privacy overlay for app-switcher snapshots.
//!
//! [`PrivacyScreen`] subscribes to lifecycle events while mounted and runs
//! them through a [`VisibilityGate`]. The UI renders an opaque overlay while
//! [`PrivacyScreen::content_hidden`] is `true`, or awaits changes on the
//! receiver from [`PrivacyScreen::watch`].

use std::sync::{Arc, Mutex, PoisonError};

use farmacia_core::{AppPhase, VisibilityGate};
use tokio::sync::watch;
use tracing::debug;

use crate::lifecycle::{LifecycleEvents, LifecycleSubscription};

/// Mounted privacy overlay.
#[derive(Debug)]
pub struct PrivacyScreen {
    hidden: watch::Receiver<bool>,
    subscription: Option<LifecycleSubscription>,
}

impl PrivacyScreen {
    /// Subscribe to `events`. Content starts visible.
    pub fn mount(events: &LifecycleEvents) -> Self {
        let gate = Arc::new(Mutex::new(VisibilityGate::with_phase(events.current())));
        let (sender, hidden) = watch::channel(false);

        let subscription = events.subscribe(move |phase: AppPhase| {
            let now_hidden = gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observe(phase);
            sender.send_if_modified(|current| {
                if *current == now_hidden {
                    return false;
                }
                *current = now_hidden;
                true
            });
        });

        debug!("Privacy screen mounted");
        Self {
            hidden,
            subscription: Some(subscription),
        }
    }

    /// Whether the overlay should cover the content.
    #[must_use]
    pub fn content_hidden(&self) -> bool {
        *self.hidden.borrow()
    }

    /// Receiver that changes whenever the hidden flag flips.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.hidden.clone()
    }

    /// `true` until [`PrivacyScreen::unmount`] is called.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Release the lifecycle subscription. The flag keeps its last value.
    pub fn unmount(&mut self) {
        if self.subscription.take().is_some() {
            debug!("Privacy screen unmounted");
        }
    }
}
