//! Atomically swappable identity registry snapshots.
//!
//! Registries are immutable once shared. Reloading identities means building
//! a brand-new [`IdentityRegistry`] and publishing it here; readers that
//! already hold the previous `Arc` keep using it until they drop it, so no
//! reader ever observes a half-updated set.
//!
//! Backed by `tokio::sync::watch`, which also lets interested tasks wait for
//! a reload via [`RegistryHandle::subscribe`].

use crate::identity::IdentityRegistry;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the current identity registry snapshot.
#[derive(Clone)]
pub struct RegistryHandle(Arc<watch::Sender<Arc<IdentityRegistry>>>);

impl RegistryHandle {
    /// Creates a handle publishing `registry` as the initial snapshot.
    #[must_use]
    pub fn new(registry: IdentityRegistry) -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(registry));
        Self(Arc::new(sender))
    }

    /// Returns the current snapshot.
    ///
    /// Clones the `Arc` so the watch borrow is released immediately.
    #[must_use]
    pub fn current(&self) -> Arc<IdentityRegistry> {
        self.0.borrow().clone()
    }

    /// Publishes `registry` as the new snapshot and returns the previous one.
    pub fn replace(&self, registry: IdentityRegistry) -> Arc<IdentityRegistry> {
        self.0.send_replace(Arc::new(registry))
    }

    /// Receiver that is notified whenever a new snapshot is published.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<IdentityRegistry>> {
        self.0.subscribe()
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("identities", &self.current().len())
            .finish()
    }
}
