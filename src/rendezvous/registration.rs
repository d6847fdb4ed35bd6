//! # Unregister handle returned by `Rendezvous::register`.
//!
//! The handle does not keep the point alive and does nothing when dropped;
//! removal happens only through [`Registration::unregister`].

use std::fmt;
use std::sync::Weak;

/// Type-erased removal entry point implemented by the rendezvous internals.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

/// Handle removing exactly one observer registration.
///
/// ### Rules
/// - Idempotent: calling [`unregister`](Self::unregister) more than once is harmless.
/// - No-op once the point has ended (the observer already saw its final event).
/// - Called from inside a dispatch pass, the removal is deferred until the pass completes.
/// - If the removal leaves no interested observer, the point ends and remaining
///   passive observers receive the tombstone.
#[derive(Clone)]
pub struct Registration {
    target: Option<Weak<dyn Detach>>,
    id: u64,
}

impl Registration {
    pub(crate) fn new(target: Weak<dyn Detach>, id: u64) -> Self {
        Self {
            target: Some(target),
            id,
        }
    }

    /// Handle for a registration that never joined the observer list.
    pub(crate) fn inert() -> Self {
        Self {
            target: None,
            id: 0,
        }
    }

    /// Removes the registration.
    pub fn unregister(&self) {
        if let Some(target) = self.target.as_ref().and_then(Weak::upgrade) {
            target.detach(self.id);
        }
    }

    /// Whether this handle refers to a live registration slot.
    pub fn is_inert(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("inert", &self.is_inert())
            .finish()
    }
}
