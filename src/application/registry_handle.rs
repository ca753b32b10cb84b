use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use crate::domain::registry::TargetRegistry;

struct Shared {
    current: RwLock<Arc<TargetRegistry>>,
    generation: watch::Sender<u64>,
}

/// Shared handle to the active target registry.
///
/// A reload swaps the whole registry atomically; readers always see either
/// the old set or the new one, never a partial mix. Components that need to
/// react to reloads (scheduler, tracker) subscribe to the generation
/// counter.
#[derive(Clone)]
pub struct RegistryHandle {
    shared: Arc<Shared>,
}

impl RegistryHandle {
    #[must_use]
    pub fn new(registry: TargetRegistry) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                current: RwLock::new(Arc::new(registry)),
                generation,
            }),
        }
    }

    /// Snapshot of the active registry. Cheap clone of an `Arc`.
    #[must_use]
    pub fn current(&self) -> Arc<TargetRegistry> {
        match self.shared.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still holds a valid registry; take it.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the active registry and bump the generation counter.
    pub fn swap(&self, registry: TargetRegistry) {
        let replacement = Arc::new(registry);
        match self.shared.current.write() {
            Ok(mut guard) => *guard = replacement,
            Err(poisoned) => *poisoned.into_inner() = replacement,
        }
        self.shared.generation.send_modify(|g| *g += 1);
    }

    /// Subscribe to reload notifications.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.generation.subscribe()
    }
}
