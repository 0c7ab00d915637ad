//! Event emitter trait for store events.
//!
//! Implementations handle delivery details (broadcast channels, UI bridges,
//! logging). The store only ever calls [`StoreEventEmitter::emit`].

use crate::events::StoreEvent;

/// Trait for emitting store events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - `StoreEventBroadcaster` in `printdest-runtime`
pub trait StoreEventEmitter: Send + Sync {
    /// Emit a store event.
    ///
    /// This method should not block.
    fn emit(&self, event: StoreEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn StoreEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl StoreEventEmitter for NoopEmitter {
    fn emit(&self, _event: StoreEvent) {}

    fn clone_box(&self) -> Box<dyn StoreEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that keeps every event in memory, for assertions in tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    events: std::sync::Arc<std::sync::Mutex<Vec<StoreEvent>>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Recorded `SelectionChanged` events only.
    pub fn selection_changes(&self) -> Vec<StoreEvent> {
        self.events()
            .into_iter()
            .filter(StoreEvent::is_selection_change)
            .collect()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl StoreEventEmitter for RecordingEmitter {
    fn emit(&self, event: StoreEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }

    fn clone_box(&self) -> Box<dyn StoreEventEmitter> {
        Box::new(self.clone())
    }
}
