//! Listener registry for facade events

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use lampo_core::Event;
use parking_lot::RwLock;
use tracing::warn;

/// Callback invoked after each successful operation
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Append-only, ordered set of listeners
///
/// Registration and dispatch may run concurrently. Each dispatch works on a
/// snapshot taken when it starts, so a listener registered mid-dispatch is
/// first called on the next event.
#[derive(Default)]
pub struct Listeners {
    inner: RwLock<Vec<Listener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Listener) {
        self.inner.write().push(listener);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Invoke every listener in registration order
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still run.
    pub fn dispatch(&self, event: &Event) {
        let snapshot: Vec<Listener> = self.inner.read().clone();

        for (index, listener) in snapshot.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(
                    listener = index,
                    event_type = %event.event_type,
                    path = %event.path,
                    "Event listener panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
