//! Observable facade over a single storage backend

use std::sync::Arc;

use bytes::Bytes;
use lampo_core::{Event, EventType, LampoConfig, Result};
use storage::{ObjectReader, StorageBackend};
use tracing::{debug, instrument};

use crate::listeners::Listeners;

/// Forwards calls to one backend and notifies listeners after each success
///
/// The backend is fixed at construction. Errors are returned verbatim and
/// never reach the listeners. Listeners run on the caller's task, in
/// registration order, before the operation returns; a slow listener delays
/// the caller.
pub struct Lampo {
    backend: Box<dyn StorageBackend>,
    listeners: Listeners,
}

impl Lampo {
    /// Wrap a backend
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    /// Wrap an already boxed backend
    pub fn from_boxed(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            listeners: Listeners::new(),
        }
    }

    /// Build the backend described by `config` and wrap it
    pub async fn from_config(config: &LampoConfig) -> Result<Self> {
        config.validate()?;
        let backend = storage::open_backend(&config.backend).await?;
        Ok(Self::from_boxed(backend))
    }

    /// Register a listener; registrations are additive and permanent
    pub fn on<F>(&self, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.register(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The wrapped backend
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    #[instrument(skip(self))]
    pub async fn read(&self, path: &str) -> Result<ObjectReader> {
        let reader = self.backend.read(path).await?;
        self.fire(EventType::Read, path, None);
        Ok(reader)
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn write(&self, path: &str, data: Bytes) -> Result<()> {
        let size = data.len();
        self.backend.write(path, data).await?;
        self.fire(EventType::Write, path, Some(size));
        Ok(())
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn put(&self, path: &str, data: Bytes) -> Result<()> {
        let size = data.len();
        self.backend.put(path, data).await?;
        self.fire(EventType::Put, path, Some(size));
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.backend.delete(path).await?;
        self.fire(EventType::Delete, path, None);
        Ok(())
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn update(&self, path: &str, data: Bytes, prepend: bool) -> Result<()> {
        let size = data.len();
        self.backend.update(path, data, prepend).await?;
        self.fire(EventType::for_update(prepend), path, Some(size));
        Ok(())
    }

    fn fire(&self, event_type: EventType, path: &str, data: Option<usize>) {
        let event = Event::new(event_type, path, data);
        debug!(%event_type, listeners = self.listeners.len(), "Dispatching event");
        self.listeners.dispatch(&event);
    }
}

impl std::fmt::Debug for Lampo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lampo")
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
