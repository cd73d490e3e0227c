//! # Typed Event Bus
//!
//! Synchronous publish/subscribe with per-listener isolation built into the
//! publish primitive: listeners run in registration order, and a failing
//! listener is logged and skipped without affecting the others or the
//! publishing caller.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

type Listener<E> = Arc<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// In-process event bus for a single event type.
pub struct EventBus<E> {
    name: &'static str,
    listeners: RwLock<Vec<Listener<E>>>,
}

impl<E> EventBus<E> {
    /// Create a bus; `name` labels log lines for failing listeners.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener. Listeners are invoked in registration order.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Deliver `event` to every listener, synchronously and in order.
    ///
    /// A listener error is logged and swallowed; later listeners still run
    /// and the caller never sees the failure.
    pub fn publish(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self.listeners.read().clone();
        for (index, listener) in listeners.iter().enumerate() {
            if let Err(e) = listener(event) {
                warn!(
                    event = self.name,
                    listener = index,
                    error = %e,
                    "event listener failed"
                );
            }
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}
