//! Per-process event bus.
//!
//! [`EventBus`] is a thin wrapper around [`tokio::sync::broadcast`] that
//! carries the [`LifecycleEvent`]s of exactly one worker process.
//!
//! - [`EventBus::publish`] sends an event to all current subscribers and never
//!   blocks the publisher.
//! - [`EventBus::subscribe`] / [`EventBus::subscribe_kind`] create live views,
//!   optionally filtered to one or more [`EventKind`]s. There is no replay.
//! - Publishing a terminal event (`Close` or `Exit`) completes the bus: the
//!   event is delivered, the sender is dropped, and every subscription drains
//!   and then yields `None`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{trace, warn};

use super::event::{EventKind, LifecycleEvent};

/// Default per-bus channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Broadcast point for one launcher's lifecycle events.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: Arc<Mutex<Option<broadcast::Sender<LifecycleEvent>>>>,
}

impl EventBus {
    /// Creates a new bus with the given channel capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns `false` if the bus has already completed; the event is then
    /// discarded. Having no subscribers is not an error.
    pub fn publish(&self, event: LifecycleEvent) -> bool {
        let mut slot = self.sender();
        let Some(tx) = slot.as_ref() else {
            trace!(kind = %event.kind(), "bus already complete; dropping event");
            return false;
        };

        let terminal = event.is_terminal();
        let _ = tx.send(event);

        if terminal {
            // Dropping the last sender is what tells receivers we are done.
            *slot = None;
        }
        true
    }

    /// Unfiltered view of all events published from now on.
    pub fn subscribe(&self) -> Subscription {
        self.make_subscription(None)
    }

    /// View restricted to a single event kind.
    pub fn subscribe_kind(&self, kind: EventKind) -> Subscription {
        self.make_subscription(Some(vec![kind]))
    }

    /// View restricted to a set of event kinds.
    pub fn subscribe_kinds(&self, kinds: &[EventKind]) -> Subscription {
        self.make_subscription(Some(kinds.to_vec()))
    }

    /// Whether a terminal event has been published.
    pub fn is_complete(&self) -> bool {
        self.sender().is_none()
    }

    fn make_subscription(&self, kinds: Option<Vec<EventKind>>) -> Subscription {
        let rx = self.sender().as_ref().map(|tx| tx.subscribe());
        Subscription { rx, kinds }
    }

    fn sender(&self) -> MutexGuard<'_, Option<broadcast::Sender<LifecycleEvent>>> {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// A live, optionally filtered view of an [`EventBus`].
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<LifecycleEvent>>,
    kinds: Option<Vec<EventKind>>,
}

impl Subscription {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the bus has completed and every event published
    /// before completion has been delivered.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        loop {
            let result = match self.rx.as_mut() {
                Some(rx) => rx.recv().await,
                None => return None,
            };

            match result {
                Ok(event) => {
                    if self.accepts(event.kind()) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged; oldest events were dropped");
                }
                Err(RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    /// Whether this view has observed bus completion.
    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }

    fn accepts(&self, kind: EventKind) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }
}
