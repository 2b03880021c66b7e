// src/events/mod.rs

//! Lifecycle events of a worker process and the bus that carries them.
//!
//! - [`event`] defines the closed set of event kinds and their payloads.
//! - [`bus`] provides the per-process broadcast channel with kind-filtered
//!   subscriptions and completion on the first terminal event.

pub mod bus;
pub mod event;

pub use bus::{EventBus, Subscription, DEFAULT_EVENT_CAPACITY};
pub use event::{EventKind, LifecycleEvent};
