// src/engine/outcome.rs

//! Collapse a launcher's event stream into exactly one [`Outcome`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{LaunchError, ProcessFault, Result};
use crate::events::{EventBus, EventKind, LifecycleEvent, Subscription};
use crate::exec::ProcessLauncher;

/// Terminal result of one launch.
///
/// `Ok` carries the terminating `Exit { code: Some(0) }` event.
pub type Outcome = Result<LifecycleEvent>;

/// Resolution policy for a single launch:
///
/// - first `Exit` with code 0 → success;
/// - first `Exit` with any other code, or none at all (killed by a signal)
///   → [`LaunchError::NonZeroExit`];
/// - first `Error` → [`LaunchError::ProcessFault`], whether or not an exit
///   follows;
/// - bus completed without either → [`LaunchError::ProcessFault`];
/// - cancellation → [`LaunchError::Cancelled`].
pub struct LifecycleOutcome;

impl LifecycleOutcome {
    /// Watch `launcher`. Call before [`ProcessLauncher::start`] so that a
    /// worker which exits immediately cannot be missed.
    pub fn attach(launcher: &ProcessLauncher) -> PendingOutcome {
        Self::watch(
            launcher.bus(),
            launcher.cancellation_token(),
            launcher.config().worker.clone(),
        )
    }

    /// Watch a bare bus. The subscription is taken synchronously; resolution
    /// happens on a background task.
    pub fn watch(bus: &EventBus, cancel: CancellationToken, worker: String) -> PendingOutcome {
        let subscription = bus.subscribe_kinds(&[EventKind::Exit, EventKind::Error]);
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = resolve(subscription, cancel, &worker).await;
            match &outcome {
                Ok(event) => debug!(worker = %worker, %event, "launch resolved successfully"),
                Err(e) => debug!(worker = %worker, error = %e, error_kind = e.as_label(), "launch resolved as failure"),
            }
            // The receiver may be gone if the caller lost interest.
            let _ = tx.send(outcome);
        });

        PendingOutcome { rx }
    }
}

async fn resolve(mut subscription: Subscription, cancel: CancellationToken, worker: &str) -> Outcome {
    loop {
        let event = tokio::select! {
            biased;
            event = subscription.recv() => event,
            _ = cancel.cancelled() => return Err(LaunchError::Cancelled),
        };

        match event {
            Some(LifecycleEvent::Exit { code: Some(0) }) => {
                return Ok(LifecycleEvent::Exit { code: Some(0) });
            }
            Some(LifecycleEvent::Exit { code }) => {
                return Err(LaunchError::NonZeroExit { code });
            }
            Some(LifecycleEvent::Error(fault)) => {
                return Err(LaunchError::ProcessFault(fault));
            }
            Some(_) => continue,
            None => {
                return Err(LaunchError::ProcessFault(
                    ProcessFault::terminated_without_status(worker),
                ));
            }
        }
    }
}

/// Single-resolution future for one launch's [`Outcome`].
#[derive(Debug)]
pub struct PendingOutcome {
    rx: oneshot::Receiver<Outcome>,
}

impl PendingOutcome {
    /// Wait for the outcome.
    pub async fn wait(self) -> Outcome {
        self.await
    }
}

impl Future for PendingOutcome {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| {
            res.unwrap_or_else(|_| {
                Err(LaunchError::Other(anyhow::anyhow!(
                    "outcome resolver stopped before resolving"
                )))
            })
        })
    }
}
