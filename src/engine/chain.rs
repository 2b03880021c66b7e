// src/engine/chain.rs

//! Strictly sequential execution of launches with short-circuit on failure.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{LaunchConfig, LinkSpec};
use crate::engine::outcome::{LifecycleOutcome, Outcome};
use crate::errors::{LaunchError, Result};
use crate::events::{LifecycleEvent, DEFAULT_EVENT_CAPACITY};
use crate::exec::{ProcessHandle, ProcessLauncher};

pub type BeforeStartFn = Box<dyn FnOnce(&ProcessLauncher) + Send>;
pub type AfterStartFn = Box<dyn FnOnce(&ProcessLauncher, &ProcessHandle) + Send>;

/// Called for every link, with its 1-based position, after the outcome is
/// attached and before the link's own callback runs.
pub type LinkObserver = Arc<dyn Fn(usize, &ProcessLauncher) + Send + Sync>;

/// Side effect attached to a link, run either before the process exists or
/// right after it was started.
pub enum LinkCallback {
    BeforeStart(BeforeStartFn),
    AfterStart(AfterStartFn),
}

impl fmt::Debug for LinkCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkCallback::BeforeStart(_) => f.write_str("BeforeStart(..)"),
            LinkCallback::AfterStart(_) => f.write_str("AfterStart(..)"),
        }
    }
}

/// One configured launch in a chain.
#[derive(Debug)]
pub struct ChainLink {
    pub name: Option<String>,
    pub config: LaunchConfig,
    pub callback: Option<LinkCallback>,
}

impl ChainLink {
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            name: None,
            config,
            callback: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run `f` with the launcher before the process is started, e.g. to
    /// subscribe to its data stream.
    pub fn before_start<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ProcessLauncher) + Send + 'static,
    {
        self.callback = Some(LinkCallback::BeforeStart(Box::new(f)));
        self
    }

    /// Run `f` with the launcher and process handle right after start, e.g.
    /// to send the worker a message.
    pub fn after_start<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ProcessLauncher, &ProcessHandle) + Send + 'static,
    {
        self.callback = Some(LinkCallback::AfterStart(Box::new(f)));
        self
    }

    /// Launch this link on its own and wait for its outcome.
    pub async fn launch(self) -> Outcome {
        let settings = LinkSettings {
            cancel: CancellationToken::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            observer: None,
        };
        run_link(self, 1, &settings).await
    }

    fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.config.command_line())
    }
}

impl From<LaunchConfig> for ChainLink {
    fn from(config: LaunchConfig) -> Self {
        ChainLink::new(config)
    }
}

impl From<LinkSpec> for ChainLink {
    fn from(spec: LinkSpec) -> Self {
        let mut link = ChainLink::new(spec.launch);
        link.name = spec.name;

        if let Some(message) = spec.message {
            link = link.after_start(move |_launcher, handle| {
                if let Err(e) = handle.send(message) {
                    warn!(worker = %handle.worker(), error = %e, "could not send start message");
                }
            });
        }

        link
    }
}

/// Result of a chain in which every link succeeded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainReport {
    /// Terminating event of each link, in execution order.
    pub events: Vec<LifecycleEvent>,
}

impl ChainReport {
    pub fn links_run(&self) -> usize {
        self.events.len()
    }

    pub fn last(&self) -> Option<&LifecycleEvent> {
        self.events.last()
    }
}

/// Runs links one at a time; link N+1 starts only after link N succeeded.
///
/// The first failure stops the chain and is returned as
/// [`LaunchError::ChainAbort`] carrying the 1-based position of the failing
/// link. An empty chain succeeds immediately with an empty report.
pub struct ChainOrchestrator {
    links: Vec<ChainLink>,
    settings: LinkSettings,
}

/// What every link of a chain shares.
struct LinkSettings {
    cancel: CancellationToken,
    event_capacity: usize,
    observer: Option<LinkObserver>,
}

impl fmt::Debug for ChainOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainOrchestrator")
            .field("links", &self.links)
            .field("event_capacity", &self.settings.event_capacity)
            .field("observer", &self.settings.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl ChainOrchestrator {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self {
            links,
            settings: LinkSettings {
                cancel: CancellationToken::new(),
                event_capacity: DEFAULT_EVENT_CAPACITY,
                observer: None,
            },
        }
    }

    /// Cancelling `token` kills the running link and aborts the chain.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.settings.cancel = token;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.settings.event_capacity = capacity;
        self
    }

    /// Observe every launcher of the chain before it starts.
    pub fn with_link_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(usize, &ProcessLauncher) + Send + Sync + 'static,
    {
        self.settings.observer = Some(Arc::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub async fn run(self) -> Result<ChainReport> {
        let total = self.links.len();
        let mut report = ChainReport::default();

        if total == 0 {
            debug!("empty chain; nothing to launch");
            return Ok(report);
        }

        info!(links = total, "starting chain");

        for (idx, link) in self.links.into_iter().enumerate() {
            let position = idx + 1;
            let label = link.label();
            debug!(position, total, link = %label, "starting chain link");

            match run_link(link, position, &self.settings).await {
                Ok(event) => {
                    debug!(position, link = %label, %event, "chain link succeeded");
                    report.events.push(event);
                }
                Err(source) => {
                    error!(
                        position,
                        total,
                        link = %label,
                        error_kind = source.as_label(),
                        error = %source,
                        "error in chain link; remaining links will not run"
                    );
                    return Err(LaunchError::ChainAbort {
                        position,
                        source: Box::new(source),
                    });
                }
            }
        }

        info!(links = total, "chain completed successfully");
        Ok(report)
    }
}

async fn run_link(link: ChainLink, position: usize, settings: &LinkSettings) -> Outcome {
    let ChainLink {
        config, callback, ..
    } = link;

    let mut launcher = ProcessLauncher::with_capacity(config, settings.event_capacity)
        .with_cancellation(settings.cancel.child_token());

    // Subscribe before anything can start the process.
    let pending = LifecycleOutcome::attach(&launcher);

    if let Some(observer) = &settings.observer {
        observer(position, &launcher);
    }

    let after = match callback {
        Some(LinkCallback::BeforeStart(f)) => {
            f(&launcher);
            None
        }
        Some(LinkCallback::AfterStart(f)) => Some(f),
        None => None,
    };

    let handle = match launcher.start() {
        Ok(handle) => handle,
        Err(e) => {
            // A bus that never saw a process never completes on its own.
            // Cancelling releases the resolver; closing releases observers.
            launcher.cancel();
            launcher.bus().publish(LifecycleEvent::Close { code: None });
            return Err(e);
        }
    };

    if let Some(f) = after {
        f(&launcher, &handle);
    }

    pending.await
}
