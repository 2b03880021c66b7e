// src/exec/launcher.rs

//! One worker process and its event bus.

use std::time::Duration;

use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::LaunchConfig;
use crate::errors::{FaultStage, LaunchError, ProcessFault, Result};
use crate::events::{EventBus, EventKind, LifecycleEvent, Subscription, DEFAULT_EVENT_CAPACITY};
use crate::exec::command::build_command;
use crate::exec::handle::ProcessHandle;
use crate::exec::pumps;
use crate::types::LaunchMode;

/// How long the supervisor waits for stdout to reach EOF after the process
/// exited. A detached grandchild can keep the pipe open indefinitely.
const STDIO_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts exactly one OS process and normalizes its lifecycle into
/// [`LifecycleEvent`]s on its own [`EventBus`].
///
/// Subscribe (or attach a [`crate::engine::LifecycleOutcome`]) before calling
/// [`ProcessLauncher::start`]: the bus does not replay events.
#[derive(Debug)]
pub struct ProcessLauncher {
    config: LaunchConfig,
    bus: EventBus,
    cancel: CancellationToken,
    started: bool,
    handle: Option<ProcessHandle>,
}

impl ProcessLauncher {
    pub fn new(config: LaunchConfig) -> Self {
        Self::with_capacity(config, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(config: LaunchConfig, event_capacity: usize) -> Self {
        Self {
            config,
            bus: EventBus::new(event_capacity),
            cancel: CancellationToken::new(),
            started: false,
            handle: None,
        }
    }

    /// Use `token` (typically a child of a chain-wide token) to cancel this
    /// launch.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Replace the configuration. Only allowed before [`Self::start`].
    pub fn set_config(&mut self, config: LaunchConfig) -> Result<()> {
        if self.started {
            return Err(LaunchError::AlreadyStarted);
        }
        self.config = config;
        Ok(())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Best-effort termination of the worker. The outcome resolves as
    /// [`LaunchError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Handle of the running process, once started.
    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn subscribe_kind(&self, kind: EventKind) -> Subscription {
        self.bus.subscribe_kind(kind)
    }

    pub fn data(&self) -> Subscription {
        self.subscribe_kind(EventKind::Data)
    }

    pub fn messages(&self) -> Subscription {
        self.subscribe_kind(EventKind::Message)
    }

    pub fn disconnects(&self) -> Subscription {
        self.subscribe_kind(EventKind::Disconnect)
    }

    pub fn errors(&self) -> Subscription {
        self.subscribe_kind(EventKind::Error)
    }

    pub fn exits(&self) -> Subscription {
        self.subscribe_kind(EventKind::Exit)
    }

    pub fn closes(&self) -> Subscription {
        self.subscribe_kind(EventKind::Close)
    }

    /// Start the worker process.
    ///
    /// Must be called from within a Tokio runtime, at most once per launcher.
    ///
    /// - Configuration problems fail before any process is created.
    /// - A spawn failure publishes `Error` then `Close` on the bus and is
    ///   also returned as [`LaunchError::ProcessFault`].
    pub fn start(&mut self) -> Result<ProcessHandle> {
        if self.started {
            return Err(LaunchError::AlreadyStarted);
        }
        self.config.validate()?;
        if self.cancel.is_cancelled() {
            return Err(LaunchError::Cancelled);
        }
        self.started = true;

        let worker = self.config.worker.clone();
        let mode = self.config.mode;

        info!(
            worker = %worker,
            mode = %mode,
            args = ?self.config.args,
            detached = self.config.options.detached,
            "starting worker process"
        );

        let mut child = match build_command(&self.config).spawn() {
            Ok(child) => child,
            Err(e) => {
                let fault = ProcessFault::new(FaultStage::Spawn, worker.clone(), &e);
                error!(worker = %worker, mode = %mode, error = %fault, "failed to spawn worker");
                self.bus.publish(LifecycleEvent::Error(fault.clone()));
                self.bus.publish(LifecycleEvent::Close { code: None });
                return Err(LaunchError::ProcessFault(fault));
            }
        };

        let pid = child.id();
        debug!(worker = %worker, ?pid, "worker process spawned");

        if let Some(stderr) = child.stderr.take() {
            pumps::spawn_stderr_logger(stderr, worker.clone());
        }

        let output = match (mode, child.stdout.take()) {
            (LaunchMode::Fork, Some(stdout)) => OutputPump::Streaming(
                pumps::spawn_message_pump(stdout, self.bus.clone(), worker.clone()),
            ),
            (LaunchMode::Spawn, Some(stdout)) => OutputPump::Streaming(
                pumps::spawn_data_pump(stdout, self.bus.clone(), worker.clone()),
            ),
            (LaunchMode::Exec, Some(stdout)) => {
                OutputPump::Buffered(pumps::spawn_buffered_pump(stdout, worker.clone()))
            }
            (_, None) => OutputPump::Absent,
        };

        let messages = match (mode, child.stdin.take()) {
            (LaunchMode::Fork, Some(stdin)) => {
                let (tx, rx) = mpsc::unbounded_channel();
                pumps::spawn_message_writer(stdin, rx, worker.clone());
                Some(tx)
            }
            _ => None,
        };

        let handle = ProcessHandle::new(pid, mode, worker.clone(), messages);

        tokio::spawn(supervise(
            child,
            output,
            self.bus.clone(),
            self.cancel.clone(),
            worker,
        ));

        self.handle = Some(handle.clone());
        Ok(handle)
    }
}

/// What reads the worker's stdout.
enum OutputPump {
    /// Publishes events as they arrive (fork / spawn).
    Streaming(JoinHandle<()>),
    /// Collects everything for a single `Data` event (exec).
    Buffered(JoinHandle<Vec<u8>>),
    Absent,
}

impl OutputPump {
    /// Wait for stdout to reach EOF; returns buffered output in exec mode.
    async fn drain(self, worker: &str) -> Option<Vec<u8>> {
        match self {
            OutputPump::Streaming(mut handle) => {
                if tokio::time::timeout(STDIO_DRAIN_TIMEOUT, &mut handle).await.is_err() {
                    warn!(worker = %worker, "stdout still open after exit; abandoning output");
                    handle.abort();
                }
                None
            }
            OutputPump::Buffered(mut handle) => {
                match tokio::time::timeout(STDIO_DRAIN_TIMEOUT, &mut handle).await {
                    Ok(Ok(bytes)) => Some(bytes),
                    Ok(Err(e)) => {
                        warn!(worker = %worker, error = %e, "buffered stdout task failed");
                        None
                    }
                    Err(_) => {
                        warn!(worker = %worker, "stdout still open after exit; abandoning output");
                        handle.abort();
                        None
                    }
                }
            }
            OutputPump::Absent => None,
        }
    }
}

/// Owns the child until it terminates, then publishes the terminal event.
///
/// Output pumps are drained first so that every `Data` / `Message` /
/// `Disconnect` precedes `Exit` on the bus.
async fn supervise(
    mut child: Child,
    output: OutputPump,
    bus: EventBus,
    cancel: CancellationToken,
    worker: String,
) {
    let status = tokio::select! {
        res = child.wait() => res,
        _ = cancel.cancelled() => {
            info!(worker = %worker, "cancellation requested; killing worker process");
            if let Err(e) = child.kill().await {
                warn!(worker = %worker, error = %e, "failed to kill worker process on cancellation");
            }
            child.wait().await
        }
    };

    if let Some(bytes) = output.drain(&worker).await {
        if !bytes.is_empty() {
            bus.publish(LifecycleEvent::Data(bytes));
        }
    }

    match status {
        Ok(status) => {
            let code = status.code();
            info!(
                worker = %worker,
                exit_code = ?code,
                success = status.success(),
                "worker process exited"
            );
            bus.publish(LifecycleEvent::Exit { code });
        }
        Err(e) => {
            let fault = ProcessFault::new(FaultStage::Wait, worker.clone(), &e);
            error!(worker = %worker, error = %fault, "waiting for worker process failed");
            bus.publish(LifecycleEvent::Error(fault));
            bus.publish(LifecycleEvent::Close { code: None });
        }
    }
}
