// src/exec/handle.rs

use std::io;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::{FaultStage, LaunchError, ProcessFault, Result};
use crate::types::LaunchMode;

/// Read-only access to a started worker process.
///
/// The process itself stays owned by its launcher; a handle can only report
/// the pid and, in fork mode, send messages. Termination goes through the
/// launcher's cancellation token.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    mode: LaunchMode,
    worker: String,
    messages: Option<mpsc::UnboundedSender<Value>>,
}

impl ProcessHandle {
    pub(crate) fn new(
        pid: Option<u32>,
        mode: LaunchMode,
        worker: String,
        messages: Option<mpsc::UnboundedSender<Value>>,
    ) -> Self {
        Self {
            pid,
            mode,
            worker,
            messages,
        }
    }

    /// OS process id; `None` if the process already exited when it was
    /// queried.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    pub fn has_message_channel(&self) -> bool {
        self.messages.is_some()
    }

    /// Queue a message for the worker (fork mode only). Never blocks.
    pub fn send(&self, message: Value) -> Result<()> {
        let Some(tx) = &self.messages else {
            return Err(LaunchError::NoMessageChannel);
        };

        tx.send(message).map_err(|_| {
            let err = io::Error::new(io::ErrorKind::BrokenPipe, "message channel closed");
            LaunchError::ProcessFault(ProcessFault::new(
                FaultStage::Ipc,
                self.worker.clone(),
                &err,
            ))
        })
    }
}
