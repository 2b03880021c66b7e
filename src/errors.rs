// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Every failure of the orchestration layer is a [`LaunchError`]. The
//! variants fall into four families:
//!
//! - configuration errors (`InvalidMode`, `ConfigError`, `AlreadyStarted`),
//!   raised before any OS process exists;
//! - process faults reported by the OS layer (`ProcessFault`);
//! - workers that ran to completion with a failing exit code (`NonZeroExit`);
//! - chain aborts, which wrap the failure of the first failing link.

use std::fmt;
use std::io;

use thiserror::Error;

/// Stage of a launch at which the OS layer reported a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    /// Creating the OS process.
    Spawn,
    /// Waiting for the OS process to terminate.
    Wait,
    /// Reading from or writing to the message channel.
    Ipc,
    /// The event stream ended without an exit status.
    Terminate,
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultStage::Spawn => "spawn",
            FaultStage::Wait => "wait",
            FaultStage::Ipc => "ipc",
            FaultStage::Terminate => "terminate",
        };
        f.write_str(s)
    }
}

/// Cloneable description of an OS-level process fault.
///
/// `std::io::Error` is not `Clone`, so the interesting parts are copied out
/// and carried in lifecycle events instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessFault {
    pub stage: FaultStage,
    pub worker: String,
    pub kind: io::ErrorKind,
    pub message: String,
}

impl ProcessFault {
    pub fn new(stage: FaultStage, worker: impl Into<String>, err: &io::Error) -> Self {
        Self {
            stage,
            worker: worker.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn terminated_without_status(worker: impl Into<String>) -> Self {
        Self {
            stage: FaultStage::Terminate,
            worker: worker.into(),
            kind: io::ErrorKind::UnexpectedEof,
            message: "event stream completed without an exit status".to_string(),
        }
    }
}

impl fmt::Display for ProcessFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for worker '{}': {}",
            self.stage, self.worker, self.message
        )
    }
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("invalid launch mode: {0} (expected \"fork\", \"spawn\" or \"exec\")")]
    InvalidMode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("launcher was already started; configuration and start are one-shot")]
    AlreadyStarted,

    #[error("process fault: {0}")]
    ProcessFault(ProcessFault),

    #[error("worker exited with {}", describe_code(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("launch cancelled")]
    Cancelled,

    #[error("chain aborted at link {position}: {source}")]
    ChainAbort {
        /// 1-based position of the first failing link.
        position: usize,
        #[source]
        source: Box<LaunchError>,
    },

    #[error("no message channel: only fork-mode launches can send messages")]
    NoMessageChannel,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaunchError {
    /// Short stable label (snake_case) for structured logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LaunchError::InvalidMode(_) => "invalid_mode",
            LaunchError::ConfigError(_) => "config_error",
            LaunchError::AlreadyStarted => "already_started",
            LaunchError::ProcessFault(_) => "process_fault",
            LaunchError::NonZeroExit { .. } => "non_zero_exit",
            LaunchError::Cancelled => "cancelled",
            LaunchError::ChainAbort { .. } => "chain_abort",
            LaunchError::NoMessageChannel => "no_message_channel",
            LaunchError::IoError(_) => "io_error",
            LaunchError::TomlError(_) => "toml_error",
            LaunchError::JsonError(_) => "json_error",
            LaunchError::Other(_) => "other",
        }
    }

    /// True for errors raised before any OS process was created.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            LaunchError::InvalidMode(_)
                | LaunchError::ConfigError(_)
                | LaunchError::AlreadyStarted
        )
    }

    /// Position of the failing link, if this is a chain abort.
    pub fn failed_position(&self) -> Option<usize> {
        match self {
            LaunchError::ChainAbort { position, .. } => Some(*position),
            _ => None,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
