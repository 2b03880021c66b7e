// src/exec/mod.rs

//! Process execution layer.
//!
//! This module starts worker processes with `tokio::process::Command` and
//! turns what happens to them into [`crate::events::LifecycleEvent`]s.
//!
//! - [`launcher`] owns one process: start, supervision, terminal events.
//! - [`command`] builds the OS command for each launch mode.
//! - [`pumps`] moves stdio between the worker and the bus.
//! - [`handle`] is the read-only handle returned by `start()`.

pub mod command;
pub mod handle;
pub mod launcher;
pub mod pumps;

pub use command::{CHANNEL_ENV, CHANNEL_NDJSON};
pub use handle::ProcessHandle;
pub use launcher::ProcessLauncher;
