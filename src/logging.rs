// src/logging.rs

//! `tracing` setup for both binaries.
//!
//! Filter precedence for `workerchain`:
//! 1. `--log-level` on the command line;
//! 2. `WORKERCHAIN_LOG`, which accepts full `EnvFilter` directives
//!    (e.g. `workerchain::exec=debug,info`);
//! 3. `info`.
//!
//! Everything is written to stderr. stdout carries worker output and the
//! final outcome, and inside a fork-mode worker it is the message channel.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable consulted when no CLI level is given.
pub const LOG_ENV: &str = "WORKERCHAIN_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber for the `workerchain` binary.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(resolve_filter(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)
}

/// Install the subscriber inside a worker process.
///
/// The launcher re-logs each stderr line under the worker's name, so the
/// worker emits plain lines: no colours, no timestamps.
pub fn init_worker_logging() -> Result<()> {
    fmt()
        .with_env_filter(resolve_filter(None))
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)
}

fn resolve_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_directive());
    }

    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(e) => {
            // Unset is the common case; only complain about garbage.
            if std::env::var_os(LOG_ENV).is_some() {
                eprintln!("ignoring invalid {LOG_ENV}: {e}");
            }
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }
    }
}
