// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::LaunchMode;

/// Folders handed to the preconfigured worker when none are given.
pub const DEFAULT_FOLDERS: [&str; 2] = ["./files/testOne", "./files/testTwo"];

/// Command-line arguments for `workerchain`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "workerchain",
    version,
    about = "Launch worker processes, chain them, and report a single outcome.",
    long_about = None
)]
pub struct CliArgs {
    /// Chain file (TOML) with one `[[link]]` per launch.
    ///
    /// Default: `Workerchain.toml` if it exists and no single-launch flag is
    /// given; otherwise one preconfigured folder worker is launched.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Worker executable for the single-launch mode.
    ///
    /// Default: the `folder-worker` binary next to this executable.
    #[arg(long, value_name = "PATH", conflicts_with = "config")]
    pub worker: Option<String>,

    /// Launch mode for the single-launch mode (fork, spawn, exec).
    #[arg(long, value_name = "MODE", default_value = "fork", conflicts_with = "config")]
    pub mode: LaunchMode,

    /// Folder passed to the worker; repeat for several.
    ///
    /// Default: `./files/testOne` and `./files/testTwo`.
    #[arg(long = "folder", value_name = "PATH", conflicts_with = "config")]
    pub folders: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// Overrides `WORKERCHAIN_LOG`; the default is `info`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the links, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
