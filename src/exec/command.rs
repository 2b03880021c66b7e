// src/exec/command.rs

//! Translate a [`LaunchConfig`] into a `tokio::process::Command`.

use std::process::Stdio;

use tokio::process::Command;
use tracing::warn;

use crate::config::LaunchConfig;
use crate::types::LaunchMode;

/// Tells a fork-mode worker that its stdio carries the message channel.
pub const CHANNEL_ENV: &str = "WORKERCHAIN_CHANNEL";

/// Value of [`CHANNEL_ENV`]: newline-delimited JSON over stdin/stdout.
pub const CHANNEL_NDJSON: &str = "ndjson";

/// Build the command for the configured mode.
///
/// stdout and stderr are always piped; stdin is piped only in fork mode,
/// where it is the parent-to-worker half of the message channel.
pub fn build_command(config: &LaunchConfig) -> Command {
    let mut cmd = match config.mode {
        LaunchMode::Exec => shell_command(&config.command_line()),
        LaunchMode::Spawn if config.options.shell => shell_command(&config.command_line()),
        LaunchMode::Spawn | LaunchMode::Fork => {
            if config.mode == LaunchMode::Fork && config.options.shell {
                warn!(
                    worker = %config.worker,
                    "shell = true is ignored in fork mode; starting worker directly"
                );
            }
            let mut c = Command::new(&config.worker);
            c.args(&config.args);
            c
        }
    };

    if let Some(cwd) = &config.options.cwd {
        cmd.current_dir(cwd);
    }

    // Overlay on top of the inherited environment.
    cmd.envs(&config.options.env);

    if config.mode.has_message_channel() {
        cmd.env(CHANNEL_ENV, CHANNEL_NDJSON);
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(!config.options.detached);

    if config.options.detached {
        detach(&mut cmd);
    }

    cmd
}

/// Build a shell command appropriate for the platform.
fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    // New process group: terminal signals aimed at us do not reach the worker.
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    cmd.creation_flags(DETACHED_PROCESS);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}
