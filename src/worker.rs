// src/worker.rs

//! Reference folder worker used by the `folder-worker` binary.
//!
//! Contract with the launcher:
//! - `FOLDERS_TO_READ` holds a JSON array of folder paths;
//! - every entry of every folder is read;
//! - exit code 0 on completion, 1 if `FOLDERS_TO_READ` is not a JSON array of
//!   strings.
//!
//! Unreadable folders and files, and a missing `FOLDERS_TO_READ`, are logged
//! and skipped: the worker still exits 0.
//!
//! When `WORKERCHAIN_CHANNEL=ndjson` is set (fork mode) each folder is
//! reported as one JSON line on stdout, and messages from the launcher are
//! read from stdin and logged; otherwise a plain summary line is printed.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::thread;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::FOLDERS_ENV;
use crate::exec::{CHANNEL_ENV, CHANNEL_NDJSON};

/// Exit code for a completed run.
pub const EXIT_OK: i32 = 0;
/// Exit code for malformed input.
pub const EXIT_FAILURE: i32 = 1;

/// What the worker found in one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderReport {
    pub folder: String,
    /// Entries whose content could be read.
    pub files: usize,
    pub bytes: u64,
    /// Entries that could not be read, or `1` if the folder itself could not
    /// be listed.
    pub skipped: usize,
    pub readable: bool,
}

/// Run the worker against the current process environment and return the
/// exit code.
pub fn run_from_env() -> i32 {
    let channel = env::var(CHANNEL_ENV).is_ok_and(|v| v == CHANNEL_NDJSON);
    if channel {
        // Messages from the launcher arrive on stdin for as long as we live.
        thread::spawn(|| log_parent_messages(io::stdin().lock()));
    }
    let raw = env::var(FOLDERS_ENV).ok();
    run(raw.as_deref(), channel, &mut io::stdout().lock())
}

/// Log every message the launcher sends over the channel until it closes.
/// Returns the number of messages read.
pub fn log_parent_messages(input: impl BufRead) -> usize {
    let mut received = 0;

    for line in input.split(b'\n') {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "reading the message channel failed");
                break;
            }
        };
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        received += 1;
        match serde_json::from_slice::<serde_json::Value>(line) {
            Ok(message) => info!(%message, "message from parent"),
            Err(_) => info!(message = %String::from_utf8_lossy(line), "non-JSON message from parent"),
        }
    }

    debug!(received, "message channel closed by parent");
    received
}

/// Worker body, parameterised over input and output.
pub fn run(folders_json: Option<&str>, channel: bool, out: &mut impl Write) -> i32 {
    let Some(raw) = folders_json else {
        info!("{FOLDERS_ENV} is not set; nothing to read");
        return EXIT_OK;
    };

    let folders = match parse_folders(raw) {
        Ok(folders) => folders,
        Err(e) => {
            error!(error = %e, "{FOLDERS_ENV} must be a JSON array of strings");
            return EXIT_FAILURE;
        }
    };

    for folder in &folders {
        let report = read_folder(Path::new(folder));
        if let Err(e) = emit(&report, channel, out) {
            warn!(folder = %folder, error = %e, "could not write folder report");
        }
    }

    debug!(folders = folders.len(), "worker finished");
    EXIT_OK
}

pub fn parse_folders(raw: &str) -> serde_json::Result<Vec<String>> {
    serde_json::from_str(raw)
}

/// List `folder` and read every entry. Never fails; problems are logged.
pub fn read_folder(folder: &Path) -> FolderReport {
    let mut report = FolderReport {
        folder: folder.display().to_string(),
        ..FolderReport::default()
    };

    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(folder = %report.folder, error = %e, "could not read directory; skipping");
            report.skipped = 1;
            return report;
        }
    };
    report.readable = true;

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(folder = %report.folder, error = %e, "could not read directory entry");
                report.skipped += 1;
                continue;
            }
        };

        match fs::read(&path) {
            Ok(content) => {
                report.files += 1;
                report.bytes += content.len() as u64;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read file; skipping");
                report.skipped += 1;
            }
        }
    }

    report
}

fn emit(report: &FolderReport, channel: bool, out: &mut impl Write) -> io::Result<()> {
    if channel {
        let line = json!({
            "folder": report.folder,
            "readable": report.readable,
            "files": report.files,
            "bytes": report.bytes,
            "skipped": report.skipped,
        });
        writeln!(out, "{line}")?;
    } else {
        writeln!(
            out,
            "{}: {} file(s), {} byte(s), {} skipped",
            report.folder, report.files, report.bytes, report.skipped
        )?;
    }
    out.flush()
}
