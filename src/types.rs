use std::fmt;
use std::str::FromStr;

use crate::errors::LaunchError;

/// OS-level strategy used to start a worker.
///
/// - `Fork`: message-capable child process. The worker's stdio carries a
///   newline-delimited JSON channel in both directions.
/// - `Spawn`: plain OS process; stdout chunks are reported as data.
/// - `Exec`: command line run through the platform shell; stdout is buffered
///   and reported once the process has finished.
///
/// A launch always names its mode; there is no `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchMode {
    Fork,
    Spawn,
    Exec,
}

impl LaunchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchMode::Fork => "fork",
            LaunchMode::Spawn => "spawn",
            LaunchMode::Exec => "exec",
        }
    }

    /// Whether this mode opens a message channel to the worker.
    pub fn has_message_channel(&self) -> bool {
        matches!(self, LaunchMode::Fork)
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchMode {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fork" => Ok(LaunchMode::Fork),
            "spawn" => Ok(LaunchMode::Spawn),
            "exec" => Ok(LaunchMode::Exec),
            other => Err(LaunchError::InvalidMode(other.to_string())),
        }
    }
}
