// src/config/launch.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::{LaunchError, Result};
use crate::types::LaunchMode;

/// Environment variable through which a worker receives its folder list,
/// as a JSON array of strings.
pub const FOLDERS_ENV: &str = "FOLDERS_TO_READ";

/// Mode-specific options applied when the worker process is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Run the worker in its own process group and let it outlive the
    /// supervising task.
    pub detached: bool,

    /// Run the worker line through the platform shell (spawn mode only;
    /// exec mode always uses the shell).
    pub shell: bool,

    /// Working directory; `None` inherits ours.
    pub cwd: Option<PathBuf>,

    /// Variables layered on top of the inherited environment.
    pub env: BTreeMap<String, String>,
}

/// Immutable configuration of one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Executable (or shell command line in exec mode).
    pub worker: String,
    pub args: Vec<String>,
    pub mode: LaunchMode,
    pub options: WorkerOptions,
}

impl LaunchConfig {
    pub fn new(worker: impl Into<String>, mode: LaunchMode) -> Self {
        Self {
            worker: worker.into(),
            args: Vec::new(),
            mode,
            options: WorkerOptions::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn detached(mut self, detached: bool) -> Self {
        self.options.detached = detached;
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.options.shell = shell;
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Pass a folder list to the worker through [`FOLDERS_ENV`].
    pub fn with_folders<I, S>(self, folders: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let folders: Vec<String> = folders.into_iter().map(Into::into).collect();
        let encoded = serde_json::to_string(&folders)?;
        Ok(self.env(FOLDERS_ENV, encoded))
    }

    /// Worker and arguments joined into one line, as handed to the shell.
    pub fn command_line(&self) -> String {
        let mut line = self.worker.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Checks everything that can be checked before an OS process exists.
    pub fn validate(&self) -> Result<()> {
        if self.worker.trim().is_empty() {
            return Err(LaunchError::ConfigError(
                "worker path must not be empty".to_string(),
            ));
        }

        if let Some(cwd) = &self.options.cwd {
            if !cwd.is_dir() {
                return Err(LaunchError::ConfigError(format!(
                    "working directory '{}' does not exist or is not a directory",
                    cwd.display()
                )));
            }
        }

        for key in self.options.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(LaunchError::ConfigError(format!(
                    "invalid environment variable name '{key}'"
                )));
            }
        }

        Ok(())
    }
}
