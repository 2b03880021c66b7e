// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

use crate::config::launch::LaunchConfig;
use crate::events::DEFAULT_EVENT_CAPACITY;

/// Chain file as read from TOML, before validation.
///
/// ```toml
/// [chain]
/// event_capacity = 256
///
/// [[link]]
/// worker = "./target/debug/folder-worker"
/// mode = "fork"
/// folders = ["./files/testOne", "./files/testTwo"]
///
/// [[link]]
/// worker = "echo done"
/// mode = "exec"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawChainFile {
    #[serde(default)]
    pub chain: ChainSection,

    /// All `[[link]]` entries, in execution order.
    #[serde(default)]
    pub link: Vec<RawLinkConfig>,
}

/// `[chain]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    /// Capacity of each launcher's event bus.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

/// One `[[link]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLinkConfig {
    /// Optional label used in logs and dry-run output.
    #[serde(default)]
    pub name: Option<String>,

    pub worker: String,

    /// `"fork"`, `"spawn"` or `"exec"`. Required; there is no default mode.
    pub mode: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub detached: bool,

    #[serde(default)]
    pub shell: bool,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Serialized into `FOLDERS_TO_READ` for the worker.
    #[serde(default)]
    pub folders: Option<Vec<String>>,

    /// Sent to the worker right after start (fork mode only).
    #[serde(default)]
    pub message: Option<toml::Value>,
}

/// A validated chain file.
#[derive(Debug, Clone)]
pub struct ChainFile {
    pub chain: ChainSection,
    pub links: Vec<LinkSpec>,
}

/// A validated link: its launch configuration and optional start message.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub name: Option<String>,
    pub launch: LaunchConfig,
    pub message: Option<Value>,
}

impl LinkSpec {
    /// Label for logs: the configured name or the worker line.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.launch.command_line())
    }
}
