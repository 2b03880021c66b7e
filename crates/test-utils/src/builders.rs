#![allow(dead_code)]

use std::path::Path;

use workerchain::config::LaunchConfig;
use workerchain::engine::ChainLink;
use workerchain::types::LaunchMode;

/// Spawn-mode launch of a `sh -c` script.
pub fn sh_spawn(script: &str) -> LaunchConfig {
    LaunchConfig::new(script, LaunchMode::Spawn).shell(true)
}

/// Exec-mode launch of a command line.
pub fn sh_exec(line: &str) -> LaunchConfig {
    LaunchConfig::new(line, LaunchMode::Exec)
}

/// Fork-mode launch of `sh -c script`; the script's stdin/stdout are the
/// message channel.
pub fn sh_fork(script: &str) -> LaunchConfig {
    LaunchConfig::new("sh", LaunchMode::Fork).args(["-c", script])
}

/// Folder worker at `worker` reading `folders`.
pub fn folder_worker(worker: &str, mode: LaunchMode, folders: &[&Path]) -> LaunchConfig {
    let folders: Vec<String> = folders.iter().map(|p| p.display().to_string()).collect();
    LaunchConfig::new(worker, mode)
        .with_folders(folders)
        .expect("folder list is always serializable")
}

/// Builder for a list of chain links.
pub struct ChainBuilder {
    links: Vec<ChainLink>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    pub fn link(mut self, config: LaunchConfig) -> Self {
        self.links.push(ChainLink::new(config));
        self
    }

    pub fn with_link(mut self, link: ChainLink) -> Self {
        self.links.push(link);
        self
    }

    /// Link that appends `marker` to `log` and exits with `code`.
    pub fn marker(self, log: &Path, marker: &str, code: i32) -> Self {
        let script = format!("echo {marker} >> '{}'; exit {code}", log.display());
        self.link(sh_spawn(&script))
    }

    pub fn build(self) -> Vec<ChainLink> {
        self.links
    }
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
