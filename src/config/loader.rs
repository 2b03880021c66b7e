// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ChainFile, RawChainFile};
use crate::errors::Result;

/// File looked up by the CLI when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Workerchain.toml";

/// Read a chain file without validating it.
///
/// Only TOML shape errors are reported here (missing `mode`, wrong types).
/// Modes, worker paths and environment names are checked by
/// [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawChainFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "read chain file");
    parse_str(&contents)
}

/// Parse chain-file TOML held in memory.
pub fn parse_str(contents: &str) -> Result<RawChainFile> {
    Ok(toml::from_str(contents)?)
}

/// Read and validate a chain file.
///
/// Defaults come from `serde`; every link's mode is parsed (`InvalidMode` on
/// unknown values) and per-link rules are enforced by
/// `TryFrom<RawChainFile>`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ChainFile> {
    ChainFile::try_from(load_from_path(path)?)
}

/// `Workerchain.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
