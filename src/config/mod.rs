// src/config/mod.rs

//! Launch configuration and TOML chain files.
//!
//! - [`launch`] holds the in-memory [`LaunchConfig`] used by the launcher.
//! - [`model`] maps the TOML chain file.
//! - [`validate`] turns raw TOML into validated link specs.
//! - [`loader`] reads files from disk.

pub mod launch;
pub mod loader;
pub mod model;
pub mod validate;

pub use launch::{LaunchConfig, WorkerOptions, FOLDERS_ENV};
pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str, DEFAULT_CONFIG_FILE};
pub use model::{ChainFile, ChainSection, LinkSpec, RawChainFile, RawLinkConfig};
