// src/config/validate.rs

use crate::config::launch::{LaunchConfig, FOLDERS_ENV};
use crate::config::model::{ChainFile, LinkSpec, RawChainFile, RawLinkConfig};
use crate::errors::{LaunchError, Result};
use crate::types::LaunchMode;

impl TryFrom<RawChainFile> for ChainFile {
    type Error = LaunchError;

    fn try_from(raw: RawChainFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_links(&raw)?;
        validate_chain_section(&raw)?;

        let links = raw
            .link
            .into_iter()
            .enumerate()
            .map(|(idx, link)| validate_link(idx + 1, link))
            .collect::<Result<Vec<_>>>()?;

        Ok(ChainFile {
            chain: raw.chain,
            links,
        })
    }
}

fn ensure_has_links(cfg: &RawChainFile) -> Result<()> {
    if cfg.link.is_empty() {
        return Err(LaunchError::ConfigError(
            "config must contain at least one [[link]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_chain_section(cfg: &RawChainFile) -> Result<()> {
    if cfg.chain.event_capacity == 0 {
        return Err(LaunchError::ConfigError(
            "[chain].event_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Turn one raw `[[link]]` into a [`LinkSpec`]. `position` is 1-based and
/// only used for error messages.
fn validate_link(position: usize, raw: RawLinkConfig) -> Result<LinkSpec> {
    // Unknown modes surface as `InvalidMode`, not as a generic config error.
    let mode: LaunchMode = raw.mode.parse()?;

    if raw.worker.trim().is_empty() {
        return Err(LaunchError::ConfigError(format!(
            "link {position}: `worker` must not be empty"
        )));
    }

    if raw.message.is_some() && !mode.has_message_channel() {
        return Err(LaunchError::ConfigError(format!(
            "link {position}: `message` requires mode = \"fork\" (got \"{mode}\")"
        )));
    }

    if raw.folders.is_some() && raw.env.contains_key(FOLDERS_ENV) {
        return Err(LaunchError::ConfigError(format!(
            "link {position}: set either `folders` or env.{FOLDERS_ENV}, not both"
        )));
    }

    for key in raw.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(LaunchError::ConfigError(format!(
                "link {position}: invalid environment variable name '{key}'"
            )));
        }
    }

    let mut launch = LaunchConfig::new(raw.worker, mode)
        .args(raw.args)
        .detached(raw.detached)
        .shell(raw.shell);
    launch.options.cwd = raw.cwd;
    launch.options.env = raw.env;

    if let Some(folders) = raw.folders {
        launch = launch.with_folders(folders)?;
    }

    let message = raw
        .message
        .map(serde_json::to_value)
        .transpose()?;

    Ok(LinkSpec {
        name: raw.name,
        launch,
        message,
    })
}
