// tests/config_loading.rs

mod common;
use crate::common::TestResult;

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

use workerchain::config::{load_and_validate, load_from_path, FOLDERS_ENV};
use workerchain::engine::{ChainLink, LinkCallback};
use workerchain::errors::LaunchError;
use workerchain::events::DEFAULT_EVENT_CAPACITY;
use workerchain::types::LaunchMode;

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Workerchain.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

#[test]
fn valid_chain_file_is_loaded_in_order() -> TestResult {
    let (_dir, path) = write_config(
        r#"
        [chain]
        event_capacity = 32

        [[link]]
        name = "reader"
        worker = "./folder-worker"
        mode = "fork"
        folders = ["./files/testOne", "./files/testTwo"]
        message = { greeting = "hello", count = 2 }

        [[link]]
        worker = "echo done"
        mode = "exec"

        [[link]]
        worker = "ls"
        mode = "Spawn"
        args = ["-l"]
        detached = true
        env = { LS_COLORS = "" }
        "#,
    );

    let chain = load_and_validate(&path)?;
    assert_eq!(chain.chain.event_capacity, 32);
    assert_eq!(chain.links.len(), 3);

    let reader = &chain.links[0];
    assert_eq!(reader.label(), "reader");
    assert_eq!(reader.launch.mode, LaunchMode::Fork);
    assert_eq!(
        reader.launch.options.env.get(FOLDERS_ENV).map(String::as_str),
        Some(r#"["./files/testOne","./files/testTwo"]"#)
    );
    assert_eq!(reader.message, Some(json!({"greeting": "hello", "count": 2})));

    let exec = &chain.links[1];
    assert_eq!(exec.launch.mode, LaunchMode::Exec);
    assert_eq!(exec.label(), "echo done");
    assert_eq!(exec.message, None);

    let spawn = &chain.links[2];
    assert_eq!(spawn.launch.mode, LaunchMode::Spawn);
    assert_eq!(spawn.launch.args, vec!["-l"]);
    assert!(spawn.launch.options.detached);
    assert_eq!(spawn.label(), "ls -l");

    Ok(())
}

#[test]
fn chain_section_is_optional() -> TestResult {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        worker = "true"
        mode = "spawn"
        "#,
    );

    let chain = load_and_validate(&path)?;
    assert_eq!(chain.chain.event_capacity, DEFAULT_EVENT_CAPACITY);
    Ok(())
}

#[test]
fn unknown_mode_is_an_invalid_mode_error() {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        worker = "true"
        mode = "thread"
        "#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LaunchError::InvalidMode(ref m) if m == "thread"));
    assert!(err.is_configuration_error());
}

#[test]
fn missing_mode_is_a_parse_error() {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        worker = "true"
        "#,
    );

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, LaunchError::TomlError(_)));
}

#[test]
fn chain_without_links_is_rejected() {
    let (_dir, path) = write_config("[chain]\nevent_capacity = 8\n");

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LaunchError::ConfigError(ref m) if m.contains("[[link]]")));
}

#[test]
fn zero_event_capacity_is_rejected() {
    let (_dir, path) = write_config(
        r#"
        [chain]
        event_capacity = 0

        [[link]]
        worker = "true"
        mode = "spawn"
        "#,
    );

    assert!(matches!(
        load_and_validate(&path),
        Err(LaunchError::ConfigError(_))
    ));
}

#[test]
fn message_requires_fork_mode() {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        worker = "true"
        mode = "spawn"
        message = { hello = "world" }
        "#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LaunchError::ConfigError(ref m) if m.contains("link 1")));
}

#[test]
fn folders_and_explicit_folder_env_conflict() {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        worker = "true"
        mode = "spawn"

        [[link]]
        worker = "./folder-worker"
        mode = "fork"
        folders = ["a"]
        env = { FOLDERS_TO_READ = "[\"b\"]" }
        "#,
    );

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LaunchError::ConfigError(ref m) if m.contains("link 2")));
}

#[test]
fn empty_worker_is_rejected() {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        worker = "   "
        mode = "exec"
        "#,
    );

    assert!(matches!(
        load_and_validate(&path),
        Err(LaunchError::ConfigError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_from_path(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, LaunchError::IoError(_)));
}

#[test]
fn link_spec_with_message_becomes_an_after_start_link() -> TestResult {
    let (_dir, path) = write_config(
        r#"
        [[link]]
        name = "with-message"
        worker = "./folder-worker"
        mode = "fork"
        message = { go = true }

        [[link]]
        worker = "true"
        mode = "spawn"
        "#,
    );

    let mut links: Vec<ChainLink> = load_and_validate(&path)?
        .links
        .into_iter()
        .map(ChainLink::from)
        .collect();

    let plain = links.pop().unwrap();
    assert!(plain.callback.is_none());

    let messaging = links.pop().unwrap();
    assert_eq!(messaging.name.as_deref(), Some("with-message"));
    assert!(matches!(messaging.callback, Some(LinkCallback::AfterStart(_))));

    Ok(())
}
