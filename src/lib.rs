// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod types;
pub mod worker;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, DEFAULT_FOLDERS};
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::{LaunchConfig, LinkSpec};
use crate::engine::{ChainLink, ChainOrchestrator, ChainReport};
use crate::events::{EventKind, LifecycleEvent, DEFAULT_EVENT_CAPACITY};
use crate::exec::ProcessLauncher;

/// Name of the reference worker binary.
pub const FOLDER_WORKER_BIN: &str = "folder-worker";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (chain file, or the preconfigured single worker)
/// - the chain orchestrator
/// - forwarding of worker output to stdout
/// - Ctrl-C handling
///
/// The outcome (or rejection reason) is printed to stdout; a rejection is
/// also returned as an error so the process exits non-zero.
pub async fn run(args: CliArgs) -> Result<()> {
    let (links, event_capacity) = match chain_file_path(&args) {
        Some(path) => {
            info!(path = %path.display(), "loading chain file");
            let cfg = load_and_validate(&path)?;
            (cfg.links, cfg.chain.event_capacity)
        }
        None => (vec![preconfigured_link(&args)?], DEFAULT_EVENT_CAPACITY),
    };

    if args.dry_run {
        print_dry_run(&links);
        return Ok(());
    }

    // Ctrl-C → cancel the running link and abort the chain.
    let cancel = CancellationToken::new();
    {
        let token = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling running worker");
            token.cancel();
        });
    }

    let forwarders = OutputForwarders::default();
    let chain_links: Vec<ChainLink> = links.into_iter().map(ChainLink::from).collect();

    let result = ChainOrchestrator::new(chain_links)
        .with_cancellation(cancel)
        .with_event_capacity(event_capacity)
        .with_link_observer({
            let forwarders = forwarders.clone();
            move |position: usize, launcher: &ProcessLauncher| forwarders.observe(position, launcher)
        })
        .run()
        .await;

    forwarders.join().await;

    match result {
        Ok(report) => {
            println!("{}", describe_report(&report));
            Ok(())
        }
        Err(e) => {
            println!("rejected: {e}");
            Err(e.into())
        }
    }
}

/// `--config`, else `Workerchain.toml` in the working directory unless a
/// single-launch flag was given.
fn chain_file_path(args: &CliArgs) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(PathBuf::from(path));
    }
    if args.worker.is_some() || !args.folders.is_empty() {
        return None;
    }
    Some(default_config_path()).filter(|path| path.is_file())
}

/// The single launch used when no chain file is given.
fn preconfigured_link(args: &CliArgs) -> Result<LinkSpec> {
    let worker = args.worker.clone().unwrap_or_else(default_worker_path);

    let folders: Vec<String> = if args.folders.is_empty() {
        DEFAULT_FOLDERS.iter().map(|s| s.to_string()).collect()
    } else {
        args.folders.clone()
    };

    let launch = LaunchConfig::new(worker, args.mode).with_folders(folders)?;

    Ok(LinkSpec {
        name: Some(FOLDER_WORKER_BIN.to_string()),
        launch,
        message: None,
    })
}

/// `folder-worker` next to the running executable, or bare on `PATH`.
fn default_worker_path() -> String {
    let bin = format!("{FOLDER_WORKER_BIN}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&bin)))
        .filter(|path| path.is_file())
        .map(|path| path.display().to_string())
        .unwrap_or(bin)
}

/// Forwarding tasks of every link, awaited before the outcome is printed.
#[derive(Clone, Default)]
struct OutputForwarders {
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl OutputForwarders {
    fn observe(&self, position: usize, launcher: &ProcessLauncher) {
        let task = forward_worker_output(position, launcher);
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }

    /// Wait until every forwarded bus has completed. Links that never started
    /// have their bus closed by the chain, so this cannot hang.
    async fn join(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "worker output forwarder failed");
            }
        }
    }
}

/// Print worker stdout as it arrives and log worker messages.
fn forward_worker_output(position: usize, launcher: &ProcessLauncher) -> JoinHandle<()> {
    let mut events = launcher.bus().subscribe_kinds(&[
        EventKind::Data,
        EventKind::Message,
        EventKind::Disconnect,
    ]);
    let worker = launcher.config().worker.clone();

    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        let mut stdout_open = true;

        while let Some(event) = events.recv().await {
            match event {
                LifecycleEvent::Data(bytes) if stdout_open => {
                    let written = async {
                        stdout.write_all(&bytes).await?;
                        stdout.flush().await
                    }
                    .await;
                    if let Err(e) = written {
                        warn!(position, worker = %worker, error = %e, "cannot write worker output to stdout; discarding the rest");
                        stdout_open = false;
                    }
                }
                LifecycleEvent::Data(_) => {}
                LifecycleEvent::Message(message) => {
                    info!(position, worker = %worker, %message, "message from worker");
                }
                other => debug!(position, worker = %worker, event = %other, "worker event"),
            }
        }
    })
}

fn describe_report(report: &ChainReport) -> String {
    match report.last() {
        Some(last) => format!(
            "resolved: {} link(s) completed; last: {last}",
            report.links_run()
        ),
        None => "resolved: nothing to run".to_string(),
    }
}

/// Simple dry-run output: print links, modes and options.
fn print_dry_run(links: &[LinkSpec]) {
    println!("workerchain dry-run");
    println!();

    println!("links ({}):", links.len());
    for (idx, link) in links.iter().enumerate() {
        let launch = &link.launch;
        println!("  {}. {}", idx + 1, link.label());
        println!("      worker: {}", launch.worker);
        println!("      mode: {}", launch.mode);
        if !launch.args.is_empty() {
            println!("      args: {:?}", launch.args);
        }
        if launch.options.detached {
            println!("      detached: true");
        }
        if launch.options.shell {
            println!("      shell: true");
        }
        if let Some(ref cwd) = launch.options.cwd {
            println!("      cwd: {}", cwd.display());
        }
        for (key, value) in &launch.options.env {
            println!("      env: {key}={value}");
        }
        if let Some(ref message) = link.message {
            println!("      message: {message}");
        }
    }

    debug!("dry-run complete (no execution)");
}
