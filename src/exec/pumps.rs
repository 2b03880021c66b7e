// src/exec/pumps.rs

//! Background tasks that move bytes between a worker's stdio and the bus.
//!
//! Each function spawns a Tokio task and returns immediately:
//! - [`spawn_data_pump`] publishes every stdout chunk as `Data` (spawn mode).
//! - [`spawn_buffered_pump`] collects all of stdout for exec mode; the
//!   supervisor publishes it once the process has finished.
//! - [`spawn_message_pump`] parses newline-delimited JSON from stdout into
//!   `Message` events and reports `Disconnect` at EOF (fork mode).
//! - [`spawn_message_writer`] serializes outgoing messages to stdin.
//! - [`spawn_stderr_logger`] drains stderr so the pipe never fills.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::errors::{FaultStage, ProcessFault};
use crate::events::{EventBus, LifecycleEvent};

const CHUNK_SIZE: usize = 8 * 1024;

pub fn spawn_data_pump(stdout: ChildStdout, bus: EventBus, worker: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdout = stdout;
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            match stdout.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    trace!(worker = %worker, bytes = n, "stdout chunk");
                    bus.publish(LifecycleEvent::Data(buf[..n].to_vec()));
                }
                Err(e) => {
                    warn!(worker = %worker, error = %e, "reading worker stdout failed");
                    break;
                }
            }
        }

        debug!(worker = %worker, "stdout pump ended");
    })
}

pub fn spawn_buffered_pump(stdout: ChildStdout, worker: String) -> JoinHandle<Vec<u8>> {
    tokio::spawn(async move {
        let mut stdout = stdout;
        let mut out = Vec::new();
        if let Err(e) = stdout.read_to_end(&mut out).await {
            warn!(worker = %worker, error = %e, "reading worker stdout failed; output truncated");
        }
        out
    })
}

pub fn spawn_message_pump(stdout: ChildStdout, bus: EventBus, worker: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = buf.trim_ascii();
                    if line.is_empty() {
                        continue;
                    }
                    bus.publish(LifecycleEvent::Message(decode_message(line)));
                }
                Err(e) => {
                    let fault = ProcessFault::new(FaultStage::Ipc, worker.clone(), &e);
                    warn!(worker = %worker, error = %fault, "message channel read failed");
                    bus.publish(LifecycleEvent::Error(fault));
                    break;
                }
            }
        }

        debug!(worker = %worker, "message channel disconnected");
        bus.publish(LifecycleEvent::Disconnect);
    })
}

/// Lines that are not JSON (or not UTF-8) are passed through as JSON
/// strings, lossily decoded.
fn decode_message(line: &[u8]) -> Value {
    serde_json::from_slice(line)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(line).into_owned()))
}

pub fn spawn_message_writer(
    stdin: ChildStdin,
    mut rx: mpsc::UnboundedReceiver<Value>,
    worker: String,
) {
    tokio::spawn(async move {
        let mut stdin = stdin;

        while let Some(message) = rx.recv().await {
            let mut line = message.to_string();
            line.push('\n');

            let written = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.flush().await
            }
            .await;

            if let Err(e) = written {
                debug!(worker = %worker, error = %e, "worker closed its message channel; dropping writer");
                break;
            }
        }
    });
}

pub fn spawn_stderr_logger(stderr: ChildStderr, worker: String) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(buf.trim_ascii_end());
                    debug!(worker = %worker, "stderr: {}", line);
                }
                Err(e) => {
                    debug!(worker = %worker, error = %e, "reading worker stderr failed");
                    break;
                }
            }
        }
    });
}
