// src/bin/folder_worker.rs

use workerchain::{logging, worker};

fn main() {
    // stdout may be the message channel; logs go to stderr.
    if let Err(err) = logging::init_worker_logging() {
        eprintln!("folder-worker: failed to initialise logging: {err:?}");
    }
    std::process::exit(worker::run_from_env());
}
