#![allow(dead_code)]

use std::error::Error;

pub use workerchain_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Path of the reference worker built alongside these tests.
pub fn folder_worker() -> &'static str {
    env!("CARGO_BIN_EXE_folder-worker")
}
