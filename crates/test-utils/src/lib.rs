//! Shared helpers for `workerchain` integration tests.
//!
//! - [`builders`]: launch configs and chains built from `sh` one-liners.
//! - [`recorder`]: capture every event a bus delivers.

pub mod builders;
pub mod recorder;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};
use workerchain::logging::LOG_ENV;

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for failing
/// tests (or with `--nocapture`). The filter comes from `WORKERCHAIN_LOG`,
/// e.g. `WORKERCHAIN_LOG=workerchain::exec=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step timed out after {TEST_TIMEOUT:?}"))
}
