pub mod builders;
pub mod fake_executor;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Install the test tracing subscriber once per process.
///
/// Output goes through `with_test_writer`, so the harness only shows it for
/// failing tests (or under `--nocapture`). Defaults to `info`; override with
/// `RUST_LOG`, e.g. `RUST_LOG=assetpipe=debug cargo test`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_test_writer().init();
    });
}

/// Bound an async test so a wedged watcher or socket fails it instead of
/// hanging the whole suite.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    const LIMIT: Duration = Duration::from_secs(10);
    match tokio::time::timeout(LIMIT, f).await {
        Ok(value) => value,
        Err(_) => panic!("async test still running after {LIMIT:?}"),
    }
}
