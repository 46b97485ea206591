//! Subscriber set-up. Library crates log through `log`; the `tracing-log`
//! bridge forwards those records to the fmt subscriber on stderr.

use tracing_subscriber::EnvFilter;

const ENV_LOG_LEVEL: &str = "KINDRED_LOG_LEVEL";
const DEFAULT_FILTER: &str = "info";

/// Pick the filter: explicit flag, then `KINDRED_LOG_LEVEL`, then `RUST_LOG`.
fn filter(flag: Option<&str>) -> EnvFilter {
    flag.and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_env(ENV_LOG_LEVEL).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub(crate) fn init(flag: Option<&str>) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter(flag))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    if installed.is_err() {
        log::debug!("log subscriber already installed");
    }
}
