//! Subscriber setup: JSON lines to stdout, level via `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Build and install the subscriber.
///
/// Defaults to `info` when `RUST_LOG` is unset or unparseable. Targets are
/// suppressed since span fields already carry the operation name.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
