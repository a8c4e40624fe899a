//! Structured logging setup using `tracing-subscriber`.
//!
//! The adapter itself only emits `tracing` events; hosts that embed it (and
//! the integration tests) can call [`init`] to get human-readable stderr
//! output controlled by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialise console logging.
///
/// Emits human-readable output to stderr, filtered by the `RUST_LOG`
/// environment variable (default: `info`). Safe to call more than once;
/// later calls are no-ops.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
