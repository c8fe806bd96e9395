//! Tracing setup shared by both binaries.
//!
//! Logs go to stderr so that `--json` output on stdout stays machine
//! readable. `RUST_LOG` overrides the level chosen here.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber.
///
/// `debug` raises this crate to debug level; other crates stay at warn.
/// Calling this twice is harmless.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,assessment_search={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
