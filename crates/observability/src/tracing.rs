//! Tracing/logging initialization.
//!
//! Authorization spans record the failure class of a denied or unresolved
//! request, never the credential itself, so JSON logs are safe to ship as-is.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    // Authorization decisions log at debug; default to keeping them visible
    // for our own crates without drowning in dependency noise.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,concours_auth=debug,concours_store=debug"));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
