//! Tracing subscriber setup for embedders and tests.

use tracing_subscriber::EnvFilter;

/// Installs a formatted subscriber honoring `RUST_LOG`, falling back to the
/// given directive. Safe to call more than once; later calls are no-ops.
pub fn init_with_default(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// [`init_with_default`] at `info`.
pub fn init() {
    init_with_default("info");
}
