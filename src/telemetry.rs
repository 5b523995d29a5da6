//! Tracing bootstrap for embedders and tests.

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initializes a formatted tracing subscriber filtered by `RUST_LOG`,
/// defaulting to `info,imposter=debug`.
///
/// Safe to call more than once; later calls are no-ops, so tests can call it
/// unconditionally.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,imposter=debug".into()),
        )
        .try_init()
        .is_ok();
    if initialized {
        info!("Tracing initialized");
    }
}
