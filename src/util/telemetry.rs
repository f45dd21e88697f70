//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Default filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "cluster_parking_lot=info";

/// Install a fmt subscriber filtered by `RUST_LOG` (falling back to
/// [`DEFAULT_DIRECTIVE`]). Does nothing if a global subscriber already exists,
/// so applications can install their own first.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
