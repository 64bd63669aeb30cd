//! Tracing bootstrap shared by every binary in this workspace.

use tracing_subscriber::EnvFilter;

/// Initialize a `tracing_subscriber::fmt` subscriber with an `EnvFilter`.
///
/// `default_directive` is used when `RUST_LOG` is unset — callers typically
/// pass something like `"crucible_cli=info,crucible_query=info"`. Safe to
/// call more than once per process; later calls are no-ops.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
