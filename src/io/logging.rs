//! Diagnostic output through `tracing`

use tracing_subscriber::{EnvFilter, fmt};

/// Install a stderr subscriber honouring `RUST_LOG`
///
/// Without `RUST_LOG` only warnings are shown, or informational events too
/// when `verbose` is set. Returns `false` if a subscriber was already
/// installed, which is harmless.
pub fn init_logging(verbose: bool) -> bool {
    let default_directive = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
