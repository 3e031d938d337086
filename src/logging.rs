//! Logging bootstrap for the command line
//!
//! The library only emits `tracing` events; installing a subscriber is up
//! to the binary. Initialization is idempotent.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "kvsync=debug,info";

/// Installs a stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Returns false if a global subscriber was already set.
pub fn init_logging(verbose: bool) -> bool {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
