//! Tracing setup for binaries and hosts embedding the dashboard.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=paneview_sync=trace` - Trace the sync layer only
//! - Default: `info`, with debug for the paneview crates

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,paneview_sync=debug,paneview_core=debug";

/// Installs a global fmt subscriber. Returns `false` if one was already set.
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing();
        assert!(!init_tracing());
    }
}
