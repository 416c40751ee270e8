//! Subscriber setup for `tracing`
//!
//! The engine only emits events; installing a subscriber is left to the
//! application. These helpers install a `fmt` subscriber filtered by
//! `RUST_LOG`, falling back to the configured level. Installing twice is
//! harmless: the second call returns `false`.

use crate::config::EngineConfig;
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber at `level` unless `RUST_LOG` is set
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

/// Install a global subscriber at the configuration's `log_level`
pub fn init_from_config(config: &EngineConfig) -> bool {
    init(&config.log_level)
}

/// Subscriber for tests: output captured by the test harness
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_refused() {
        init_for_tests();
        assert!(!init("debug"));
        assert!(!init_from_config(&EngineConfig::default()));
    }
}
