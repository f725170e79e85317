//! Logging setup for the replay binary

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a formatted subscriber filtered by `RUST_LOG`
///
/// If RUST_LOG is not set, a default is chosen based on the build profile.
pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var("RUST_LOG", "debug,waytrack_lib=debug");
            } else {
                std::env::set_var("RUST_LOG", "info,waytrack_lib=info");
            }
        }
    }

    let fmt_layer = fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!("Logging initialized");
}
