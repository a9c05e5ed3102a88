//! Logging setup.
//!
//! Installs a `tracing` subscriber according to [`LoggingConfig`]. The
//! `RUST_LOG` environment variable overrides the configured level when set.
//! Log calls at connect/disconnect/error points are fire-and-forget and
//! never block protocol work.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. Safe to call once per process;
/// subsequent calls are ignored so tests can race it harmlessly.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!("subscriber already installed: {e}");
    }
}
