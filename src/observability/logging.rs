//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.

use crate::config::ObservabilityConfig;
use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Create a tracing span for a single listener translation.
///
/// ```rust,ignore
/// let span = translation_span!("http", "listener-insecure");
/// let span = translation_span!("sni", name, route_count = 3);
/// ```
#[macro_export]
macro_rules! translation_span {
    ($kind:expr, $listener:expr) => {
        tracing::info_span!(
            "listener_translation",
            kind = %$kind,
            listener = %$listener,
            translation_id = %uuid::Uuid::new_v4()
        )
    };
    ($kind:expr, $listener:expr, $($field:tt)*) => {
        tracing::info_span!(
            "listener_translation",
            kind = %$kind,
            listener = %$listener,
            translation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. An already installed
/// subscriber (e.g. from a test harness) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    // Subscriber already set elsewhere (e.g. integration tests); ignore.
    let _ = if config.json_logging { builder.json().try_init() } else { builder.try_init() };

    Ok(())
}
