//! Logging setup

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
///
/// `format` is `json`, `compact` or anything else for the multi-line
/// pretty output. Calling this twice is a no-op.
pub fn init_observability(log_level: &str, format: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(false))
            .try_init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// [`init_observability`] from the `[logging]` section
pub fn init_from_config(logging: &LoggingConfig) {
    init_observability(&logging.level, &logging.format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_observability("debug", "compact");
        init_observability("info", "json");
        tracing::info!("still logging");
    }
}
