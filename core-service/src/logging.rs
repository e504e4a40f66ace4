//! Logging setup for hosts.
//!
//! The engine crates emit structured `tracing` events and never install a
//! subscriber themselves. Hosts call [`init_logging`] once at startup; tests
//! and embedders that bring their own subscriber simply skip it.

use crate::error::{CoreError, Result};
use tracing_subscriber::{
    filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development.
    Pretty,
    /// Structured JSON for machine parsing.
    Json,
    /// Compact single-line format.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Custom filter string (e.g. "core_catalog=debug,core_history=trace").
    /// When unset, `RUST_LOG` wins, then a debug default over our crates.
    pub filter: Option<String>,
    /// Display the target module in log lines.
    pub display_target: bool,
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Install the global subscriber. Call once at startup; a second call fails.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(config.display_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target),
            )
            .try_init(),
    };

    result.map_err(|e| CoreError::Logging(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Some(custom) = &config.filter {
        return EnvFilter::try_new(custom)
            .map_err(|e| CoreError::Logging(format!("Invalid log filter: {}", e)));
    }
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "core_catalog=debug,core_accounts=debug,core_history=debug,\
             core_playlists=debug,core_service=debug",
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        let config = LoggingConfig::default().with_filter("not==a==filter");
        assert!(matches!(
            init_logging(config),
            Err(CoreError::Logging(_))
        ));
    }

    #[test]
    fn test_default_format_tracks_build_profile() {
        #[cfg(debug_assertions)]
        assert_eq!(LogFormat::default(), LogFormat::Pretty);

        #[cfg(not(debug_assertions))]
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }
}
