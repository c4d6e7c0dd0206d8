//! Subscriber installation for applications embedding buildflow.

use crate::errors::BuildflowError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the filter directive (e.g. `buildflow=debug`).
pub const LOG_ENV: &str = "BUILDFLOW_LOG";

/// Environment variable selecting the output format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "BUILDFLOW_LOG_FORMAT";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive in `EnvFilter` syntax.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Whether to include the event target.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Text,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads [`LOG_ENV`] and [`LOG_FORMAT_ENV`], falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).filter(|value| !value.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            if format.trim().eq_ignore_ascii_case("json") {
                config.format = LogFormat::Json;
            }
        }
        config
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Switches to JSON output.
    #[must_use]
    pub fn json(self) -> Self {
        self.with_format(LogFormat::Json)
    }

    /// Sets whether the event target is printed.
    #[must_use]
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}

/// Installs a global fmt subscriber configured by `config`.
///
/// # Errors
///
/// Returns [`BuildflowError::Logging`] if the filter directive is invalid
/// or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), BuildflowError> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|err| BuildflowError::Logging(format!("invalid filter '{}': {err}", config.filter)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(config.with_target))
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
            .try_init(),
    };

    installed.map_err(|err| BuildflowError::Logging(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_defaults() {
        let config = LogConfig::from_lookup(|_| None);
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let vars = HashMap::from([
            (LOG_ENV, "buildflow=debug".to_string()),
            (LOG_FORMAT_ENV, "JSON".to_string()),
        ]);
        let config = LogConfig::from_lookup(|key| vars.get(key).cloned());

        assert_eq!(config.filter, "buildflow=debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::new().with_filter("warn").json().with_target(false);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_target);
    }

    #[test]
    fn test_init_logging_twice_errors() {
        let config = LogConfig::new().with_filter("off");
        let _ = init_logging(&config);

        assert!(matches!(init_logging(&config), Err(BuildflowError::Logging(_))));
    }
}
