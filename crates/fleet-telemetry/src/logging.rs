//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info,fleet=debug";

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// `RUST_ENV=production` selects JSON; anything else is pretty.
    pub fn from_rust_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging section of the application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    #[serde(default)]
    pub filter: Option<String>,
    /// Forces a format; otherwise chosen from `RUST_ENV`.
    #[serde(default)]
    pub format: Option<LogFormat>,
}

impl LoggingConfig {
    fn resolve_format(&self) -> LogFormat {
        self.format.unwrap_or_else(|| {
            LogFormat::from_rust_env(std::env::var("RUST_ENV").ok().as_deref())
        })
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        let directive = self.filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter {
            directive: directive.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Initialize logging with defaults.
///
/// JSON output when `RUST_ENV=production`, pretty output otherwise.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(&LoggingConfig::default())
}

/// Initialize logging from config. Fails if a subscriber is already set.
pub fn init_logging_with(config: &LoggingConfig) -> TelemetryResult<()> {
    let env_filter = config.build_filter()?;

    let result = match config.resolve_format() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_rust_env() {
        assert_eq!(LogFormat::from_rust_env(Some("production")), LogFormat::Json);
        assert_eq!(LogFormat::from_rust_env(Some("development")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_rust_env(None), LogFormat::Pretty);
    }

    #[test]
    fn test_explicit_format_wins() {
        let config = LoggingConfig {
            filter: None,
            format: Some(LogFormat::Json),
        };
        assert_eq!(config.resolve_format(), LogFormat::Json);
    }

    #[test]
    fn test_config_from_toml() {
        let config: LoggingConfig = toml::from_str(
            r#"
            filter = "warn,fleet_ws=trace"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.as_deref(), Some("warn,fleet_ws=trace"));
        assert_eq!(config.format, Some(LogFormat::Json));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
