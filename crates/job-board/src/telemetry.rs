//! Tracing setup for the job board binaries.
//!
//! Filtering follows `RUST_LOG` when it holds a usable directive and falls back to
//! `APP_LOG_LEVEL` from [`TelemetryConfig`] otherwise. Output is the compact fmt layer
//! without ANSI colours, so container logs stay greppable.

use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Failure to install the process-wide subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid `EnvFilter` directive.
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    /// A global subscriber was already set, usually by an earlier `init`.
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Build the log filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_directives(&config.log_level),
    }
}

fn parse_directives(value: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(value).map_err(|source| TelemetryError::EnvFilter {
        value: value.to_string(),
        source,
    })
}

/// Install the global fmt subscriber. Call once per process.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = env_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_per_crate_directives() {
        for value in ["info", "job_board=debug,tower_http=warn", "WARN"] {
            assert!(parse_directives(value).is_ok(), "{value} should parse");
        }
    }

    #[test]
    fn rejects_malformed_filters() {
        let value = "job_board=notalevel";
        match parse_directives(value) {
            Err(err @ TelemetryError::EnvFilter { .. }) => {
                assert!(err.to_string().contains(value));
                assert!(std::error::Error::source(&err).is_some());
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }

    #[test]
    fn configured_level_applies_when_rust_log_is_unset() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "job_board=trace".to_string(),
        };
        let filter = env_filter(&config).expect("filter builds");
        assert!(filter.to_string().contains("job_board=trace"));
    }
}
