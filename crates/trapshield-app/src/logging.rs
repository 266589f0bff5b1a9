//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries only the rendered report.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

impl LogFormat {
    /// Parses `json` or `pretty` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive such as `info` or `trapshield_client=debug`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

/// Logging initialization failures.
#[derive(Debug, Error)]
pub enum LogError {
    /// Filter directive did not parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialized")]
    AlreadyInitialized,
}

/// Installs the global subscriber. Call once at start-up.
///
/// # Errors
/// Returns [`LogError`] for a bad filter or a second initialization.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|error| LogError::InvalidFilter(error.to_string()))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|_| LogError::AlreadyInitialized)
}
