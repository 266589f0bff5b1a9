//! Environment-driven configuration.

use std::time::Duration;

use thiserror::Error;
use trapshield_client::{DEFAULT_ENDPOINT, DEFAULT_MODEL, ProviderConfig};

use crate::logging::{LogConfig, LogFormat};

/// Provider credential.
pub const API_KEY_ENV: &str = "TRAPSHIELD_API_KEY";
/// Credential fallback name.
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";
/// Model id override.
pub const MODEL_ENV: &str = "TRAPSHIELD_MODEL";
/// Provider base URL override.
pub const ENDPOINT_ENV: &str = "TRAPSHIELD_ENDPOINT";
/// Optional transport timeout in whole seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "TRAPSHIELD_REQUEST_TIMEOUT_SECS";
/// `json` or `pretty`.
pub const LOG_FORMAT_ENV: &str = "TRAPSHIELD_LOG_FORMAT";
/// `EnvFilter` directive.
pub const LOG_FILTER_ENV: &str = "TRAPSHIELD_LOG";

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Provider settings. The credential is checked when the client is built.
    pub provider: ProviderConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from a key lookup. Blank values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for unparsable timeout or log format values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(API_KEY_ENV)
            .or_else(|| read(LEGACY_API_KEY_ENV))
            .unwrap_or_default();

        let request_timeout = read(REQUEST_TIMEOUT_ENV)
            .map(|raw| match raw.parse::<u64>() {
                Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
                _ => Err(ConfigError::InvalidValue {
                    key: REQUEST_TIMEOUT_ENV,
                    value: raw,
                }),
            })
            .transpose()?;

        let format = match read(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidValue {
                key: LOG_FORMAT_ENV,
                value: raw,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                model: read(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                endpoint: read(ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                request_timeout,
            },
            log: LogConfig {
                format,
                level: read(LOG_FILTER_ENV).unwrap_or_else(|| LogConfig::default().level),
            },
        })
    }
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable is set to a value that does not parse.
    #[error("invalid value `{value}` for {key}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}
