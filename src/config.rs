//! Process configuration management
//!
//! Settings that describe the host rather than a benchmark plan: where the
//! runtime sockets live, how long to wait for a dial, and how to log. They
//! are read from environment variables (optionally seeded from a `.env`
//! file) once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_DIAL_TIMEOUT_SECS, DEFAULT_LOG_LEVEL, DEFAULT_SOCKET_ROOT};

/// Main process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

/// CRI connection configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory containing `<backend>/<backend>.sock`
    pub socket_root: PathBuf,
    /// Timeout for establishing a connection to an endpoint
    pub dial_timeout: Duration,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub rust_log: String,
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            runtime: RuntimeConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            socket_root: PathBuf::from(DEFAULT_SOCKET_ROOT),
            dial_timeout: Duration::from_secs(DEFAULT_DIAL_TIMEOUT_SECS),
        }
    }
}

impl RuntimeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let dial_timeout_secs: u64 = env::var("CRI_DIAL_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_DIAL_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("CRI_DIAL_TIMEOUT_SECS".to_string()))?;

        if dial_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("CRI_DIAL_TIMEOUT_SECS".to_string()));
        }

        Ok(Self {
            socket_root: PathBuf::from(
                env::var("CRI_SOCKET_ROOT").unwrap_or_else(|_| DEFAULT_SOCKET_ROOT.to_string()),
            ),
            dial_timeout: Duration::from_secs(dial_timeout_secs),
        })
    }
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl LoggingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let format = match env::var("CRIBENCH_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value)
                .ok_or_else(|| ConfigError::InvalidValue("CRIBENCH_LOG_FORMAT".to_string()))?,
            Err(_) => LogFormat::Pretty,
        };

        Ok(Self {
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
            format,
        })
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
