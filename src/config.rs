//! Configuration module for the firehose router
//!
//! This module handles loading and validating configuration from environment
//! variables, providing strongly-typed configuration structures for all
//! application components.

use envconfig::Envconfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::RetryPolicy;
use crate::error::{Error, Result};
use crate::sink::SinkFormat;

/// Main configuration structure for the firehose router
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct Config {
    /// Server configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub server: ServerConfig,

    /// Routing configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub routing: RoutingConfig,

    /// App directory configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub directory: AppDirectoryConfig,

    /// Sink configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub sink: SinkConfig,

    /// Feature flags
    #[serde(flatten)]
    #[envconfig(nested)]
    pub features: FeatureFlags,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct ServerConfig {
    /// Host to bind to
    #[envconfig(from = "HOST", default = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    /// Log level
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// Environment (development, staging, production)
    #[envconfig(from = "ENVIRONMENT", default = "development")]
    pub environment: String,

    /// Request timeout in seconds
    #[envconfig(from = "REQUEST_TIMEOUT_SECS", default = "30")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Routing configuration
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct RoutingConfig {
    /// Event kinds to forward (comma-separated)
    #[envconfig(from = "EVENTS", default = "LogMessage")]
    pub events: String,

    /// Capacity of the channel between the envelope source and the router
    #[envconfig(from = "ENVELOPE_BUFFER_SIZE", default = "1024")]
    pub envelope_buffer_size: usize,
}

/// App directory configuration
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct AppDirectoryConfig {
    /// JSON file mapping app ids to metadata; empty disables the directory
    #[envconfig(from = "APP_DIRECTORY_FILE", default = "")]
    pub file: String,

    /// Initial retry delay in milliseconds
    #[envconfig(from = "APP_DIRECTORY_RETRY_BASE_MS", default = "100")]
    pub retry_base_ms: u64,

    /// Maximum retry delay in milliseconds
    #[envconfig(from = "APP_DIRECTORY_RETRY_MAX_MS", default = "2000")]
    pub retry_max_ms: u64,

    /// Total retry budget per refresh in milliseconds
    #[envconfig(from = "APP_DIRECTORY_MAX_ELAPSED_MS", default = "10000")]
    pub max_elapsed_ms: u64,
}

impl AppDirectoryConfig {
    /// Directory file path, if one is configured
    pub fn file_path(&self) -> Option<&str> {
        let path = self.file.trim();
        (!path.is_empty()).then_some(path)
    }

    /// Backoff settings for directory fetches
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(self.retry_base_ms),
            max_interval: Duration::from_millis(self.retry_max_ms),
            max_elapsed: Duration::from_millis(self.max_elapsed_ms),
        }
    }
}

/// Sink configuration
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct SinkConfig {
    /// Record output format (json, tracing)
    #[envconfig(from = "SINK_FORMAT", default = "json")]
    pub format: String,
}

impl SinkConfig {
    pub fn format(&self) -> Result<SinkFormat> {
        self.format.parse()
    }
}

/// Feature flags
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct FeatureFlags {
    /// Serve the operational HTTP API
    #[envconfig(from = "ENABLE_HEALTH_API", default = "true")]
    pub health_api: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenv::dotenv().ok();

        Config::init_from_env().map_err(Error::from)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.features.health_api && self.server.port == 0 {
            return Err(Error::config("Server port cannot be 0"));
        }

        if self.routing.envelope_buffer_size == 0 {
            return Err(Error::config("Envelope buffer size must be at least 1"));
        }

        if self.directory.retry_max_ms < self.directory.retry_base_ms {
            return Err(Error::config(
                "App directory max retry delay cannot be below the base delay",
            ));
        }

        self.sink.format()?;

        Ok(())
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!(
            server_address = %self.server.address(),
            environment = %self.server.environment,
            log_level = %self.server.log_level,
            health_api = %self.features.health_api,
            "Server configuration"
        );

        tracing::info!(
            events = %self.routing.events,
            envelope_buffer_size = %self.routing.envelope_buffer_size,
            "Routing configuration"
        );

        tracing::info!(
            file = %self.directory.file_path().unwrap_or("<none>"),
            retry_base_ms = %self.directory.retry_base_ms,
            max_elapsed_ms = %self.directory.max_elapsed_ms,
            "App directory configuration"
        );

        tracing::info!(format = %self.sink.format, "Sink configuration");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                log_level: "info".to_string(),
                environment: "test".to_string(),
                request_timeout_secs: 30,
            },
            routing: RoutingConfig {
                events: "LogMessage,HttpStartStop".to_string(),
                envelope_buffer_size: 16,
            },
            directory: AppDirectoryConfig {
                file: String::new(),
                retry_base_ms: 100,
                retry_max_ms: 2000,
                max_elapsed_ms: 10000,
            },
            sink: SinkConfig {
                format: "json".to_string(),
            },
            features: FeatureFlags { health_api: true },
        }
    }

    #[test]
    fn test_server_config() {
        let config = test_config();
        assert_eq!(config.server.address(), "127.0.0.1:8080");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert!(!config.server.is_production());
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = test_config();
        config.routing.envelope_buffer_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = test_config();
        config.sink.format = "syslog".to_string();
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.server.port = 0;
        assert!(config.validate().is_err());
        config.features.health_api = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_directory_settings() {
        let mut config = test_config();
        assert_eq!(config.directory.file_path(), None);

        config.directory.file = " /etc/apps.json ".to_string();
        assert_eq!(config.directory.file_path(), Some("/etc/apps.json"));

        let policy = config.directory.retry_policy();
        assert_eq!(policy.initial_interval, Duration::from_millis(100));
        assert_eq!(policy.max_interval, Duration::from_secs(2));
        assert_eq!(policy.max_elapsed, Duration::from_secs(10));
    }
}
