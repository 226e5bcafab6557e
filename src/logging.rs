//! Logging module for the firehose router
//!
//! This module configures structured logging using the tracing crate,
//! providing JSON output for production and pretty formatting for development.
//!
//! Process diagnostics go through tracing. Routed records go to the
//! configured log sink, which may or may not be tracing itself.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::ServerConfig;
use crate::error::Result;

/// Initialize the logging system
///
/// Configures tracing based on the server environment:
/// - Production: JSON formatted logs
/// - Development: Pretty formatted logs with colors
///
/// Diagnostics are written to stderr so they never interleave with
/// records written to stdout by the JSON sink.
pub fn init_tracing(config: &ServerConfig) -> Result<()> {
    let log_level = config.log_level.as_str();

    // Create environment filter from RUST_LOG or use provided log level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("firehose_router={},tower_http=debug", log_level))
    });

    if config.is_production() {
        let formatting_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true);

        Registry::default()
            .with(env_filter)
            .with(formatting_layer)
            .try_init()
            .map_err(|e| {
                crate::error::Error::internal(format!("Failed to initialize tracing: {}", e))
            })?;
    } else {
        let formatting_layer = fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);

        Registry::default()
            .with(env_filter)
            .with(formatting_layer)
            .try_init()
            .map_err(|e| {
                crate::error::Error::internal(format!("Failed to initialize tracing: {}", e))
            })?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = log_level,
        "Logging initialized"
    );

    Ok(())
}

/// Create a span for routing one envelope
#[macro_export]
macro_rules! envelope_span {
    ($kind:expr, $origin:expr) => {
        tracing::debug_span!(
            "envelope",
            event_type = %$kind,
            origin = %$origin,
        )
    };
}

/// Helper for timing operations
pub struct Timer {
    start: std::time::Instant,
    operation: String,
}

impl Timer {
    /// Start a new timer
    pub fn start(operation: impl Into<String>) -> Self {
        Timer {
            start: std::time::Instant::now(),
            operation: operation.into(),
        }
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
        duration
    }
}
