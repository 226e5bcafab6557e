//! Log sinks for normalized records
//!
//! A sink receives each enriched record exactly once. Sinks are
//! fire-and-forget: delivery failures are handled and logged inside the
//! sink and never reach the router.

mod json;
mod tracing_sink;

pub use json::JsonLineSink;
pub use tracing_sink::TracingSink;

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::Fields;

/// Destination for normalized records
pub trait LogSink: Send + Sync {
    /// Emit one record
    fn emit(&self, fields: &Fields, message: &str);
}

/// Output formats selectable by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    /// One JSON object per line on stdout
    Json,
    /// Events on the process tracing subscriber
    Tracing,
}

impl SinkFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkFormat::Json => "json",
            SinkFormat::Tracing => "tracing",
        }
    }
}

impl FromStr for SinkFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(SinkFormat::Json),
            "tracing" => Ok(SinkFormat::Tracing),
            _ => Err(Error::config(format!(
                "Unknown sink format '{}' (expected: json or tracing)",
                s
            ))),
        }
    }
}

/// Build the sink for a configured format
pub fn create_sink(format: SinkFormat) -> Arc<dyn LogSink> {
    match format {
        SinkFormat::Json => Arc::new(JsonLineSink::new(std::io::stdout())),
        SinkFormat::Tracing => Arc::new(TracingSink),
    }
}
