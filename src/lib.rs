//! Firehose router library
//!
//! Selects telemetry envelopes by kind, flattens them into key/value records,
//! enriches application-scoped records with app/space/org metadata and hands
//! them to a log sink. Exposed as a library for the binary and for
//! integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routing;
pub mod sink;
pub mod source;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{Error, Result};

// Re-export model types
pub use models::{Envelope, EventKind, FieldValue, Fields, NormalizedRecord};

// Re-export the routing pipeline
pub use routing::{normalize, AppMetadataAnnotator, EventRouter, EventSelector, SelectionSet};

// Re-export collaborator contracts
pub use cache::{AppCache, AppDirectory, AppMetadata, InMemoryAppCache};
pub use sink::{create_sink, LogSink, SinkFormat};

// Re-export API server functions
pub use api::server::{create_router, create_server, shutdown_signal};

// Re-export health check types
pub use api::{
    ApiState, BuildInfo, ComponentHealth, HealthResponse, HealthState, HealthStatus,
    ReadyResponse,
};
