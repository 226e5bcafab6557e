//! Data models for the firehose router
//!
//! This module contains the event kind registry, the envelope shapes
//! delivered by the transport, and the normalized record handed to sinks.

pub mod envelope;
pub mod kind;
pub mod record;

// Re-export commonly used types
pub use envelope::{
    ContainerMetric, CounterEvent, Envelope, ErrorPayload, Heartbeat, HttpStart, HttpStartStop,
    HttpStop, LogMessage, MessageType, Method, PeerType, ValueMetric,
};
pub use kind::{EventKind, UnknownEventKind, DEFAULT_EVENT_KIND};
pub use record::{FieldValue, Fields, NormalizedRecord};
