//! Sink that forwards records to the tracing subscriber

use super::LogSink;
use crate::models::Fields;

/// Emits each record as an INFO event on the `firehose_router::events` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, fields: &Fields, message: &str) {
        let fields = serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string());
        tracing::info!(target: "firehose_router::events", fields = %fields, "{}", message);
    }
}
