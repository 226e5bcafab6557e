//! Test utilities for the firehose router
//!
//! This module provides mock implementations and utilities for testing.
//! It is compiled for unit tests and behind the `test-utils` feature, which
//! the integration tests enable through a dev-dependency on this crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::cache::{AppCache, AppMetadata};
use crate::models::{
    ContainerMetric, CounterEvent, Envelope, ErrorPayload, EventKind, Fields, Heartbeat,
    HttpStart, HttpStartStop, HttpStop, LogMessage, MessageType, ValueMetric,
};
use crate::sink::LogSink;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock implementation of AppCache for testing
///
/// Apps registered with [`MockAppCache::with_directory`] are invisible to
/// lookups until a refresh for their id has run.
#[derive(Debug, Default)]
pub struct MockAppCache {
    cached: Mutex<HashMap<String, AppMetadata>>,
    directory: Mutex<HashMap<String, AppMetadata>>,
    refreshed: Mutex<Vec<String>>,
    lookups: AtomicUsize,
}

impl MockAppCache {
    /// Create an empty mock cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an app that lookups resolve immediately
    pub fn with_cached(self, app_id: &str, metadata: AppMetadata) -> Self {
        guard(&self.cached).insert(app_id.to_string(), metadata);
        self
    }

    /// Seed an app that only becomes visible after a refresh
    pub fn with_directory(self, app_id: &str, metadata: AppMetadata) -> Self {
        guard(&self.directory).insert(app_id.to_string(), metadata);
        self
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// App ids refreshed so far, in call order
    pub fn refreshed(&self) -> Vec<String> {
        guard(&self.refreshed).clone()
    }
}

#[async_trait]
impl AppCache for MockAppCache {
    async fn lookup(&self, app_id: &str) -> AppMetadata {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        guard(&self.cached).get(app_id).cloned().unwrap_or_default()
    }

    async fn refresh(&self, app_id: &str) {
        guard(&self.refreshed).push(app_id.to_string());
        if let Some(metadata) = guard(&self.directory).remove(app_id) {
            guard(&self.cached).insert(app_id.to_string(), metadata);
        }
    }
}

/// Log sink that keeps every emitted record in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<(Fields, String)>>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All records emitted so far, in emission order
    pub fn records(&self) -> Vec<(Fields, String)> {
        guard(&self.records).clone()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        guard(&self.records).clear();
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, fields: &Fields, message: &str) {
        guard(&self.records).push((fields.clone(), message.to_string()));
    }
}

/// Create a LogMessage envelope for an app
pub fn create_log_envelope(app_id: &str, text: &str) -> Envelope {
    let mut envelope = Envelope::new(EventKind::LogMessage, "doppler");
    envelope.log_message = Some(LogMessage {
        message: text.as_bytes().to_vec(),
        message_type: MessageType::Stdout,
        timestamp: 1_700_000_000_000_000_000,
        app_id: app_id.to_string(),
        source_type: "APP".to_string(),
        source_instance: "0".to_string(),
    });
    envelope
}

/// Create an envelope of the given kind with a populated payload
pub fn create_test_envelope(kind: EventKind) -> Envelope {
    let mut envelope = Envelope::new(kind, "test-origin");
    match kind {
        EventKind::Heartbeat => {
            envelope.heartbeat = Some(Heartbeat {
                sent_count: 10,
                received_count: 9,
                error_count: 1,
                ..Default::default()
            })
        },
        EventKind::HttpStart => {
            envelope.http_start = Some(HttpStart {
                timestamp: 1,
                request_id: Some(Uuid::new_v4()),
                uri: "/start".to_string(),
                ..Default::default()
            })
        },
        EventKind::HttpStop => {
            envelope.http_stop = Some(HttpStop {
                timestamp: 2,
                uri: "/stop".to_string(),
                status_code: 204,
                ..Default::default()
            })
        },
        EventKind::HttpStartStop => {
            envelope.http_start_stop = Some(HttpStartStop {
                start_timestamp: 1,
                stop_timestamp: 2,
                uri: "/v2/apps".to_string(),
                status_code: 200,
                ..Default::default()
            })
        },
        EventKind::LogMessage => return create_log_envelope("test-app", "hello"),
        EventKind::ValueMetric => {
            envelope.value_metric = Some(ValueMetric {
                name: "cpu".to_string(),
                value: 0.5,
                unit: "percent".to_string(),
            })
        },
        EventKind::CounterEvent => {
            envelope.counter_event = Some(CounterEvent {
                name: "requests".to_string(),
                delta: 1,
                total: 42,
            })
        },
        EventKind::Error => {
            envelope.error = Some(ErrorPayload {
                source: "router".to_string(),
                code: 500,
                message: "upstream failed".to_string(),
            })
        },
        EventKind::ContainerMetric => {
            envelope.container_metric = Some(ContainerMetric {
                application_id: "test-app".to_string(),
                instance_index: 0,
                cpu_percentage: 12.5,
                memory_bytes: 1024,
                disk_bytes: 2048,
            })
        },
    }
    envelope
}

/// One envelope of every known kind, in registry order
pub fn create_test_envelopes() -> Vec<Envelope> {
    EventKind::ALL.iter().copied().map(create_test_envelope).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_cache_refresh_promotes_directory_entry() {
        let app = AppMetadata {
            name: "web".to_string(),
            ..Default::default()
        };
        let cache = MockAppCache::new().with_directory("app-1", app.clone());

        assert!(!cache.lookup("app-1").await.is_known());
        cache.refresh("app-1").await;
        assert_eq!(cache.lookup("app-1").await, app);
        assert_eq!(cache.lookup_count(), 2);
        assert_eq!(cache.refreshed(), vec!["app-1".to_string()]);
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.emit(&Fields::new(), "one");
        sink.emit(&Fields::new(), "two");

        let messages: Vec<String> = sink.records().into_iter().map(|(_, m)| m).collect();
        assert_eq!(messages, vec!["one", "two"]);

        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_create_test_envelopes() {
        let envelopes = create_test_envelopes();
        assert_eq!(envelopes.len(), EventKind::ALL.len());
        for (envelope, kind) in envelopes.iter().zip(EventKind::ALL) {
            assert_eq!(envelope.kind(), Some(kind));
        }
    }
}
