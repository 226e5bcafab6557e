//! Event routing loop
//!
//! Consumes envelopes one at a time in arrival order. Each envelope is
//! gated by the selection set, normalized, annotated and handed to the
//! sink. The router keeps no state between envelopes apart from counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, trace, Instrument};

use super::annotator::AppMetadataAnnotator;
use super::normalizer::normalize;
use super::selector::SelectionSet;
use crate::cache::AppCache;
use crate::models::{Envelope, NormalizedRecord};
use crate::sink::LogSink;

/// Counters maintained by the router
#[derive(Debug, Default)]
pub struct RouterStats {
    received: AtomicU64,
    dropped: AtomicU64,
    emitted: AtomicU64,
    annotated: AtomicU64,
}

/// Point-in-time copy of the router counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouterStatsSnapshot {
    /// Envelopes read from the stream
    pub received: u64,
    /// Envelopes discarded by the selection gate
    pub dropped: u64,
    /// Records handed to the sink
    pub emitted: u64,
    /// Records that gained at least one metadata field
    pub annotated: u64,
}

impl RouterStats {
    pub fn snapshot(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
            annotated: self.annotated.load(Ordering::Relaxed),
        }
    }
}

/// Routes selected envelopes from the stream to the sink
pub struct EventRouter {
    selection: SelectionSet,
    annotator: AppMetadataAnnotator,
    sink: Arc<dyn LogSink>,
    stats: Arc<RouterStats>,
}

impl EventRouter {
    pub fn new(selection: SelectionSet, cache: Arc<dyn AppCache>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            selection,
            annotator: AppMetadataAnnotator::new(cache),
            sink,
            stats: Arc::new(RouterStats::default()),
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Shared handle to the router counters
    pub fn stats(&self) -> Arc<RouterStats> {
        Arc::clone(&self.stats)
    }

    /// Run until the envelope stream is closed
    pub async fn run(&self, mut envelopes: mpsc::Receiver<Envelope>) {
        info!(selected = ?self.selection.names(), "Event router started");

        while let Some(envelope) = envelopes.recv().await {
            self.route(&envelope).await;
        }

        let stats = self.stats.snapshot();
        info!(
            received = stats.received,
            dropped = stats.dropped,
            emitted = stats.emitted,
            "Envelope stream closed, event router stopped"
        );
    }

    /// Route one envelope; returns whether a record was emitted
    pub async fn route(&self, envelope: &Envelope) -> bool {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        match self.process(envelope).await {
            Some(record) => {
                self.sink.emit(record.fields(), record.message());
                self.stats.emitted.fetch_add(1, Ordering::Relaxed);
                true
            },
            None => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                false
            },
        }
    }

    /// Gate, normalize and annotate an envelope without emitting it
    pub async fn process(&self, envelope: &Envelope) -> Option<NormalizedRecord> {
        let kind = match envelope.kind() {
            Some(kind) if self.selection.contains(kind) => kind,
            other => {
                trace!(kind = ?other, origin = envelope.origin(), "Dropping unselected envelope");
                return None;
            },
        };

        let span = crate::envelope_span!(kind, envelope.origin());
        async {
            let mut record = normalize(envelope, kind);
            if self.annotator.annotate(&mut record).await > 0 {
                self.stats.annotated.fetch_add(1, Ordering::Relaxed);
            }
            Some(record)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AppMetadata;
    use crate::models::{EventKind, FieldValue, LogMessage};
    use crate::test_utils::{MockAppCache, RecordingSink};

    fn router(kinds: &[EventKind], cache: MockAppCache) -> (EventRouter, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let router = EventRouter::new(
            SelectionSet::from_kinds(kinds.iter().copied()),
            Arc::new(cache),
            sink.clone(),
        );
        (router, sink)
    }

    #[tokio::test]
    async fn test_unselected_kinds_are_dropped_in_order() {
        let (router, sink) = router(&[EventKind::ValueMetric, EventKind::Error], MockAppCache::new());

        let (tx, rx) = mpsc::channel(8);
        tx.send(Envelope::new(EventKind::ValueMetric, "a")).await.unwrap();
        tx.send(Envelope::new(EventKind::Heartbeat, "b")).await.unwrap();
        tx.send(Envelope::new(EventKind::Error, "c")).await.unwrap();
        drop(tx);

        router.run(rx).await;

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0["origin"], FieldValue::from("a"));
        assert_eq!(records[1].0["origin"], FieldValue::from("c"));

        let stats = router.stats().snapshot();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.emitted, 2);
    }

    #[tokio::test]
    async fn test_envelope_without_kind_is_dropped() {
        let (router, sink) = router(&EventKind::ALL, MockAppCache::new());

        assert!(!router.route(&Envelope::default()).await);
        assert!(sink.records().is_empty());
        assert_eq!(router.stats().snapshot().dropped, 1);
    }

    #[tokio::test]
    async fn test_selected_envelope_is_normalized_and_annotated() {
        let cache = MockAppCache::new().with_cached(
            "app-1",
            AppMetadata {
                name: "web".to_string(),
                ..Default::default()
            },
        );
        let (router, sink) = router(&[EventKind::LogMessage], cache);

        let mut envelope = Envelope::new(EventKind::LogMessage, "doppler");
        envelope.log_message = Some(LogMessage {
            message: b"started".to_vec(),
            app_id: "app-1".to_string(),
            ..Default::default()
        });

        assert!(router.route(&envelope).await);

        let records = sink.records();
        let (fields, message) = &records[0];
        assert_eq!(message, "started");
        assert_eq!(fields["cf_app_name"], FieldValue::from("web"));
        assert_eq!(fields["message_type"], FieldValue::from("OUT"));
        assert_eq!(router.stats().snapshot().annotated, 1);
    }

    #[tokio::test]
    async fn test_records_without_app_id_skip_the_cache() {
        let cache = Arc::new(MockAppCache::new());
        let sink = Arc::new(RecordingSink::new());
        let router = EventRouter::new(
            SelectionSet::from_kinds([EventKind::Heartbeat]),
            cache.clone(),
            sink.clone(),
        );

        router.route(&Envelope::new(EventKind::Heartbeat, "metron")).await;

        assert_eq!(sink.records().len(), 1);
        assert_eq!(cache.lookup_count(), 0);
        assert_eq!(router.stats().snapshot().annotated, 0);
    }

    #[tokio::test]
    async fn test_process_does_not_emit() {
        let (router, sink) = router(&[EventKind::CounterEvent], MockAppCache::new());

        let record = router
            .process(&Envelope::new(EventKind::CounterEvent, "metron"))
            .await
            .unwrap();
        assert_eq!(record.get("event_type"), Some(&FieldValue::from("CounterEvent")));
        assert!(sink.records().is_empty());
        assert!(router
            .process(&Envelope::new(EventKind::ValueMetric, "metron"))
            .await
            .is_none());
    }
}
