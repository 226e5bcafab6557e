//! Envelope normalization
//!
//! One pure mapping per event kind, each extracting a fixed field set from
//! the envelope payload. The field names are consumed by downstream log
//! pipelines and must not change.

use crate::models::envelope::uuid_text;
use crate::models::{Envelope, EventKind, NormalizedRecord};

/// Normalize an envelope already known to be of `kind`
pub fn normalize(envelope: &Envelope, kind: EventKind) -> NormalizedRecord {
    match kind {
        EventKind::Heartbeat => heartbeat(envelope),
        EventKind::HttpStart => http_start(envelope),
        EventKind::HttpStop => http_stop(envelope),
        EventKind::HttpStartStop => http_start_stop(envelope),
        EventKind::LogMessage => log_message(envelope),
        EventKind::ValueMetric => value_metric(envelope),
        EventKind::CounterEvent => counter_event(envelope),
        EventKind::Error => error_event(envelope),
        EventKind::ContainerMetric => container_metric(envelope),
    }
}

pub fn heartbeat(envelope: &Envelope) -> NormalizedRecord {
    let heartbeat = envelope.heartbeat();

    NormalizedRecord::new(EventKind::Heartbeat, envelope.origin())
        .with(
            "ctl_msg_id",
            uuid_text(heartbeat.control_message_identifier.as_ref()),
        )
        .with("error_count", heartbeat.error_count)
        .with("received_count", heartbeat.received_count)
        .with("sent_count", heartbeat.sent_count)
}

pub fn http_start(envelope: &Envelope) -> NormalizedRecord {
    let start = envelope.http_start();

    NormalizedRecord::new(EventKind::HttpStart, envelope.origin())
        .with("cf_app_id", uuid_text(start.application_id.as_ref()))
        .with("instance_id", start.instance_id.as_str())
        .with("instance_index", start.instance_index)
        .with("method", start.method.as_str())
        .with("parent_request_id", uuid_text(start.parent_request_id.as_ref()))
        .with("peer_type", start.peer_type.as_str())
        .with("request_id", uuid_text(start.request_id.as_ref()))
        .with("remote_addr", start.remote_address.as_str())
        .with("timestamp", start.timestamp)
        .with("uri", start.uri.as_str())
        .with("user_agent", start.user_agent.as_str())
}

pub fn http_stop(envelope: &Envelope) -> NormalizedRecord {
    let stop = envelope.http_stop();

    NormalizedRecord::new(EventKind::HttpStop, envelope.origin())
        .with("cf_app_id", uuid_text(stop.application_id.as_ref()))
        .with("content_length", stop.content_length)
        .with("peer_type", stop.peer_type.as_str())
        .with("request_id", uuid_text(stop.request_id.as_ref()))
        .with("status_code", stop.status_code)
        .with("timestamp", stop.timestamp)
        .with("uri", stop.uri.as_str())
}

pub fn http_start_stop(envelope: &Envelope) -> NormalizedRecord {
    let http = envelope.http_start_stop();

    NormalizedRecord::new(EventKind::HttpStartStop, envelope.origin())
        .with("cf_app_id", uuid_text(http.application_id.as_ref()))
        .with("content_length", http.content_length)
        .with("instance_id", http.instance_id.as_str())
        .with("instance_index", http.instance_index)
        .with("method", http.method.as_str())
        .with("parent_request_id", uuid_text(http.parent_request_id.as_ref()))
        .with("peer_type", http.peer_type.as_str())
        .with("remote_addr", http.remote_address.as_str())
        .with("request_id", uuid_text(http.request_id.as_ref()))
        .with("start_timestamp", http.start_timestamp)
        .with("status_code", http.status_code)
        .with("stop_timestamp", http.stop_timestamp)
        .with("uri", http.uri.as_str())
        .with("user_agent", http.user_agent.as_str())
}

pub fn log_message(envelope: &Envelope) -> NormalizedRecord {
    let log = envelope.log_message();

    NormalizedRecord::new(EventKind::LogMessage, envelope.origin())
        .with("cf_app_id", log.app_id.as_str())
        .with("timestamp", log.timestamp)
        .with("source_type", log.source_type.as_str())
        .with("message_type", log.message_type.as_str())
        .with("source_instance", log.source_instance.as_str())
        .with_message(log.text())
}

pub fn value_metric(envelope: &Envelope) -> NormalizedRecord {
    let metric = envelope.value_metric();

    NormalizedRecord::new(EventKind::ValueMetric, envelope.origin())
        .with("name", metric.name.as_str())
        .with("unit", metric.unit.as_str())
        .with("value", metric.value)
}

pub fn counter_event(envelope: &Envelope) -> NormalizedRecord {
    let counter = envelope.counter_event();

    NormalizedRecord::new(EventKind::CounterEvent, envelope.origin())
        .with("name", counter.name.as_str())
        .with("delta", counter.delta)
        .with("total", counter.total)
}

pub fn error_event(envelope: &Envelope) -> NormalizedRecord {
    let error = envelope.error();

    // Downstream consumers read the error source under "delta"
    NormalizedRecord::new(EventKind::Error, envelope.origin())
        .with("code", error.code)
        .with("delta", error.source.as_str())
        .with_message(error.message.as_str())
}

pub fn container_metric(envelope: &Envelope) -> NormalizedRecord {
    let metric = envelope.container_metric();

    NormalizedRecord::new(EventKind::ContainerMetric, envelope.origin())
        .with("cf_app_id", metric.application_id.as_str())
        .with("cpu_percentage", metric.cpu_percentage)
        .with("disk_bytes", metric.disk_bytes)
        .with("instance_index", metric.instance_index)
        .with("memory_bytes", metric.memory_bytes)
}
