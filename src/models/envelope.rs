//! Envelope data models
//!
//! An envelope is one decoded unit of platform telemetry: an origin, a kind
//! tag and at most one kind-specific payload. Every payload field is
//! optional on the wire and decodes to its zero value when absent, so the
//! normalizer never has to deal with missing data.

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use uuid::Uuid;

use super::kind::EventKind;

/// Monitoring envelope as delivered by the transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Envelope {
    /// Component that emitted the envelope
    pub origin: String,

    /// Kind tag selecting the payload shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventKind>,

    /// Emission time in nanoseconds since the epoch
    pub timestamp: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<Heartbeat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_start: Option<HttpStart>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_stop: Option<HttpStop>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_start_stop: Option<HttpStartStop>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_message: Option<LogMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_metric: Option<ValueMetric>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_event: Option<CounterEvent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_metric: Option<ContainerMetric>,
}

impl Envelope {
    /// Create an envelope with a kind tag and no payload
    pub fn new(kind: EventKind, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            event_type: Some(kind),
            ..Default::default()
        }
    }

    /// Kind tag, if the transport supplied one
    pub fn kind(&self) -> Option<EventKind> {
        self.event_type
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn heartbeat(&self) -> Cow<'_, Heartbeat> {
        payload_or_default(&self.heartbeat)
    }

    pub fn http_start(&self) -> Cow<'_, HttpStart> {
        payload_or_default(&self.http_start)
    }

    pub fn http_stop(&self) -> Cow<'_, HttpStop> {
        payload_or_default(&self.http_stop)
    }

    pub fn http_start_stop(&self) -> Cow<'_, HttpStartStop> {
        payload_or_default(&self.http_start_stop)
    }

    pub fn log_message(&self) -> Cow<'_, LogMessage> {
        payload_or_default(&self.log_message)
    }

    pub fn value_metric(&self) -> Cow<'_, ValueMetric> {
        payload_or_default(&self.value_metric)
    }

    pub fn counter_event(&self) -> Cow<'_, CounterEvent> {
        payload_or_default(&self.counter_event)
    }

    pub fn error(&self) -> Cow<'_, ErrorPayload> {
        payload_or_default(&self.error)
    }

    pub fn container_metric(&self) -> Cow<'_, ContainerMetric> {
        payload_or_default(&self.container_metric)
    }
}

/// Absent payloads read as an all-zero payload
fn payload_or_default<T: Clone + Default>(payload: &Option<T>) -> Cow<'_, T> {
    match payload {
        Some(payload) => Cow::Borrowed(payload),
        None => Cow::Owned(T::default()),
    }
}

/// Render an optional UUID as hyphenated text, empty when absent
pub fn uuid_text(id: Option<&Uuid>) -> String {
    id.map(|id| id.hyphenated().to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Heartbeat {
    pub sent_count: u64,
    pub received_count: u64,
    pub error_count: u64,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub control_message_identifier: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpStart {
    pub timestamp: i64,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub request_id: Option<Uuid>,
    pub peer_type: PeerType,
    pub method: Method,
    pub uri: String,
    pub remote_address: String,
    pub user_agent: String,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub parent_request_id: Option<Uuid>,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub application_id: Option<Uuid>,
    pub instance_index: i32,
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpStop {
    pub timestamp: i64,
    pub uri: String,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub request_id: Option<Uuid>,
    pub peer_type: PeerType,
    pub status_code: i32,
    pub content_length: i64,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub application_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpStartStop {
    pub start_timestamp: i64,
    pub stop_timestamp: i64,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub request_id: Option<Uuid>,
    pub peer_type: PeerType,
    pub method: Method,
    pub uri: String,
    pub remote_address: String,
    pub user_agent: String,
    pub status_code: i32,
    pub content_length: i64,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub parent_request_id: Option<Uuid>,
    #[serde(deserialize_with = "optional_uuid::deserialize")]
    pub application_id: Option<Uuid>,
    pub instance_index: i32,
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogMessage {
    /// Raw log line; carried as text on the wire
    #[serde(with = "text_bytes")]
    pub message: Vec<u8>,
    pub message_type: MessageType,
    pub timestamp: i64,
    pub app_id: String,
    pub source_type: String,
    pub source_instance: String,
}

impl LogMessage {
    /// Message bytes decoded as text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueMetric {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterEvent {
    pub name: String,
    pub delta: u64,
    pub total: u64,
}

/// Payload of an `Error` envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorPayload {
    pub source: String,
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerMetric {
    pub application_id: String,
    pub instance_index: i32,
    pub cpu_percentage: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
}

/// Stream a log line was written to
///
/// Decodes from its name or from its protocol index (OUT = 1, ERR = 2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MessageType {
    #[default]
    #[serde(rename = "OUT")]
    Stdout,
    #[serde(rename = "ERR")]
    Stderr,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Stdout => "OUT",
            MessageType::Stderr => "ERR",
        }
    }

    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            1 => Some(MessageType::Stdout),
            2 => Some(MessageType::Stderr),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OUT" => Some(MessageType::Stdout),
            "ERR" => Some(MessageType::Stderr),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode_wire_enum(
            deserializer,
            MessageType::from_index,
            MessageType::from_name,
            "OUT, ERR, 1 or 2",
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of the HTTP exchange that reported the event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PeerType {
    #[default]
    Client,
    Server,
}

impl PeerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerType::Client => "Client",
            PeerType::Server => "Server",
        }
    }

    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            1 => Some(PeerType::Client),
            2 => Some(PeerType::Server),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [PeerType::Client, PeerType::Server]
            .into_iter()
            .find(|peer| peer.as_str() == name)
    }
}

impl<'de> Deserialize<'de> for PeerType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode_wire_enum(
            deserializer,
            PeerType::from_index,
            PeerType::from_name,
            "Client, Server, 1 or 2",
        )
    }
}

impl fmt::Display for PeerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    const ALL: [Method; 5] = [Method::Get, Method::Post, Method::Put, Method::Delete, Method::Head];

    /// Protocol indexes start at 1 for GET
    pub fn from_index(index: u64) -> Option<Self> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        Self::ALL.get(slot).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        decode_wire_enum(
            deserializer,
            Method::from_index,
            Method::from_name,
            "an HTTP method name or index 1-5",
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode an enum carried either as its protocol index or as its name
fn decode_wire_enum<'de, D, T>(
    deserializer: D,
    from_index: fn(u64) -> Option<T>,
    from_name: fn(&str) -> Option<T>,
    expected: &'static str,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Index(u64),
        Name(String),
    }

    match Wire::deserialize(deserializer)? {
        Wire::Index(index) => from_index(index)
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Unsigned(index), &expected)),
        Wire::Name(name) => from_name(&name)
            .ok_or_else(|| de::Error::invalid_value(Unexpected::Str(&name), &expected)),
    }
}

/// Empty or null UUID text decodes as absent
mod optional_uuid {
    use serde::de::{self, Deserialize, Deserializer};
    use uuid::Uuid;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.is_empty() => Uuid::parse_str(&text).map(Some).map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}

mod text_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}
