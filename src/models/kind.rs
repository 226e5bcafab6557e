//! Event kind registry
//!
//! The closed set of envelope kinds the router recognizes. The enumeration
//! order is the platform's wire order and is used wherever kinds are listed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kinds of monitoring envelopes emitted by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// Component liveness counters
    Heartbeat,
    /// Start of an HTTP request
    HttpStart,
    /// End of an HTTP request
    HttpStop,
    /// Complete HTTP request/response pair
    HttpStartStop,
    /// Application or platform log line
    LogMessage,
    /// Point-in-time metric value
    ValueMetric,
    /// Monotonic counter increment
    CounterEvent,
    /// Platform component error
    Error,
    /// Per-instance container resource usage
    ContainerMetric,
}

/// The default kind used when no configured kind validates
pub const DEFAULT_EVENT_KIND: EventKind = EventKind::LogMessage;

/// Raised when a name does not belong to the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl EventKind {
    /// Every recognized kind, in registry order
    pub const ALL: [EventKind; 9] = [
        EventKind::Heartbeat,
        EventKind::HttpStart,
        EventKind::HttpStop,
        EventKind::HttpStartStop,
        EventKind::LogMessage,
        EventKind::ValueMetric,
        EventKind::CounterEvent,
        EventKind::Error,
        EventKind::ContainerMetric,
    ];

    /// Canonical name, as it appears in configuration and in `event_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Heartbeat => "Heartbeat",
            EventKind::HttpStart => "HttpStart",
            EventKind::HttpStop => "HttpStop",
            EventKind::HttpStartStop => "HttpStartStop",
            EventKind::LogMessage => "LogMessage",
            EventKind::ValueMetric => "ValueMetric",
            EventKind::CounterEvent => "CounterEvent",
            EventKind::Error => "Error",
            EventKind::ContainerMetric => "ContainerMetric",
        }
    }

    /// Look up a kind by its exact, case-sensitive name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_registry() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn test_from_name_is_exact() {
        assert_eq!(EventKind::from_name("LogMessage"), Some(EventKind::LogMessage));
        assert_eq!(EventKind::from_name("logmessage"), None);
        assert_eq!(EventKind::from_name(" LogMessage"), None);
        assert_eq!(EventKind::from_name(""), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "Bogus".parse::<EventKind>().unwrap_err();
        assert_eq!(err, UnknownEventKind("Bogus".to_string()));
        assert!(err.to_string().contains("Bogus"));
    }

    #[test]
    fn test_registry_order() {
        assert_eq!(EventKind::ALL[0], EventKind::Heartbeat);
        assert_eq!(EventKind::ALL[4], EventKind::LogMessage);
        assert_eq!(EventKind::ALL[8], EventKind::ContainerMetric);
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&EventKind::HttpStartStop).unwrap();
        assert_eq!(json, "\"HttpStartStop\"");

        let kind: EventKind = serde_json::from_str("\"ContainerMetric\"").unwrap();
        assert_eq!(kind, EventKind::ContainerMetric);
    }
}
