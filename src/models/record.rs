//! Normalized record model
//!
//! The flat, sink-ready representation of one envelope: a map of scalar
//! fields plus a free-text message.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::kind::EventKind;

/// Field key every record carries: the kind name
pub const EVENT_TYPE: &str = "event_type";
/// Field key every record carries: the emitting component
pub const ORIGIN: &str = "origin";
/// Field key holding the owning application's identifier
pub const CF_APP_ID: &str = "cf_app_id";

/// Record fields, keyed by field name
pub type Fields = BTreeMap<String, FieldValue>;

/// A scalar field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
}

impl FieldValue {
    /// The string content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(v) => f.write_str(v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Unsigned(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

/// One envelope, normalized for the log sink
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    fields: Fields,
    message: String,
}

impl NormalizedRecord {
    /// Start a record with the two fields every kind carries
    pub fn new(kind: EventKind, origin: &str) -> Self {
        Self::default()
            .with(EVENT_TYPE, kind.as_str())
            .with(ORIGIN, origin)
    }

    /// Build a record from raw parts
    pub fn from_parts(fields: Fields, message: impl Into<String>) -> Self {
        Self {
            fields,
            message: message.into(),
        }
    }

    /// Set a field
    pub fn with(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Set the free-text message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a string field unless the value is empty or the key is taken.
    ///
    /// Returns whether the field was added.
    pub fn insert_absent(&mut self, key: &str, value: &str) -> bool {
        if value.is_empty() || self.fields.contains_key(key) {
            return false;
        }
        self.fields
            .insert(key.to_string(), FieldValue::String(value.to_string()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The owning application id, when present and non-empty
    pub fn app_id(&self) -> Option<&str> {
        self.get(CF_APP_ID)
            .and_then(FieldValue::as_str)
            .filter(|id| !id.is_empty())
    }
}
