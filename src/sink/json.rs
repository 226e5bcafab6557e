//! JSON-lines log sink

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::Mutex;

use super::LogSink;
use crate::models::Fields;

const LEVEL_KEY: &str = "level";
const MESSAGE_KEY: &str = "msg";
const TIME_KEY: &str = "time";

/// Writes each record as one JSON object per line
pub struct JsonLineSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn render(fields: &Fields, message: &str) -> Map<String, Value> {
        let mut line = Map::with_capacity(fields.len() + 3);

        for (key, value) in fields {
            // Reserved keys move aside instead of clobbering the envelope
            let key = match key.as_str() {
                LEVEL_KEY | MESSAGE_KEY | TIME_KEY => format!("fields.{}", key),
                _ => key.clone(),
            };
            let value = serde_json::to_value(value).unwrap_or(Value::Null);
            line.insert(key, value);
        }

        line.insert(LEVEL_KEY.to_string(), Value::from("info"));
        line.insert(MESSAGE_KEY.to_string(), Value::from(message));
        line.insert(
            TIME_KEY.to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        line
    }
}

impl<W: Write + Send> LogSink for JsonLineSink<W> {
    fn emit(&self, fields: &Fields, message: &str) {
        let line = Self::render(fields, message);

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = write_line(&mut *writer, &line) {
            tracing::error!(error = %e, "Failed to write record to sink");
        }
    }
}

fn write_line<W: Write>(writer: &mut W, line: &Map<String, Value>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, line)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
