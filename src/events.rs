use chrono::{Local, Utc};
use serde::Serialize;
use serde_json::Value;

pub const CONNECTED_MESSAGE: &str = "Connected";

/// Payload of one `data:` frame on the event stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// First event on every stream.
    Connection { message: String },
    /// Periodic tick: local wall-clock time plus epoch milliseconds.
    Time { message: String, timestamp: i64 },
    /// Caller-supplied message fanned out to every open stream.
    Broadcast { message: Value, timestamp: i64 },
}

impl StreamEvent {
    pub fn connected() -> Self {
        StreamEvent::Connection {
            message: CONNECTED_MESSAGE.to_string(),
        }
    }

    pub fn tick() -> Self {
        StreamEvent::Time {
            message: Local::now().format("%-I:%M:%S %p").to_string(),
            timestamp: epoch_millis(),
        }
    }

    pub fn broadcast(message: Value) -> Self {
        StreamEvent::Broadcast {
            message,
            timestamp: epoch_millis(),
        }
    }

    /// Serialized JSON for a single frame. Never contains a raw newline.
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}
