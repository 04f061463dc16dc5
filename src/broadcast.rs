use crate::error::BroadcastError;
use crate::events::StreamEvent;
use crate::registry::{ConnectionRegistry, FanOut};
use log::{error, info};
use serde_json::Value;
use std::sync::Arc;

/// Fans a caller-supplied message out to every registered connection.
///
/// Never removes members: a failed write is skipped and the owning session
/// deregisters its connection when the transport closes.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Broadcaster { registry }
    }

    /// Returns the number of connections targeted.
    pub fn broadcast(&self, message: Value) -> Result<usize, BroadcastError> {
        if is_empty_message(&message) {
            return Err(BroadcastError::EmptyMessage);
        }

        let frame = StreamEvent::broadcast(message).to_frame().map_err(|e| {
            error!("Failed to serialize broadcast event: {e}");
            BroadcastError::Encode(e.to_string())
        })?;

        let FanOut { targeted, failed } = self
            .registry
            .for_each(|connection| connection.send_frame(frame.clone()));
        info!("Broadcast sent to {} clients ({} skipped)", targeted - failed, failed);
        Ok(targeted)
    }
}

/// Absent, null, empty string, false and zero all count as no message.
pub fn is_empty_message(message: &Value) -> bool {
    match message {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
