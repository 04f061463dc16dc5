use thiserror::Error;

/// A write to a single connection that could not be queued.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection {0} is no longer open")]
    Closed(String),
    #[error("connection {0} stream has gone away")]
    QueueDropped(String),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Message must not be empty")]
    EmptyMessage,
    #[error("failed to encode broadcast: {0}")]
    Encode(String),
}
