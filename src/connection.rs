use crate::error::SendError;
use crate::events::StreamEvent;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Server-generated identity of one stream connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionStatus {
    Open = 0,
    /// No new writes accepted; already queued frames still drain.
    Closing = 1,
    Closed = 2,
}

impl ConnectionStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionStatus::Open,
            1 => ConnectionStatus::Closing,
            _ => ConnectionStatus::Closed,
        }
    }
}

/// Write side of one event stream.
///
/// Every write goes through a single queue whose only consumer is the HTTP
/// response stream, so concurrent producers (the ticker and broadcasts) can
/// never interleave inside a frame.
pub struct Connection {
    id: ConnectionId,
    status: AtomicU8,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    cancel: CancellationToken,
}

impl Connection {
    /// Creates an open connection and the receiving end of its frame queue.
    pub fn open() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Connection {
            id: ConnectionId::new(),
            status: AtomicU8::new(ConnectionStatus::Open as u8),
            outbound: Mutex::new(Some(tx)),
            cancel: CancellationToken::new(),
        };
        (connection, rx)
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.status() == ConnectionStatus::Open
    }

    /// Token cancelled once the transport is gone.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn send(&self, event: &StreamEvent) -> Result<(), SendError> {
        let frame = event.to_frame()?;
        self.send_frame(frame)
    }

    /// Queues an already serialized frame.
    pub fn send_frame(&self, frame: String) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed(self.id.to_string()));
        }
        let outbound = self.outbound.lock().unwrap_or_else(PoisonError::into_inner);
        match outbound.as_ref() {
            Some(tx) => tx
                .send(frame)
                .map_err(|_| SendError::QueueDropped(self.id.to_string())),
            None => Err(SendError::Closed(self.id.to_string())),
        }
    }

    /// Stops accepting writes. The stream ends after draining what is queued.
    /// Returns false if the connection was not open.
    pub fn mark_closing(&self) -> bool {
        let changed = self
            .status
            .compare_exchange(
                ConnectionStatus::Open as u8,
                ConnectionStatus::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if changed {
            self.drop_sender();
        }
        changed
    }

    /// Records that the transport is gone and cancels everything tied to it.
    /// Returns false if it was already closed.
    pub fn mark_closed(&self) -> bool {
        let previous = self
            .status
            .swap(ConnectionStatus::Closed as u8, Ordering::AcqRel);
        self.drop_sender();
        self.cancel.cancel();
        ConnectionStatus::from_u8(previous) != ConnectionStatus::Closed
    }

    fn drop_sender(&self) {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_connection_queues_frames_in_order() {
        let (conn, mut rx) = Connection::open();
        conn.send_frame("one".into()).unwrap();
        conn.send(&StreamEvent::connected()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "one");
        assert!(rx.try_recv().unwrap().contains("\"type\":\"connection\""));
    }

    #[test]
    fn closing_rejects_writes_but_drains_queue() {
        let (conn, mut rx) = Connection::open();
        conn.send_frame("queued".into()).unwrap();
        assert!(conn.mark_closing());
        assert_eq!(conn.status(), ConnectionStatus::Closing);
        assert!(matches!(conn.send_frame("late".into()), Err(SendError::Closed(_))));
        assert_eq!(rx.try_recv().unwrap(), "queued");
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert!(!conn.cancel_token().is_cancelled());
    }

    #[test]
    fn mark_closed_cancels_once() {
        let (conn, _rx) = Connection::open();
        assert!(conn.mark_closed());
        assert!(conn.cancel_token().is_cancelled());
        assert!(!conn.mark_closed());
        assert!(!conn.mark_closing());
        assert_eq!(conn.status(), ConnectionStatus::Closed);
    }

    #[test]
    fn dropped_receiver_is_a_send_error() {
        let (conn, rx) = Connection::open();
        drop(rx);
        assert!(matches!(
            conn.send(&StreamEvent::tick()),
            Err(SendError::QueueDropped(_))
        ));
    }

    #[test]
    fn ids_are_unique() {
        let (a, _) = Connection::open();
        let (b, _) = Connection::open();
        assert_ne!(a.id(), b.id());
    }
}
