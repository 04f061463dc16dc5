use crate::connection::Connection;
use crate::events::StreamEvent;
use crate::registry::ConnectionRegistry;
use log::{debug, info, warn};
use rocket::response::stream::{Event, EventStream};
use rocket::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// One client's event stream, from registration to teardown.
pub struct Session {
    outbound: mpsc::UnboundedReceiver<String>,
    ticker: JoinHandle<()>,
    guard: SessionGuard,
}

/// Close observer. Dropped exactly once, when the response stream goes away
/// (client disconnect, server shutdown, or the session is discarded).
struct SessionGuard {
    connection: Arc<Connection>,
    registry: Arc<ConnectionRegistry>,
    ticker: Option<JoinHandle<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.connection.mark_closed();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        if self.registry.remove(&self.connection) {
            info!(
                "Client {} disconnected, active connections: {}",
                self.connection.id(),
                self.registry.size()
            );
        }
    }
}

impl Session {
    /// Registers a new connection, queues the `connection` event and starts
    /// the per-connection ticker. Must be called inside a tokio runtime.
    pub fn start(registry: Arc<ConnectionRegistry>, tick_interval: Duration) -> Self {
        let (connection, outbound) = Connection::open();
        let connection = Arc::new(connection);

        registry.add(connection.clone());
        info!(
            "Client {} connected, active connections: {}",
            connection.id(),
            registry.size()
        );

        if let Err(e) = connection.send(&StreamEvent::connected()) {
            warn!("Failed to send connection event to {}: {e}", connection.id());
        }

        let ticker = tokio::spawn(run_ticker(connection.clone(), tick_interval));
        let guard = SessionGuard {
            connection,
            registry,
            ticker: None,
        };

        Session {
            outbound,
            ticker,
            guard,
        }
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Arc<Connection> {
        &self.guard.connection
    }

    #[cfg(test)]
    pub(crate) fn is_ticking(&self) -> bool {
        !self.ticker.is_finished()
    }

    /// Turns the session into the response body. The stream ends when the
    /// connection stops accepting writes or the server shuts down; dropping
    /// it (including on client disconnect) tears the session down.
    pub fn into_stream(self, mut shutdown: Shutdown) -> EventStream![] {
        let Session {
            mut outbound,
            ticker,
            mut guard,
        } = self;
        guard.ticker = Some(ticker);

        EventStream! {
            let _guard = guard;
            loop {
                let frame = tokio::select! {
                    frame = outbound.recv() => frame,
                    _ = &mut shutdown => None,
                };
                match frame {
                    // Leading space gives `data: {..}` on the wire.
                    Some(frame) => yield Event::data(format!(" {frame}")),
                    None => break,
                }
            }
        }
    }
}

/// Writes a `time` event every `period` until cancelled, until the
/// connection is no longer open, or until a write fails.
async fn run_ticker(connection: Arc<Connection>, period: Duration) {
    let cancel = connection.cancel_token().clone();
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        if !connection.is_open() {
            debug!("Connection {} no longer open, stopping ticker", connection.id());
            break;
        }

        if let Err(e) = connection.send(&StreamEvent::tick()) {
            warn!("Error sending tick to {}: {e}", connection.id());
            break;
        }
    }
}
