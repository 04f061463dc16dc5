use crate::connection::{Connection, ConnectionId};
use crate::error::SendError;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of one pass over the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    pub targeted: usize,
    pub failed: usize,
}

/// Process-local set of open stream connections.
///
/// Membership here decides who receives broadcasts and who counts as an
/// active connection. Only a session adds or removes its own connection.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<Connection>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false if the connection was already registered.
    pub fn add(&self, connection: Arc<Connection>) -> bool {
        let mut connections = self.lock();
        if connections.contains_key(connection.id()) {
            return false;
        }
        connections.insert(connection.id().clone(), connection);
        true
    }

    /// Returns false if the connection was not registered.
    pub fn remove(&self, connection: &Connection) -> bool {
        self.lock().remove(connection.id()).is_some()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, connection: &Connection) -> bool {
        self.lock().contains_key(connection.id())
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Visits a snapshot of the current members with the lock released.
    /// A failing visitor is counted and iteration carries on.
    pub fn for_each<F>(&self, mut visitor: F) -> FanOut
    where
        F: FnMut(&Connection) -> Result<(), SendError>,
    {
        let snapshot: Vec<Arc<Connection>> = self.lock().values().cloned().collect();
        let mut fan_out = FanOut {
            targeted: snapshot.len(),
            failed: 0,
        };
        for connection in &snapshot {
            if let Err(e) = visitor(connection) {
                debug!("Skipping connection {}: {e}", connection.id());
                fan_out.failed += 1;
            }
        }
        fan_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Arc<Connection> {
        Arc::new(Connection::open().0)
    }

    #[test]
    fn add_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let conn = connection();
        assert!(registry.add(conn.clone()));
        assert!(!registry.add(conn.clone()));
        assert_eq!(registry.size(), 1);
        assert!(registry.contains(&conn));
    }

    #[test]
    fn remove_twice_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let a = connection();
        let b = connection();
        registry.add(a.clone());
        registry.add(b.clone());
        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert_eq!(registry.size(), 1);
        assert!(registry.contains(&b));
    }

    #[test]
    fn size_tracks_n_registrations() {
        let registry = ConnectionRegistry::new();
        for n in 1..=5 {
            registry.add(connection());
            assert_eq!(registry.size(), n);
        }
    }

    #[test]
    fn for_each_survives_failing_members() {
        let registry = ConnectionRegistry::new();
        let (conns, _queues): (Vec<_>, Vec<_>) = (0..4)
            .map(|_| {
                let (c, rx) = Connection::open();
                (Arc::new(c), rx)
            })
            .unzip();
        for c in &conns {
            registry.add(c.clone());
        }
        conns[1].mark_closed();
        conns[3].mark_closed();

        let mut visited = 0;
        let fan_out = registry.for_each(|c| {
            visited += 1;
            c.send_frame("x".into())
        });
        assert_eq!(visited, 4);
        assert_eq!(fan_out, FanOut { targeted: 4, failed: 2 });
        // Failures never evict members.
        assert_eq!(registry.size(), 4);
    }

    #[test]
    fn visitor_may_mutate_registry() {
        let registry = ConnectionRegistry::new();
        let a = connection();
        let b = connection();
        registry.add(a.clone());
        registry.add(b.clone());

        let fan_out = registry.for_each(|c| {
            registry.remove(c);
            Ok(())
        });
        assert_eq!(fan_out.targeted, 2);
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn concurrent_add_remove_keeps_count_consistent() {
        let registry = Arc::new(ConnectionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let c = connection();
                        registry.add(c.clone());
                        registry.for_each(|_| Ok(()));
                        registry.remove(&c);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.size(), 0);
    }
}
