//! Registry of open push-channel connections

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::{RelayError, RelayResult};

/// Identifier handed out on registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One client connection as seen by the notifier
pub trait Connection: Send + Sync {
    /// Whether the transport can still accept frames
    fn is_open(&self) -> bool;

    /// Queue a text frame; must not block
    fn send_text(&self, text: &Arc<str>) -> RelayResult<()>;
}

/// Connection backed by the channel a socket writer task drains
pub struct ChannelConnection {
    tx: mpsc::UnboundedSender<Arc<str>>,
}

impl ChannelConnection {
    pub fn new(tx: mpsc::UnboundedSender<Arc<str>>) -> Self {
        Self { tx }
    }

    /// Create a connection together with the receiving end for its writer
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Connection for ChannelConnection {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send_text(&self, text: &Arc<str>) -> RelayResult<()> {
        self.tx
            .send(Arc::clone(text))
            .map_err(|_| RelayError::ConnectionClosed)
    }
}

/// Set of currently registered connections
///
/// Iteration always goes through [`ConnectionRegistry::snapshot`], so
/// callers never hold the lock while sending.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<BTreeMap<ConnectionId, Arc<dyn Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn register(&self, connection: Arc<dyn Connection>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.connections.write().insert(id, connection);
        id
    }

    /// Remove a connection; removing an unknown id is a no-op
    pub fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.write().remove(&id).is_some()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Registered connections in registration order
    pub fn snapshot(&self) -> Vec<(ConnectionId, Arc<dyn Connection>)> {
        self.connections
            .read()
            .iter()
            .map(|(id, conn)| (*id, Arc::clone(conn)))
            .collect()
    }

    /// Drop every connection, returning how many there were
    pub fn drain(&self) -> usize {
        let mut connections = self.connections.write();
        let count = connections.len();
        connections.clear();
        count
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_distinct_ids() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = ChannelConnection::pair();
        let (b, _rx_b) = ChannelConnection::pair();

        let id_a = registry.register(Arc::new(a));
        let id_b = registry.register(Arc::new(b));

        assert_ne!(id_a, id_b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = ChannelConnection::pair();
        let (b, _rx_b) = ChannelConnection::pair();
        let id_a = registry.register(Arc::new(a));
        let id_b = registry.register(Arc::new(b));

        assert!(registry.unregister(id_a));
        assert!(!registry.unregister(id_a));

        assert!(registry.contains(id_b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_in_registration_order() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let (conn, rx) = ChannelConnection::pair();
            receivers.push(rx);
            ids.push(registry.register(Arc::new(conn)));
        }

        let order: Vec<_> = registry.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, ids);
    }

    #[tokio::test]
    async fn test_channel_connection_closes_with_receiver() {
        let (conn, mut rx) = ChannelConnection::pair();
        let text: Arc<str> = Arc::from("hello");

        assert!(conn.is_open());
        conn.send_text(&text).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));

        drop(rx);
        assert!(!conn.is_open());
        assert!(matches!(conn.send_text(&text), Err(RelayError::ConnectionClosed)));
    }

    #[test]
    fn test_drain_empties_registry() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = ChannelConnection::pair();
        registry.register(Arc::new(a));

        assert_eq!(registry.drain(), 1);
        assert!(registry.is_empty());
    }
}
