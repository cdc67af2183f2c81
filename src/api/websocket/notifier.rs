//! Change notifier: fans reload notifications out to every open connection
//!
//! The notifier owns the [`ConnectionRegistry`]. Broadcasts serialize the
//! message once and push the same text to each connection. A connection
//! that is no longer open is skipped but left registered; it is removed
//! when its own socket task sees the close.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::registry::{Connection, ConnectionId, ConnectionRegistry};
use crate::types::{InboundMessage, NotificationMessage};

/// Outcome of one broadcast
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Open connections a send was attempted on
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Registered connections that were no longer open
    pub skipped: usize,
}

pub struct ChangeNotifier {
    registry: ConnectionRegistry,
    broadcasts_sent: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            broadcasts_sent: AtomicU64::new(0),
        }
    }

    /// Add a connection once its handshake has completed
    pub fn register(&self, connection: Arc<dyn Connection>) -> ConnectionId {
        let id = self.registry.register(connection);
        info!(connection = %id, open = self.registry.len(), "Client connected");
        id
    }

    /// Remove a connection after close or transport error
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.registry.unregister(id);
        if removed {
            info!(connection = %id, open = self.registry.len(), "Client disconnected");
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    pub fn broadcasts_sent(&self) -> u64 {
        self.broadcasts_sent.load(Ordering::Relaxed)
    }

    /// Send a notification to every open connection
    pub fn broadcast(&self, message: &NotificationMessage) -> BroadcastReport {
        let text: Arc<str> = match serde_json::to_string(message) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!("Failed to serialize notification: {}", e);
                return BroadcastReport::default();
            }
        };

        let report = self.deliver(&text, None);
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
        debug!(?report, "Broadcast {}", message.command);
        report
    }

    /// Handle a text frame received from a client
    ///
    /// Structured payloads go verbatim to every other open connection;
    /// anything that is not JSON is logged and dropped. The sender stays
    /// connected either way. Returns `None` when the frame was dropped.
    pub fn relay_inbound(&self, from: ConnectionId, frame: &str) -> Option<BroadcastReport> {
        let inbound = InboundMessage::parse(frame);
        if !inbound.is_relayable() {
            if let InboundMessage::Unrecognized { reason } = &inbound {
                warn!(connection = %from, "Dropping malformed client message: {}", reason);
            }
            return None;
        }

        let text: Arc<str> = Arc::from(frame);
        let report = self.deliver(&text, Some(from));
        debug!(connection = %from, ?report, "Relayed client message");
        Some(report)
    }

    /// Drop every registered connection, closing their writers
    pub fn close_all(&self) -> usize {
        let closed = self.registry.drain();
        if closed > 0 {
            info!("Closed {} client connection(s)", closed);
        }
        closed
    }

    fn deliver(&self, text: &Arc<str>, except: Option<ConnectionId>) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (id, connection) in self.registry.snapshot() {
            if Some(id) == except {
                continue;
            }
            if !connection.is_open() {
                report.skipped += 1;
                continue;
            }

            report.attempted += 1;
            match connection.send_text(text) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(connection = %id, "Send failed: {}", e);
                }
            }
        }

        report
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
