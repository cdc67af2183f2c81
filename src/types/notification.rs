//! Messages pushed to, and received from, WebSocket clients

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Topic carried in the `message` field of reload notifications
pub const RESULTS_TOPIC: &str = "results";

/// Command telling clients to re-fetch the results view
pub const DATA_RELOAD: &str = "data_reload";

/// Notification broadcast to every connected client
///
/// Serialized as `{ "message": "results", "command": "data_reload" }`.
/// Unknown fields are ignored on the way in so older clients and newer
/// servers can talk to each other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Free-text topic
    #[serde(default)]
    pub message: String,

    pub command: String,
}

impl NotificationMessage {
    /// The canonical reload notification
    pub fn data_reload() -> Self {
        Self {
            message: RESULTS_TOPIC.to_string(),
            command: DATA_RELOAD.to_string(),
        }
    }

    pub fn is_reload(&self) -> bool {
        self.command == DATA_RELOAD
    }
}

/// A frame received from a client, sorted by what it parses as
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// Parsed as a notification (has a string `command`)
    Notification(NotificationMessage),

    /// Some other well-formed JSON value
    Json(Value),

    /// Not JSON at all
    Unrecognized { reason: String },
}

impl InboundMessage {
    pub fn parse(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                return InboundMessage::Unrecognized {
                    reason: e.to_string(),
                }
            }
        };

        match serde_json::from_value::<NotificationMessage>(value.clone()) {
            Ok(notification) => InboundMessage::Notification(notification),
            Err(_) => InboundMessage::Json(value),
        }
    }

    /// Structured payloads are relayed to the other clients, the rest is dropped
    pub fn is_relayable(&self) -> bool {
        !matches!(self, InboundMessage::Unrecognized { .. })
    }
}
