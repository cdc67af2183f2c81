//! WebSocket push channel
//!
//! Provides the `/ws` endpoint. Every connected client receives every
//! reload notification broadcast while it is connected; JSON frames sent
//! by a client are relayed to all the others.

pub mod handler;
pub mod notifier;
pub mod registry;
pub mod state;

pub use notifier::{BroadcastReport, ChangeNotifier};
pub use registry::{ChannelConnection, Connection, ConnectionId, ConnectionRegistry};
pub use state::AppState;
