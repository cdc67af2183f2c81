//! Results Relay
//!
//! Watches the vote store for new votes and tells every open results page
//! to reload, over a WebSocket push channel.
//!
//! # Features
//!
//! - **Snapshot poller**: samples the vote-count endpoint on a fixed interval
//!   and compares whole responses by value
//! - **Change notifier**: registry of open connections with per-connection
//!   failure isolation on broadcast
//! - **Relay**: JSON frames sent by one client are forwarded to the others
//! - **Upstream mode**: publish to another relay instead of in-process
//! - **Listener**: a Rust client that re-fetches results on every reload
//!
//! # Modules
//!
//! - `types`: Notification messages and the cached poll snapshot
//! - `api`: Axum router, `/ws` handler, connection registry and notifier
//! - `poller`: Poll sources, the poll loop and its publishers
//! - `client`: Results listener
//! - `config`: Environment configuration
//! - `error`: Error type
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use results_relay::{create_router, AppState, ChangeNotifier, HttpJsonSource, SnapshotPoller};
//!
//! # async fn run() -> results_relay::RelayResult<()> {
//! let notifier = Arc::new(ChangeNotifier::new());
//! let source = HttpJsonSource::new("http://localhost:3000/api/newvotes", Duration::from_secs(5))?;
//! let poller = SnapshotPoller::new(source);
//! let state = Arc::new(AppState::new(Arc::clone(&notifier), poller.stats()));
//! let handle = poller.start(notifier, Duration::from_secs(8));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, create_router(state)).await?;
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod types;

// Re-export commonly used items at crate root
pub use api::http::create_router;
pub use api::websocket::{AppState, BroadcastReport, ChangeNotifier, Connection, ConnectionId};
pub use client::{ListenerState, ResultsListener};
pub use config::{RelayConfig, WatchConfig};
pub use error::{RelayError, RelayResult};
pub use poller::{
    HttpJsonSource, PollOutcome, PollerHandle, ReloadPublisher, SnapshotPoller, SnapshotSource,
    UpstreamRelay,
};
pub use types::{InboundMessage, NotificationMessage, VoteCountSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
