//! Results listener: the browser side of the push channel, in Rust
//!
//! Holds one connection to the relay. On every `data_reload` notification
//! it re-fetches the full results payload and hands it to the caller. Any
//! other frame is ignored. When the connection drops, the listener either
//! reconnects after a fixed delay or stops, depending on configuration.

use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::RelayResult;
use crate::poller::SnapshotSource;
use crate::types::NotificationMessage;

/// Connection lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Open,
    /// Terminal; the listener will not reconnect
    Closed,
}

pub struct ResultsListener<R> {
    ws_url: String,
    results: R,
    reconnect_delay: Option<Duration>,
    state: watch::Sender<ListenerState>,
}

impl<R: SnapshotSource> ResultsListener<R> {
    pub fn new(ws_url: impl Into<String>, results: R) -> Self {
        let (state, _) = watch::channel(ListenerState::Disconnected);
        Self {
            ws_url: ws_url.into(),
            results,
            reconnect_delay: None,
            state,
        }
    }

    /// Reconnect after `delay` whenever the connection is lost
    pub fn with_reconnect_delay(mut self, delay: Option<Duration>) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Listen until the connection closes for good
    ///
    /// Without a reconnect delay, a failed first connection is returned as
    /// an error and a dropped connection ends the run.
    pub async fn run<H>(&self, mut on_results: H) -> RelayResult<()>
    where
        H: FnMut(Value) + Send,
    {
        loop {
            self.state.send_replace(ListenerState::Connecting);

            match connect_async(self.ws_url.as_str()).await {
                Ok((mut stream, _)) => {
                    self.state.send_replace(ListenerState::Open);
                    info!("Connected to {}", self.ws_url);

                    while let Some(frame) = stream.next().await {
                        match frame {
                            Ok(Message::Text(text)) => {
                                self.handle_frame(&text, &mut on_results).await;
                            }
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Connection error: {}", e);
                                break;
                            }
                        }
                    }
                    info!("Disconnected from {}", self.ws_url);
                }
                Err(e) => {
                    warn!("Could not connect to {}: {}", self.ws_url, e);
                    if self.reconnect_delay.is_none() {
                        self.state.send_replace(ListenerState::Closed);
                        return Err(e.into());
                    }
                }
            }

            match self.reconnect_delay {
                Some(delay) => {
                    self.state.send_replace(ListenerState::Disconnected);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    self.state.send_replace(ListenerState::Closed);
                    return Ok(());
                }
            }
        }
    }

    /// Process one text frame; returns whether results were reloaded
    pub async fn handle_frame<H>(&self, text: &str, on_results: &mut H) -> bool
    where
        H: FnMut(Value) + Send,
    {
        let notification: NotificationMessage = match serde_json::from_str(text) {
            Ok(notification) => notification,
            Err(_) => {
                debug!("Ignoring non-notification frame");
                return false;
            }
        };
        if !notification.is_reload() {
            debug!("Ignoring command {:?}", notification.command);
            return false;
        }

        match self.results.fetch().await {
            Ok(results) => {
                on_results(results);
                true
            }
            Err(e) => {
                warn!("Failed to reload results: {}", e);
                false
            }
        }
    }
}
