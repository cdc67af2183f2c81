//! Publishing to a relay over a WebSocket client connection
//!
//! Instead of fanning out in-process, the poller can hand the reload frame
//! to another relay (local or remote) which then broadcasts it to its own
//! clients. The connection is opened lazily. Connects and sends are bounded
//! by a timeout, and a link the relay has closed is replaced on the next
//! publish.

use std::future::Future;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::publisher::ReloadPublisher;
use crate::error::{RelayError, RelayResult};
use crate::types::NotificationMessage;

type UpstreamSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Default bound on connecting to, or sending to, the upstream relay
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

pub struct UpstreamRelay {
    url: String,
    timeout: Duration,
    sink: Mutex<Option<UpstreamSink>>,
}

impl UpstreamRelay {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
            sink: Mutex::new(None),
        }
    }

    /// Bound each connect and each send; keep it below the poll interval
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn is_connected(&self) -> bool {
        self.sink.lock().await.is_some()
    }

    async fn connect(&self) -> RelayResult<UpstreamSink> {
        let connected = match timeout(self.timeout, connect_async(self.url.as_str())).await {
            Ok(result) => result.map_err(RelayError::from),
            Err(_) => Err(RelayError::Timeout),
        };
        let (stream, _) = connected.map_err(|e| {
            warn!("Could not connect to upstream relay {}: {}", self.url, e);
            e
        })?;
        info!("Connected to upstream relay {}", self.url);

        let (sink, mut incoming) = stream.split();

        // Whatever the relay echoes back is read and discarded
        let url = self.url.clone();
        tokio::spawn(async move {
            while let Some(frame) = incoming.next().await {
                if let Err(e) = frame {
                    debug!("Upstream relay {} read error: {}", url, e);
                    break;
                }
            }
            debug!("Upstream relay {} stream ended", url);
        });

        Ok(sink)
    }

    async fn send_on(&self, sink: &mut UpstreamSink, text: &str) -> RelayResult<()> {
        match timeout(self.timeout, sink.send(Message::Text(text.to_string()))).await {
            Ok(result) => result.map_err(RelayError::from),
            Err(_) => Err(RelayError::Timeout),
        }
    }

    async fn send(&self, message: &NotificationMessage) -> RelayResult<usize> {
        let text = serde_json::to_string(message)?;
        let mut guard = self.sink.lock().await;

        // A cached link may have been closed by the relay since the last
        // publish; retry once on a fresh connection so the change is not lost
        if let Some(mut sink) = guard.take() {
            match self.send_on(&mut sink, &text).await {
                Ok(()) => {
                    *guard = Some(sink);
                    return Ok(1);
                }
                Err(e) => debug!("Cached upstream link to {} failed ({}), reconnecting", self.url, e),
            }
        }

        let mut sink = self.connect().await?;
        match self.send_on(&mut sink, &text).await {
            Ok(()) => {
                *guard = Some(sink);
                Ok(1)
            }
            Err(e) => {
                warn!("Send to upstream relay {} failed: {}", self.url, e);
                Err(e)
            }
        }
    }
}

impl ReloadPublisher for UpstreamRelay {
    fn publish(&self, message: &NotificationMessage)
        -> impl Future<Output = RelayResult<usize>> + Send {
        self.send(message)
    }
}
